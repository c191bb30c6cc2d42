use std::fmt;

use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// One OHLC bar. Open/high/low/volume are optional: the indicators only use
/// `close`, but optional fields round-trip through serialization when present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Ordered bar history, strictly ascending by timestamp.
///
/// Ingestion sorts the input and deduplicates by timestamp keeping the last
/// record, so a re-sent forming bar replaces the earlier copy (upsert
/// semantics). Once constructed the series is never mutated.
#[derive(Debug, Clone)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series from raw bars: validate, sort ascending, dedupe.
    pub fn ingest(mut bars: Vec<Bar>) -> Result<Self, Report<IngestError>> {
        if bars.is_empty() {
            bail!(IngestError::Empty);
        }

        for bar in &bars {
            if !bar.close.is_finite() {
                bail!(IngestError::InvalidClose {
                    value: bar.close.to_string(),
                });
            }
            if bar.timestamp_ms < 0 {
                bail!(IngestError::InvalidTimestamp {
                    value: bar.timestamp_ms,
                });
            }
        }

        // Stable sort, then keep the last record for each timestamp.
        bars.sort_by_key(|b| b.timestamp_ms);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            let replaces_last =
                matches!(deduped.last(), Some(last) if last.timestamp_ms == bar.timestamp_ms);
            if replaces_last {
                let last = deduped.len() - 1;
                deduped[last] = bar;
            } else {
                deduped.push(bar);
            }
        }

        Ok(Self { bars: deduped })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Latest bar. Safe because `ingest` rejects empty input.
    pub fn latest(&self) -> &Bar {
        self.bars.last().expect("BarSeries is never empty")
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Trailing window of at most `n` bars.
    pub fn tail(&self, n: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }
}

/// Predicted price change over the next bar interval, relative to the
/// latest observed close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    pub predicted_delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}
