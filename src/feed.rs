use error_stack::{Report, ResultExt, bail};
use serde::Deserialize;

use crate::error::IngestError;
use crate::model::Bar;

/// A close (or OHLC) value as delivered by upstream feeds: either a JSON
/// number or a numeric-looking string. Normalized during conversion;
/// unparseable strings are rejected, never silently zeroed.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FlexNumber {
    Num(f64),
    Str(String),
}

impl FlexNumber {
    fn to_f64(&self) -> Result<f64, Report<IngestError>> {
        let value = match self {
            Self::Num(n) => *n,
            Self::Str(s) => s.trim().parse::<f64>().map_err(|_| {
                Report::new(IngestError::InvalidClose { value: s.clone() })
            })?,
        };
        if !value.is_finite() {
            bail!(IngestError::InvalidClose {
                value: value.to_string(),
            });
        }
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(alias = "timestamp")]
    timestamp_ms: i64,
    #[serde(default)]
    open: Option<FlexNumber>,
    #[serde(default)]
    high: Option<FlexNumber>,
    #[serde(default)]
    low: Option<FlexNumber>,
    close: FlexNumber,
    #[serde(default)]
    volume: Option<FlexNumber>,
}

/// Upstream history responses arrive either as a bare array of records or
/// wrapped in a `{"data": [...]}` envelope. Accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    Bare(Vec<RawBar>),
    Wrapped { data: Vec<RawBar> },
}

/// Parse a JSON document of bar records into validated `Bar`s.
pub fn parse_bars(input: &str) -> Result<Vec<Bar>, Report<IngestError>> {
    let envelope: Envelope = serde_json::from_str(input).change_context(IngestError::Parse)?;
    let raw = match envelope {
        Envelope::Bare(raw) => raw,
        Envelope::Wrapped { data } => data,
    };

    raw.into_iter().map(to_bar).collect()
}

fn to_bar(raw: RawBar) -> Result<Bar, Report<IngestError>> {
    let optional = |field: &Option<FlexNumber>| -> Result<Option<f64>, Report<IngestError>> {
        field.as_ref().map(FlexNumber::to_f64).transpose()
    };

    Ok(Bar {
        timestamp_ms: raw.timestamp_ms,
        open: optional(&raw.open)?,
        high: optional(&raw.high)?,
        low: optional(&raw.low)?,
        close: raw.close.to_f64()?,
        volume: optional(&raw.volume)?,
    })
}
