use error_stack::{Report, bail};

use crate::error::IndicatorError;

use super::ma::Ema;

/// MACD (Moving Average Convergence Divergence).
///
/// Both EMAs are seeded by the first close, so every output series is the
/// same length as the input and defined from index 0. Unlike RSI and
/// Bollinger there is no warm-up window; early values are simply dominated
/// by the seed.
pub struct Macd {
    short_span: usize,
    long_span: usize,
    signal_span: usize,
}

#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Macd {
    pub fn new(
        short_span: usize,
        long_span: usize,
        signal_span: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        if short_span == 0 || long_span == 0 || signal_span == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "all spans must be > 0".into(),
            });
        }
        if short_span >= long_span {
            bail!(IndicatorError::InvalidParameter {
                name: "short span must be < long span".into(),
            });
        }
        Ok(Self {
            short_span,
            long_span,
            signal_span,
        })
    }

    pub fn compute(&self, closes: &[f64]) -> Result<MacdSeries, Report<IndicatorError>> {
        if closes.is_empty() {
            bail!(IndicatorError::InsufficientData {
                indicator: "macd",
                required: 1,
                available: 0,
            });
        }

        let ema_short = Ema::new(self.short_span)?.compute(closes);
        let ema_long = Ema::new(self.long_span)?.compute(closes);

        let macd: Vec<f64> = ema_short
            .iter()
            .zip(&ema_long)
            .map(|(s, l)| s - l)
            .collect();
        let signal = Ema::new(self.signal_span)?.compute(&macd);
        let histogram: Vec<f64> = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

        Ok(MacdSeries {
            macd,
            signal,
            histogram,
        })
    }
}
