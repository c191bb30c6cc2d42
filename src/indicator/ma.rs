use error_stack::{Report, bail};

use crate::error::IndicatorError;

/// Rolling simple moving average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Rolling mean aligned with the input: indices with fewer than `period`
    /// trailing values are `None`.
    pub fn rolling(&self, prices: &[f64]) -> Vec<Option<f64>> {
        let mut out = vec![None; prices.len()];
        if prices.len() < self.period {
            return out;
        }
        for (i, window) in prices.windows(self.period).enumerate() {
            out[i + self.period - 1] = Some(window.iter().sum::<f64>() / self.period as f64);
        }
        out
    }
}

/// Mean of the trailing `window` prices, falling back to the mean of the
/// whole slice when it is shorter. Used for the headline SMA in the report,
/// a documented reduced-window approximation.
pub fn trailing_mean(prices: &[f64], window: usize) -> f64 {
    let start = prices.len().saturating_sub(window.max(1));
    let tail = &prices[start..];
    if tail.is_empty() {
        return f64::NAN;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Exponential moving average over a span, smoothing factor
/// `alpha = 2 / (span + 1)`.
///
/// Seeded by the first value (`ema[0] = prices[0]`), so the output is the
/// same length as the input and defined from index 0 with no warm-up.
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self, Report<IndicatorError>> {
        if span == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "span must be > 0".into(),
            });
        }
        Ok(Self { span })
    }

    pub fn compute(&self, prices: &[f64]) -> Vec<f64> {
        let Some(&first) = prices.first() else {
            return Vec::new();
        };

        let alpha = 2.0 / (self.span as f64 + 1.0);
        let mut ema = first;
        let mut out = Vec::with_capacity(prices.len());
        out.push(ema);
        for &price in &prices[1..] {
            ema = price * alpha + ema * (1.0 - alpha);
            out.push(ema);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_period_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_rolling_warm_up_is_none() {
        let sma = Sma::new(3).unwrap();
        let out = sma.rolling(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn sma_rolling_shorter_than_period_all_none() {
        let sma = Sma::new(5).unwrap();
        assert_eq!(sma.rolling(&[1.0, 2.0]), vec![None, None]);
    }

    #[test]
    fn trailing_mean_full_window() {
        let prices = [1.0, 2.0, 3.0, 4.0];
        assert!((trailing_mean(&prices, 2) - 3.5).abs() < 1e-12);
    }

    #[test]
    fn trailing_mean_short_series_uses_all() {
        let prices = [2.0, 4.0];
        assert!((trailing_mean(&prices, 20) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn ema_span_zero_invalid() {
        assert!(Ema::new(0).is_err());
    }

    #[test]
    fn ema_defined_from_index_zero() {
        let ema = Ema::new(5).unwrap();
        let out = ema.compute(&[10.0, 11.0, 12.0]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], 10.0);
    }

    #[test]
    fn ema_flat_prices_stay_flat() {
        let ema = Ema::new(4).unwrap();
        for v in ema.compute(&[7.0; 10]) {
            assert!((v - 7.0).abs() < 1e-12);
        }
    }

    #[test]
    fn ema_recurrence_matches_hand_calc() {
        // span 3 -> alpha 0.5
        let ema = Ema::new(3).unwrap();
        let out = ema.compute(&[2.0, 4.0, 4.0]);
        assert!((out[1] - 3.0).abs() < 1e-12);
        assert!((out[2] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn ema_empty_input_empty_output() {
        let ema = Ema::new(3).unwrap();
        assert!(ema.compute(&[]).is_empty());
    }
}
