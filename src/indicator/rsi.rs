use error_stack::{Report, bail};

use crate::error::IndicatorError;

/// RSI (Relative Strength Index) using Wilder's smoothing method.
///
/// Output is aligned with the input: one value per close. Indices below
/// `period` carry the neutral placeholder 50.0 (an approximation, not a
/// computed value); callers should only trust indices `>= period`.
pub struct Rsi {
    period: usize,
}

const NEUTRAL_RSI: f64 = 50.0;

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Minimum number of closes for at least one computed (non-placeholder)
    /// value.
    pub fn required_closes(&self) -> usize {
        self.period + 1
    }

    pub fn compute(&self, closes: &[f64]) -> Result<Vec<f64>, Report<IndicatorError>> {
        if closes.len() < self.required_closes() {
            bail!(IndicatorError::InsufficientData {
                indicator: "rsi",
                required: self.required_closes(),
                available: closes.len(),
            });
        }

        let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

        // Seed with simple averages over the first `period` deltas,
        // losses expressed as positive magnitudes.
        let mut avg_gain: f64 = deltas[..self.period]
            .iter()
            .map(|&d| d.max(0.0))
            .sum::<f64>()
            / self.period as f64;
        let mut avg_loss: f64 = deltas[..self.period]
            .iter()
            .map(|&d| (-d).max(0.0))
            .sum::<f64>()
            / self.period as f64;

        let mut out = vec![NEUTRAL_RSI; closes.len()];

        // Wilder smoothing from index `period` onward. delta at index i-1
        // is the move into close i.
        for i in self.period..closes.len() {
            let delta = deltas[i - 1];
            let gain = delta.max(0.0);
            let loss = (-delta).max(0.0);
            avg_gain = (avg_gain * (self.period - 1) as f64 + gain) / self.period as f64;
            avg_loss = (avg_loss * (self.period - 1) as f64 + loss) / self.period as f64;
            out[i] = rsi_value(avg_gain, avg_loss);
        }

        Ok(out)
    }
}

/// Zero average loss is RSI 100 by convention, not a divide-by-zero fault.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_zero_invalid() {
        assert!(Rsi::new(0).is_err());
    }

    #[test]
    fn insufficient_data_names_indicator() {
        let rsi = Rsi::new(14).unwrap();
        let err = rsi.compute(&[1.0; 14]).unwrap_err();
        let ctx = err.current_context();
        match ctx {
            IndicatorError::InsufficientData {
                indicator,
                required,
                available,
            } => {
                assert_eq!(*indicator, "rsi");
                assert_eq!(*required, 15);
                assert_eq!(*available, 14);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn output_length_matches_input() {
        let rsi = Rsi::new(14).unwrap();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi.compute(&closes).unwrap().len(), 30);
    }

    #[test]
    fn warm_up_indices_are_neutral_50() {
        let rsi = Rsi::new(14).unwrap();
        let closes = [100.0; 20];
        let values = rsi.compute(&closes).unwrap();
        for &v in &values[..14] {
            assert_eq!(v, 50.0);
        }
    }

    #[test]
    fn constant_series_is_100_after_warm_up() {
        // avg_loss stays 0, which is defined as RSI 100 by convention
        let rsi = Rsi::new(14).unwrap();
        let values = rsi.compute(&[100.0; 20]).unwrap();
        for &v in &values[14..] {
            assert_eq!(v, 100.0);
        }
    }

    #[test]
    fn monotone_rise_is_100_after_warm_up() {
        let rsi = Rsi::new(14).unwrap();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let values = rsi.compute(&closes).unwrap();
        for &v in &values[14..] {
            assert_eq!(v, 100.0);
        }
    }

    #[test]
    fn monotone_fall_approaches_zero() {
        let rsi = Rsi::new(14).unwrap();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let values = rsi.compute(&closes).unwrap();
        let last = *values.last().unwrap();
        assert!(last < 1.0, "expected RSI near 0, got {last}");
    }

    #[test]
    fn values_bounded_zero_to_hundred() {
        let rsi = Rsi::new(5).unwrap();
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        for v in rsi.compute(&closes).unwrap() {
            assert!((0.0..=100.0).contains(&v), "RSI out of bounds: {v}");
        }
    }

    #[test]
    fn single_drop_after_flat_seed_is_zero() {
        // 19 flat closes then a drop: latest avg_gain is 0, so RSI is 0
        let rsi = Rsi::new(14).unwrap();
        let mut closes = vec![100.0; 19];
        closes.push(90.0);
        let values = rsi.compute(&closes).unwrap();
        assert_eq!(*values.last().unwrap(), 0.0);
    }
}
