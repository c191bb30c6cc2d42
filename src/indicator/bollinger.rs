use error_stack::{Report, bail};

use crate::error::IndicatorError;

use super::ma::Sma;

/// Bollinger bands: rolling mean plus/minus `num_std` sample standard
/// deviations over a trailing window.
pub struct BollingerBands {
    period: usize,
    num_std: f64,
}

/// Band series aligned with the input closes. Indices with fewer than
/// `period` trailing closes are `None` — never a number fabricated from a
/// short window.
#[derive(Debug, Clone)]
pub struct BandSeries {
    pub sma: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

impl BandSeries {
    /// Latest defined (sma, upper, lower) triple, if any.
    pub fn latest(&self) -> Option<(f64, f64, f64)> {
        let i = self.sma.iter().rposition(Option::is_some)?;
        Some((self.sma[i]?, self.upper[i]?, self.lower[i]?))
    }
}

impl BollingerBands {
    pub fn new(period: usize, num_std: f64) -> Result<Self, Report<IndicatorError>> {
        // Sample standard deviation needs at least two points per window.
        if period < 2 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be >= 2".into(),
            });
        }
        if !num_std.is_finite() || num_std < 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "num_std must be finite and >= 0".into(),
            });
        }
        Ok(Self { period, num_std })
    }

    pub fn required_closes(&self) -> usize {
        self.period
    }

    pub fn compute(&self, closes: &[f64]) -> Result<BandSeries, Report<IndicatorError>> {
        if closes.len() < self.period {
            bail!(IndicatorError::InsufficientData {
                indicator: "bollinger",
                required: self.period,
                available: closes.len(),
            });
        }

        let sma = Sma::new(self.period)?.rolling(closes);
        let mut upper = vec![None; closes.len()];
        let mut lower = vec![None; closes.len()];

        for (i, window) in closes.windows(self.period).enumerate() {
            let at = i + self.period - 1;
            let mean = sma[at].expect("rolling mean defined at end of window");
            // Sample (n-1) standard deviation, matching the reference.
            let variance = window.iter().map(|&p| (p - mean).powi(2)).sum::<f64>()
                / (self.period - 1) as f64;
            let std_dev = variance.sqrt();
            upper[at] = Some(mean + self.num_std * std_dev);
            lower[at] = Some(mean - self.num_std * std_dev);
        }

        Ok(BandSeries { sma, upper, lower })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_below_two_invalid() {
        assert!(BollingerBands::new(0, 2.0).is_err());
        assert!(BollingerBands::new(1, 2.0).is_err());
    }

    #[test]
    fn negative_num_std_invalid() {
        assert!(BollingerBands::new(20, -1.0).is_err());
    }

    #[test]
    fn insufficient_data_rejected() {
        let bb = BollingerBands::new(5, 2.0).unwrap();
        assert!(bb.compute(&[1.0; 4]).is_err());
    }

    #[test]
    fn warm_up_indices_undefined() {
        let bb = BollingerBands::new(3, 2.0).unwrap();
        let bands = bb.compute(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(bands.sma[0], None);
        assert_eq!(bands.sma[1], None);
        assert!(bands.sma[2].is_some());
        assert!(bands.upper[3].is_some());
    }

    #[test]
    fn series_length_exactly_period_defines_last_index_only() {
        let bb = BollingerBands::new(4, 2.0).unwrap();
        let bands = bb.compute(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(bands.sma[..3].iter().all(Option::is_none));
        assert!(bands.sma[3].is_some());
    }

    #[test]
    fn band_width_is_twice_num_std_times_std() {
        let num_std = 2.0;
        let bb = BollingerBands::new(3, num_std).unwrap();
        let closes = [1.0, 2.0, 3.0, 5.0, 8.0];
        let bands = bb.compute(&closes).unwrap();
        for (i, window) in closes.windows(3).enumerate() {
            let at = i + 2;
            let mean = window.iter().sum::<f64>() / 3.0;
            let std =
                (window.iter().map(|&p| (p - mean).powi(2)).sum::<f64>() / 2.0).sqrt();
            let width = bands.upper[at].unwrap() - bands.lower[at].unwrap();
            assert!((width - 2.0 * num_std * std).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_num_std_collapses_bands_onto_sma() {
        let bb = BollingerBands::new(3, 0.0).unwrap();
        let bands = bb.compute(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        for i in 2..5 {
            assert_eq!(bands.upper[i], bands.sma[i]);
            assert_eq!(bands.lower[i], bands.sma[i]);
        }
    }

    #[test]
    fn flat_prices_zero_width() {
        let bb = BollingerBands::new(3, 2.0).unwrap();
        let bands = bb.compute(&[10.0; 5]).unwrap();
        for i in 2..5 {
            assert!((bands.upper[i].unwrap() - 10.0).abs() < 1e-12);
            assert!((bands.lower[i].unwrap() - 10.0).abs() < 1e-12);
        }
    }

    #[test]
    fn reference_scenario_nineteen_flat_one_drop() {
        // closes = [100]*19 + [90]: sma 99.5, sample std sqrt(5)
        let bb = BollingerBands::new(20, 2.0).unwrap();
        let mut closes = vec![100.0; 19];
        closes.push(90.0);
        let bands = bb.compute(&closes).unwrap();
        let (sma, upper, lower) = bands.latest().unwrap();
        assert!((sma - 99.5).abs() < 1e-12);
        let std = 5.0_f64.sqrt();
        assert!((upper - (99.5 + 2.0 * std)).abs() < 1e-9);
        assert!((lower - (99.5 - 2.0 * std)).abs() < 1e-9);
        assert!(90.0 < lower);
    }
}
