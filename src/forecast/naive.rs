use error_stack::{Report, bail};

use crate::error::ForecastError;
use crate::model::{BarSeries, Forecast};

use super::{Forecaster, check_min_points};

/// Drift strategy: the predicted change is the mean of the close-to-close
/// deltas over the trailing window. Cheap baseline for comparing against
/// the trend model.
pub struct NaiveForecaster {
    window: usize,
}

impl NaiveForecaster {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Forecaster for NaiveForecaster {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn predict(&self, series: &BarSeries) -> Result<Forecast, Report<ForecastError>> {
        check_min_points(series)?;

        let bars = series.tail(self.window.max(2));
        let deltas: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();
        let drift = deltas.iter().sum::<f64>() / deltas.len() as f64;

        if !drift.is_finite() {
            bail!(ForecastError::Degenerate);
        }

        Ok(Forecast {
            predicted_delta: drift,
        })
    }
}
