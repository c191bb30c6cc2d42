pub mod naive;
pub mod trend;

use std::sync::Arc;
use std::time::Duration;

use error_stack::{Report, bail};

use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::model::{BarSeries, Forecast};

/// Capability for producing a price forecast from a bar series.
///
/// Model fitting may be slow, so `predict` is free to block; the engine
/// always invokes implementations through [`predict_with_timeout`], which
/// isolates the call on a blocking thread with a bounded timeout.
pub trait Forecaster: Send + Sync {
    fn name(&self) -> &'static str;

    /// Predict the price change over the next bar interval, relative to the
    /// latest observed close.
    fn predict(&self, series: &BarSeries) -> Result<Forecast, Report<ForecastError>>;
}

/// Minimum observations any strategy needs before producing a forecast.
pub const MIN_POINTS: usize = 2;

pub(crate) fn check_min_points(series: &BarSeries) -> Result<(), Report<ForecastError>> {
    if series.len() < MIN_POINTS {
        bail!(ForecastError::NotEnoughHistory {
            required: MIN_POINTS,
            available: series.len(),
        });
    }
    Ok(())
}

/// Build the configured forecasting strategy.
pub fn build_forecaster(config: &ForecastConfig) -> Arc<dyn Forecaster> {
    match config.strategy.as_str() {
        "naive" => Arc::new(naive::NaiveForecaster::new(config.window)),
        "trend" => Arc::new(trend::TrendForecaster::new(config.window)),
        other => {
            tracing::warn!(strategy = other, "unknown forecast strategy, using trend");
            Arc::new(trend::TrendForecaster::new(config.window))
        }
    }
}

/// Run the forecaster on a blocking thread with a bounded timeout.
pub async fn predict_with_timeout(
    forecaster: Arc<dyn Forecaster>,
    series: &BarSeries,
    timeout_ms: u64,
) -> Result<Forecast, Report<ForecastError>> {
    let series = series.clone();
    let task = tokio::task::spawn_blocking(move || forecaster.predict(&series));

    match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            Err(Report::new(ForecastError::Task).attach_printable(join_error.to_string()))
        }
        Err(_) => Err(Report::new(ForecastError::Timeout { ms: timeout_ms })),
    }
}
