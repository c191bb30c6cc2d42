use error_stack::{Report, bail};

use crate::error::ForecastError;
use crate::model::{BarSeries, Forecast};

use super::{Forecaster, check_min_points};

const DAY_MS: i64 = 86_400_000;

/// Reference strategy: ordinary least squares trend plus an optional daily
/// seasonality component, fitted on the trailing window and projected one
/// bar interval ahead.
///
/// Seasonality is a mean-residual-per-phase adjustment and is only enabled
/// when the window spans at least two full daily cycles; with less history
/// it is disabled rather than failing.
pub struct TrendForecaster {
    window: usize,
}

impl TrendForecaster {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Forecaster for TrendForecaster {
    fn name(&self) -> &'static str {
        "trend"
    }

    fn predict(&self, series: &BarSeries) -> Result<Forecast, Report<ForecastError>> {
        check_min_points(series)?;

        let bars = series.tail(self.window);
        let first_ts = bars[0].timestamp_ms;

        // Regress on actual timestamps so non-uniform gaps are handled.
        let xs: Vec<f64> = bars
            .iter()
            .map(|b| (b.timestamp_ms - first_ts) as f64)
            .collect();
        let ys: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let (intercept, slope) = least_squares(&xs, &ys);

        let interval_ms = median_interval(bars);
        let next_ts = bars.last().expect("tail is non-empty").timestamp_ms + interval_ms;
        let next_x = (next_ts - first_ts) as f64;

        let mut forecast_price = intercept + slope * next_x;

        if let Some(seasonal) = seasonal_component(bars, interval_ms, intercept, slope, next_ts) {
            forecast_price += seasonal;
        }

        if !forecast_price.is_finite() {
            bail!(ForecastError::Degenerate);
        }

        let latest_close = series.latest().close;
        Ok(Forecast {
            predicted_delta: forecast_price - latest_close,
        })
    }
}

/// Ordinary least squares fit, returning (intercept, slope).
fn least_squares(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        covariance += (x - x_mean) * (y - y_mean);
        variance += (x - x_mean).powi(2);
    }

    // Timestamps are strictly ascending after ingestion, so variance is
    // only zero for a single-point fit.
    let slope = if variance == 0.0 {
        0.0
    } else {
        covariance / variance
    };
    (y_mean - slope * x_mean, slope)
}

/// Median gap between consecutive bars, in milliseconds.
fn median_interval(bars: &[crate::model::Bar]) -> i64 {
    let mut gaps: Vec<i64> = bars
        .windows(2)
        .map(|w| w[1].timestamp_ms - w[0].timestamp_ms)
        .collect();
    gaps.sort_unstable();
    gaps[gaps.len() / 2]
}

/// Mean detrended residual for the daily phase bucket of `next_ts`, or
/// `None` when the window is too short to support a seasonal fit.
fn seasonal_component(
    bars: &[crate::model::Bar],
    interval_ms: i64,
    intercept: f64,
    slope: f64,
    next_ts: i64,
) -> Option<f64> {
    if interval_ms <= 0 || interval_ms >= DAY_MS {
        return None;
    }
    let span = bars.last()?.timestamp_ms - bars.first()?.timestamp_ms;
    if span < 2 * DAY_MS {
        return None;
    }

    let buckets = (DAY_MS / interval_ms) as usize;
    if buckets < 2 {
        return None;
    }

    let bucket_of = |ts: i64| ((ts.rem_euclid(DAY_MS)) / interval_ms) as usize % buckets;

    let first_ts = bars.first()?.timestamp_ms;
    let mut sums = vec![0.0; buckets];
    let mut counts = vec![0usize; buckets];
    for bar in bars {
        let x = (bar.timestamp_ms - first_ts) as f64;
        let residual = bar.close - (intercept + slope * x);
        let b = bucket_of(bar.timestamp_ms);
        sums[b] += residual;
        counts[b] += 1;
    }

    let b = bucket_of(next_ts);
    if counts[b] == 0 {
        return None;
    }
    Some(sums[b] / counts[b] as f64)
}
