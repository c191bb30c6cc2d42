use std::sync::Arc;

use error_stack::Report;
use tracing::warn;

use crate::config::{AnalysisConfig, ForecastConfig};
use crate::error::IndicatorError;
use crate::forecast::{self, Forecaster};
use crate::indicator::bollinger::BollingerBands;
use crate::indicator::ma::trailing_mean;
use crate::indicator::macd::Macd;
use crate::indicator::rsi::Rsi;
use crate::model::{BarSeries, Signal};
use crate::report::AnalysisReport;

pub const OVERSOLD_RSI: f64 = 30.0;
pub const OVERBOUGHT_RSI: f64 = 70.0;

/// Latest value of every indicator, as recorded in the report and as fed to
/// the decision policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub sma: f64,
    pub rsi: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub macd: f64,
    pub macd_signal: f64,
}

/// Fuse indicator state and the forecast into one signal.
///
/// Rules are evaluated in strict precedence order, first match wins:
/// indicator-confirmed reversals (two corroborating conditions) outrank a
/// forecast-only move. MACD is part of the auditable snapshot but does not
/// enter the policy.
pub fn decide(
    latest_price: f64,
    snapshot: &IndicatorSnapshot,
    predicted_delta: f64,
    sensitivity: f64,
) -> Signal {
    if snapshot.rsi < OVERSOLD_RSI && latest_price < snapshot.lower_band {
        return Signal::Buy;
    }
    if snapshot.rsi > OVERBOUGHT_RSI && latest_price > snapshot.upper_band {
        return Signal::Sell;
    }
    if predicted_delta > sensitivity * latest_price {
        return Signal::Buy;
    }
    if predicted_delta < -sensitivity * latest_price {
        return Signal::Sell;
    }
    Signal::Hold
}

/// Batch market analyzer: computes every indicator over the full series,
/// obtains a forecast, decides, and assembles the report.
pub struct Analyzer {
    analysis: AnalysisConfig,
    forecaster: Arc<dyn Forecaster>,
    forecast_timeout_ms: u64,
}

impl Analyzer {
    pub fn new(analysis: AnalysisConfig, forecast: ForecastConfig) -> Self {
        let forecaster = forecast::build_forecaster(&forecast);
        Self {
            analysis,
            forecaster,
            forecast_timeout_ms: forecast.timeout_ms,
        }
    }

    /// Substitute a forecaster implementation without touching the policy.
    pub fn with_forecaster(
        analysis: AnalysisConfig,
        forecaster: Arc<dyn Forecaster>,
        forecast_timeout_ms: u64,
    ) -> Self {
        Self {
            analysis,
            forecaster,
            forecast_timeout_ms,
        }
    }

    pub async fn analyze(
        &self,
        trading_pair: &str,
        series: &BarSeries,
        latest_price: f64,
    ) -> Result<AnalysisReport, Report<IndicatorError>> {
        let closes = series.closes();
        let snapshot = self.indicator_snapshot(&closes)?;

        // Forecast failure is non-fatal: degrade to a zero delta and record
        // the degradation in the report.
        let forecast_result = forecast::predict_with_timeout(
            Arc::clone(&self.forecaster),
            series,
            self.forecast_timeout_ms,
        )
        .await;
        let (predicted_delta, forecast_degraded) = match forecast_result {
            Ok(forecast) => (forecast.predicted_delta, false),
            Err(error) => {
                warn!(
                    error = ?error,
                    forecaster = self.forecaster.name(),
                    "forecast unavailable, degrading to zero delta"
                );
                (0.0, true)
            }
        };

        let signal = decide(
            latest_price,
            &snapshot,
            predicted_delta,
            self.analysis.signal_sensitivity,
        );

        Ok(AnalysisReport::assemble(
            trading_pair,
            latest_price,
            &snapshot,
            predicted_delta,
            forecast_degraded,
            signal,
        ))
    }

    fn indicator_snapshot(
        &self,
        closes: &[f64],
    ) -> Result<IndicatorSnapshot, Report<IndicatorError>> {
        let a = &self.analysis;

        let rsi_result = Rsi::new(a.rsi_period)?.compute(closes);
        let bands_result =
            BollingerBands::new(a.bollinger_period, a.bollinger_num_std)?.compute(closes);
        let macd_result = Macd::new(a.macd_short, a.macd_long, a.macd_signal)?.compute(closes);

        // Every indicator is evaluated before the first failure propagates,
        // so a short series logs each gap rather than only the first.
        if let Err(error) = &rsi_result {
            warn!(error = ?error, "rsi unavailable");
        }
        if let Err(error) = &bands_result {
            warn!(error = ?error, "bollinger unavailable");
        }
        if let Err(error) = &macd_result {
            warn!(error = ?error, "macd unavailable");
        }

        let rsi_series = rsi_result?;
        let bands = bands_result?;
        let macd_series = macd_result?;

        let rsi = *rsi_series
            .last()
            .expect("rsi output is non-empty when compute succeeds");
        let (_, upper_band, lower_band) = bands
            .latest()
            .expect("bands have a defined index when compute succeeds");
        let macd = *macd_series
            .macd
            .last()
            .expect("macd output is non-empty when compute succeeds");
        let macd_signal = *macd_series
            .signal
            .last()
            .expect("macd signal is non-empty when compute succeeds");

        Ok(IndicatorSnapshot {
            sma: trailing_mean(closes, a.bollinger_period),
            rsi,
            upper_band,
            lower_band,
            macd,
            macd_signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;
    use crate::model::{Bar, Forecast};

    fn snapshot(rsi: f64, upper: f64, lower: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            sma: (upper + lower) / 2.0,
            rsi,
            upper_band: upper,
            lower_band: lower,
            macd: 0.0,
            macd_signal: 0.0,
        }
    }

    #[test]
    fn oversold_below_band_buys() {
        let s = snapshot(25.0, 105.0, 95.0);
        assert_eq!(decide(90.0, &s, 0.0, 0.005), Signal::Buy);
    }

    #[test]
    fn oversold_buy_dominates_bearish_forecast() {
        // Rule 1 wins over rule 4 regardless of forecast sign.
        let s = snapshot(25.0, 105.0, 95.0);
        assert_eq!(decide(90.0, &s, -50.0, 0.005), Signal::Buy);
    }

    #[test]
    fn overbought_above_band_sells() {
        let s = snapshot(75.0, 105.0, 95.0);
        assert_eq!(decide(110.0, &s, 100.0, 0.005), Signal::Sell);
    }

    #[test]
    fn oversold_alone_is_not_a_buy() {
        // RSI below 30 but price still inside the bands: falls through to
        // the forecast rules.
        let s = snapshot(25.0, 105.0, 95.0);
        assert_eq!(decide(100.0, &s, 0.0, 0.005), Signal::Hold);
    }

    #[test]
    fn bullish_forecast_beyond_sensitivity_buys() {
        let s = snapshot(50.0, 105.0, 95.0);
        assert_eq!(decide(100.0, &s, 0.6, 0.005), Signal::Buy);
    }

    #[test]
    fn bearish_forecast_beyond_sensitivity_sells() {
        let s = snapshot(50.0, 105.0, 95.0);
        assert_eq!(decide(100.0, &s, -0.6, 0.005), Signal::Sell);
    }

    #[test]
    fn forecast_at_threshold_holds() {
        // Strictly greater than the threshold is required.
        let s = snapshot(50.0, 105.0, 95.0);
        assert_eq!(decide(100.0, &s, 0.5, 0.005), Signal::Hold);
        assert_eq!(decide(100.0, &s, -0.5, 0.005), Signal::Hold);
    }

    #[test]
    fn neutral_inputs_hold() {
        let s = snapshot(50.0, 105.0, 95.0);
        assert_eq!(decide(100.0, &s, 0.0, 0.005), Signal::Hold);
    }

    fn series(closes: &[f64]) -> BarSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp_ms: 1_700_000_000_000 + i as i64 * 300_000,
                open: None,
                high: None,
                low: None,
                close,
                volume: None,
            })
            .collect();
        BarSeries::ingest(bars).unwrap()
    }

    fn default_analyzer() -> Analyzer {
        Analyzer::new(AnalysisConfig::default(), ForecastConfig::default())
    }

    struct FailingForecaster;

    impl Forecaster for FailingForecaster {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn predict(&self, _series: &BarSeries) -> Result<Forecast, Report<ForecastError>> {
            Err(Report::new(ForecastError::Degenerate))
        }
    }

    #[tokio::test]
    async fn reference_scenario_signals_buy() {
        // closes = [100]*19 + [90]: RSI collapses to 0 and the latest price
        // sits below the lower band, so rule 1 fires.
        let mut closes = vec![100.0; 19];
        closes.push(90.0);
        let series = series(&closes);

        let report = default_analyzer()
            .analyze("btc_usdt", &series, 90.0)
            .await
            .unwrap();

        assert_eq!(report.trade_signal, Signal::Buy);
        assert!((report.sma - 99.5).abs() < 1e-9);
        assert_eq!(report.rsi, 0.0);
        assert!(report.latest_price < report.lower_band);
        assert!(!report.forecast_degraded);
    }

    #[tokio::test]
    async fn flat_series_holds() {
        let series = series(&[100.0; 40]);
        let report = default_analyzer()
            .analyze("btc_usdt", &series, 100.0)
            .await
            .unwrap();
        assert_eq!(report.trade_signal, Signal::Hold);
        assert_eq!(report.prediction_delta, 0.0);
    }

    #[tokio::test]
    async fn short_series_reports_insufficient_data() {
        let series = series(&[100.0; 10]);
        let err = default_analyzer()
            .analyze("btc_usdt", &series, 100.0)
            .await
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            IndicatorError::InsufficientData { .. }
        ));
    }

    #[tokio::test]
    async fn forecast_failure_degrades_instead_of_aborting() {
        let analyzer = Analyzer::with_forecaster(
            AnalysisConfig::default(),
            Arc::new(FailingForecaster),
            1_000,
        );
        let report = analyzer
            .analyze("btc_usdt", &series(&[100.0; 40]), 100.0)
            .await
            .unwrap();
        assert!(report.forecast_degraded);
        assert_eq!(report.prediction_delta, 0.0);
        assert_eq!(report.trade_signal, Signal::Hold);
    }

    #[tokio::test]
    async fn report_inputs_reproduce_the_signal() {
        let mut closes = vec![100.0; 19];
        closes.push(90.0);
        let report = default_analyzer()
            .analyze("btc_usdt", &series(&closes), 90.0)
            .await
            .unwrap();

        let replayed = decide(
            report.latest_price,
            &report.snapshot(),
            report.prediction_delta,
            AnalysisConfig::default().signal_sensitivity,
        );
        assert_eq!(replayed, report.trade_signal);
    }
}
