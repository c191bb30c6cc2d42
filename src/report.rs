use std::fmt::Write;

use serde::Serialize;

use crate::engine::IndicatorSnapshot;
use crate::model::Signal;

/// The engine's sole externally visible output: the decision plus every
/// intermediate value that produced it, suitable for JSON serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub trading_pair: String,
    pub latest_price: f64,
    pub sma: f64,
    pub rsi: f64,
    pub upper_band: f64,
    pub lower_band: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub prediction_delta: f64,
    pub forecast_price: f64,
    pub forecast_degraded: bool,
    pub trade_signal: Signal,
}

impl AnalysisReport {
    /// Pure assembly; no decision logic.
    pub fn assemble(
        trading_pair: &str,
        latest_price: f64,
        snapshot: &IndicatorSnapshot,
        prediction_delta: f64,
        forecast_degraded: bool,
        trade_signal: Signal,
    ) -> Self {
        Self {
            trading_pair: trading_pair.to_string(),
            latest_price,
            sma: snapshot.sma,
            rsi: snapshot.rsi,
            upper_band: snapshot.upper_band,
            lower_band: snapshot.lower_band,
            macd: snapshot.macd,
            macd_signal: snapshot.macd_signal,
            prediction_delta,
            forecast_price: latest_price + prediction_delta,
            forecast_degraded,
            trade_signal,
        }
    }

    /// The recorded indicator inputs, exactly as fed to the decision.
    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            sma: self.sma,
            rsi: self.rsi,
            upper_band: self.upper_band,
            lower_band: self.lower_band,
            macd: self.macd,
            macd_signal: self.macd_signal,
        }
    }

    /// Terminal block for the presentation layer.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "---------- Market Data & Signals for {} ----------",
            self.trading_pair.to_uppercase()
        );
        let _ = writeln!(out, "Latest Price   : ${:.2}", self.latest_price);
        let _ = writeln!(out, "SMA            : ${:.2}", self.sma);
        let _ = writeln!(out, "RSI            : {:.2}", self.rsi);
        let _ = writeln!(
            out,
            "Bollinger Bands: Upper = ${:.2}, Lower = ${:.2}",
            self.upper_band, self.lower_band
        );
        let _ = writeln!(out, "MACD           : {:.4}", self.macd);
        let _ = writeln!(out, "MACD Signal    : {:.4}", self.macd_signal);
        let _ = writeln!(out, "Prediction     : Change of {:+.4}", self.prediction_delta);
        let _ = writeln!(out, "Forecast Price : ${:.2}", self.forecast_price);
        if self.forecast_degraded {
            let _ = writeln!(out, "(forecast unavailable, assumed zero change)");
        }
        let _ = writeln!(out, "------------------> Trade Signal: {}", self.trade_signal);
        out
    }
}
