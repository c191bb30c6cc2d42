use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_rsi_period() -> usize {
    14
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_num_std() -> f64 {
    2.0
}

fn default_macd_short() -> usize {
    12
}

fn default_macd_long() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_signal_sensitivity() -> f64 {
    0.005
}

fn default_forecast_strategy() -> String {
    "trend".into()
}

fn default_forecast_window() -> usize {
    100
}

fn default_forecast_timeout_ms() -> u64 {
    3_000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_num_std")]
    pub bollinger_num_std: f64,
    #[serde(default = "default_macd_short")]
    pub macd_short: usize,
    #[serde(default = "default_macd_long")]
    pub macd_long: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    /// Fraction of the latest price the forecast delta must exceed before
    /// a forecast-only BUY/SELL fires.
    #[serde(default = "default_signal_sensitivity")]
    pub signal_sensitivity: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            bollinger_period: default_bollinger_period(),
            bollinger_num_std: default_bollinger_num_std(),
            macd_short: default_macd_short(),
            macd_long: default_macd_long(),
            macd_signal: default_macd_signal(),
            signal_sensitivity: default_signal_sensitivity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Accepted values: `"trend"` | `"naive"`
    #[serde(default = "default_forecast_strategy")]
    pub strategy: String,
    /// Trailing bars the forecaster fits on.
    #[serde(default = "default_forecast_window")]
    pub window: usize,
    #[serde(default = "default_forecast_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            strategy: default_forecast_strategy(),
            window: default_forecast_window(),
            timeout_ms: default_forecast_timeout_ms(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_FORECAST_STRATEGIES: &[&str] = &["trend", "naive"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let analysis = &config.analysis;

    if analysis.rsi_period == 0 {
        return Err(validation_error("analysis.rsi_period must be > 0"));
    }
    if analysis.bollinger_period < 2 {
        return Err(validation_error("analysis.bollinger_period must be >= 2"));
    }
    if !analysis.bollinger_num_std.is_finite() || analysis.bollinger_num_std < 0.0 {
        return Err(validation_error(
            "analysis.bollinger_num_std must be finite and >= 0",
        ));
    }
    if analysis.macd_short == 0 || analysis.macd_long == 0 || analysis.macd_signal == 0 {
        return Err(validation_error("analysis.macd_* spans must be > 0"));
    }
    if analysis.macd_short >= analysis.macd_long {
        return Err(validation_error(
            "analysis.macd_short must be < analysis.macd_long",
        ));
    }
    if !analysis.signal_sensitivity.is_finite() || analysis.signal_sensitivity < 0.0 {
        return Err(validation_error(
            "analysis.signal_sensitivity must be finite and >= 0",
        ));
    }

    let forecast = &config.forecast;
    if !VALID_FORECAST_STRATEGIES.contains(&forecast.strategy.as_str()) {
        return Err(validation_error(&format!(
            "forecast.strategy \"{}\" is not valid",
            forecast.strategy
        )));
    }
    if forecast.window < 2 {
        return Err(validation_error("forecast.window must be >= 2"));
    }
    if forecast.timeout_ms == 0 {
        return Err(validation_error("forecast.timeout_ms must be > 0"));
    }

    Ok(())
}

fn validation_error(field: &str) -> Report<ConfigError> {
    Report::new(ConfigError::Validation {
        field: field.to_string(),
    })
}
