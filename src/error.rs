use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

/// Errors raised at the ingestion boundary, never mid-computation.
#[derive(Debug, Display, Error)]
pub enum IngestError {
    #[display("failed to read bar input")]
    ReadInput,
    #[display("failed to parse bar records")]
    Parse,
    #[display("invalid close value: {value:?}")]
    InvalidClose { value: String },
    #[display("invalid timestamp: {value}")]
    InvalidTimestamp { value: i64 },
    #[display("bar series is empty")]
    Empty,
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("{indicator}: insufficient data, need {required} closes, got {available}")]
    InsufficientData {
        indicator: &'static str,
        required: usize,
        available: usize,
    },
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum ForecastError {
    #[display("not enough history: need {required} points, got {available}")]
    NotEnoughHistory { required: usize, available: usize },
    #[display("model fit produced a non-finite forecast")]
    Degenerate,
    #[display("forecast timed out after {ms}ms")]
    Timeout { ms: u64 },
    #[display("forecast task failed")]
    Task,
}
