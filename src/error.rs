use thiserror::Error;

/// Failures raised by the aggregation and layout core.
#[derive(Error, Debug)]
pub enum GramError {
    #[error("invalid aggregation request: {0}")]
    InvalidAggregationRequest(String),
    #[error("empty partition: {0}")]
    EmptyPartition(String),
    #[error("incompatible arrangement: {0}")]
    IncompatibleArrangement(String),
    #[error("invalid layout options: {0}")]
    InvalidOptions(String),
    #[error("data error: {0}")]
    Data(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GramError>;
