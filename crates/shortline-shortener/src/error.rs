use shortline_core::ShortenerError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
    #[error("write pipeline requires a tokio runtime: {0}")]
    NoRuntime(String),
    /// The queue stayed full until the deadline; the task was not enqueued.
    #[error("write queue stayed full until the deadline")]
    CapacityTimeout,
    #[error("write pipeline is closed")]
    Closed,
}

/// Rejected [`ShortenerConfig`](crate::ShortenerConfig) values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max attempts must be at least 1, got {0}")]
    ZeroAttempts(usize),
}

impl From<PipelineError> for ShortenerError {
    fn from(value: PipelineError) -> Self {
        match value {
            PipelineError::CapacityTimeout => Self::CapacityTimeout,
            other => Self::Unavailable(other.to_string()),
        }
    }
}
