use thiserror::Error;

pub type GrowthResult<T> = Result<T, GrowthError>;

#[derive(Error, Debug)]
pub enum GrowthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid projection horizon {horizon}: must be between 0 and {max} months")]
    InvalidHorizon { horizon: u32, max: u32 },

    #[error("Invalid target for {key}: {value} ({reason})")]
    InvalidTarget {
        key: String,
        value: f64,
        reason: &'static str,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for GrowthError {
    fn from(err: config::ConfigError) -> Self {
        GrowthError::Config(err.to_string())
    }
}
