use thiserror::Error;

/// Top-level error type for configuration and request decoding.
#[derive(Error, Debug)]
pub enum FlightError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Malformed form field {field:?}: expected key=value")]
    MalformedField { field: String },
}
