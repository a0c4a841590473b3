use thiserror::Error;

/// Common error type for thermpdo components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },
}

/// Result type alias using thermpdo's Error.
pub type Result<T> = std::result::Result<T, Error>;
