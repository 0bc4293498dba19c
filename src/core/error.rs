use thiserror::Error;


#[derive(Error, Debug)]
pub enum LibrisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid filter expression: {0}")]
    InvalidFilter(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Thesaurus error: {0}")]
    Thesaurus(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Graph build cancelled after {0} documents")]
    Cancelled(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LibrisError {
    /// Transient store failures are the only kind a resilience layer should retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}


pub type Result<T> = std::result::Result<T, LibrisError>;
