use thiserror::Error;

/// Failure of a single request to the geocoding provider. Never leaves the resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Response body could not be read: {0}")]
    Body(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("A contact address is required by the provider's usage policy")]
    MissingContact,

    #[error("User-Agent is not a valid header value: {0}")]
    InvalidUserAgent(String),

    #[error("Rounding precision {0} is out of range (0..=9)")]
    PrecisionOutOfRange(u32),

    #[error("Cache capacity must be at least 1")]
    ZeroCapacity,

    #[error("At least one request attempt is required")]
    ZeroAttempts,
}
