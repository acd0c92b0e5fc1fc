use thiserror::Error;

/// The primary error type for the photo-locator crate.
///
/// Missing GPS data, unknown places and provider outages are not errors: they surface as
/// `None` fields of the report. Only setup problems and unreadable files end up here.
#[derive(Error, Debug)]
pub enum PhotoLocatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client could not be built")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::geocode::error::ConfigError),
}
