use thiserror::Error;

/// Top-level error type for Pitchside.
///
/// The chat crate defines its own `ChatError` and converts from this type so
/// that `?` works across the crate boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PitchsideError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for PitchsideError {
    fn from(err: toml::de::Error) -> Self {
        PitchsideError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PitchsideError {
    fn from(err: toml::ser::Error) -> Self {
        PitchsideError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Pitchside operations.
pub type Result<T> = std::result::Result<T, PitchsideError>;
