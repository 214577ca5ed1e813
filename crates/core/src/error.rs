/// Result alias that carries the custom [`WavetrailError`] type.
pub type Result<T> = std::result::Result<T, WavetrailError>;

/// Common error type for the core crate and the binaries built on top of it.
///
/// The analysis and generation pipelines absorb degenerate input into empty
/// results, so this type mostly surfaces at the I/O boundary: unreadable
/// audio, unusable decoded streams, artifact files that cannot be written.
#[derive(Debug, thiserror::Error)]
pub enum WavetrailError {
    /// The caller handed the pipeline input it cannot work with at all.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Free-form error message, typically wrapping a decoder failure.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON artifact serialization errors.
    #[error("{0}")]
    Serialization(#[from] serde_json::Error),
}

impl WavetrailError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for WavetrailError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for WavetrailError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
