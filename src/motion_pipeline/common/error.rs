use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Frame dimensions {actual:?} do not match background model {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Frame source returned an empty frame")]
    EmptyFrame,

    #[error("Frame source failed: {0}")]
    SourceError(String),

    #[error("Sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Failed to encode snapshot: {0}")]
    EncodeError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No background model has been captured")]
    NoBackground,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
