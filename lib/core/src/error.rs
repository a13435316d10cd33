use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Image fetch error: {0}")]
    Fetch(String),

    #[error("Embedding backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("No image provided")]
    MissingImage,

    #[error("Search timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Errors the embedding fallback chain absorbs instead of surfacing.
    pub fn is_recoverable_input(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::Fetch(_))
    }
}
