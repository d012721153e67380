//! Error types for frameclass

/// Result type alias using frameclass's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for frameclass operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Metadata sidecar missing, unparsable or invalid
    #[error("descriptor error: {0}")]
    Descriptor(String),

    /// Model binary missing, corrupt or not loadable by its backend
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Backend failed while running inference
    #[error("inference error: {0}")]
    Inference(String),

    /// Tensor or score vector length differs from what the model declares
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// The score vector contained nothing that can be ranked
    #[error("no prediction available")]
    NoPrediction,

    /// Backend or model format not available in this build
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Image decoding errors
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new descriptor error
    pub fn descriptor(msg: impl Into<String>) -> Self {
        Self::Descriptor(msg.into())
    }

    /// Create a new model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new unsupported error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error happened while loading, as opposed to per-frame inference
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Descriptor(_)
                | Self::ModelLoad(_)
                | Self::Unsupported(_)
                | Self::Io(_)
                | Self::Serialization(_)
        )
    }
}
