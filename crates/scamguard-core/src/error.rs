//! Error types for scamguard

/// Result type alias using scamguard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for scamguard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (fatal at startup)
    #[error("configuration error: {0}")]
    Config(String),

    /// Classifier backend errors (transport, envelope, status)
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Example store errors
    #[error("example store error: {0}")]
    Store(String),

    /// Chat platform errors
    #[error("platform error: {0}")]
    Platform(String),

    /// Moderator lacks the required privilege
    #[error("permission denied: {0}")]
    Permission(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new platform error
    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform(msg.into())
    }

    /// Create a new permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
