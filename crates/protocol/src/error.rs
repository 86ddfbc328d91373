//! Error taxonomy shared by every layer of the client.

/// Coarse error category, stable across releases.
///
/// Out-of-crate consumers (a CLI mapping exit codes, a UI choosing an icon)
/// match on this instead of the full [`ShipError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Network,
    Api,
    Cancelled,
    Business,
    File,
    Config,
}

/// Errors produced by the staticship client.
#[derive(Debug, thiserror::Error)]
pub enum ShipError {
    /// Local pre-network rejection of a file batch.
    #[error("{message}")]
    Validation { message: String, issues: usize },

    /// Connection-level failure (DNS, refused, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx HTTP response.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Aborted by the caller or by the request deadline.
    #[error("{operation} cancelled")]
    Cancelled { operation: String },

    /// Misuse or unexpected internal failure. The message is always sanitized.
    #[error("{0}")]
    Business(String),

    /// Local file could not be read.
    #[error("file error: {0}")]
    File(String),

    /// Malformed or missing configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Public message used for every unclassified failure.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

impl ShipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Network(_) => ErrorKind::Network,
            Self::Api { .. } => ErrorKind::Api,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Business(_) => ErrorKind::Business,
            Self::File(_) => ErrorKind::File,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Builds a cancellation error for the named operation, e.g. `"Deploy"`.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Generic failure with the stable public message.
    pub fn unexpected() -> Self {
        Self::Business(UNEXPECTED_ERROR.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ShipError {
    fn from(err: std::io::Error) -> Self {
        Self::File(err.to_string())
    }
}
