use thiserror::Error;

/// Fatal errors that abort a release decision
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error(
        "Unsupported version increment mode: '{mode}'. Only these values are supported: 'major', 'minor', 'patch'"
    )]
    UnsupportedIncrementMode { mode: String },

    #[error("Not allowed commit {sha}: {message}")]
    NotAllowedCommit { sha: String, message: String },

    #[error("{count} check run(s) failed:\n{details}")]
    BlockingCheckRuns { count: usize, details: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hosting request failed: {message}")]
    Hosting {
        status: Option<u16>,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-gate
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::InvalidVersion(msg.into())
    }

    /// Create a hosting error without an HTTP status
    pub fn hosting(msg: impl Into<String>) -> Self {
        ReleaseError::Hosting {
            status: None,
            message: msg.into(),
        }
    }

    /// HTTP status of a failed hosting request, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ReleaseError::Hosting { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ReleaseError {
    fn from(err: toml::de::Error) -> Self {
        ReleaseError::Config(err.to_string())
    }
}
