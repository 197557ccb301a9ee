//! Error types for the FTP image optimizer.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Validation errors for configuration and local input files.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Path-related validation error
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    /// Invalid settings error
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Local file path errors.
#[derive(Error, Debug)]
pub enum PathError {
    /// File does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    /// Path exists but is not a file
    #[error("Not a file: {0}")]
    NotFile(PathBuf),
    /// IO error accessing the path
    #[error("IO error: {0}")]
    IO(String),
}

/// Directory listing could not be turned into entries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// Listing was empty or no line matched the dialect
    #[error("no entries in listing")]
    NoEntries,
}

/// Failures reported by the remote store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The connection itself failed (socket closed, timeout, refused)
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server answered but refused the command
    #[error("server rejected command: {0}")]
    Rejected(String),
}

/// Failures reported by the image transform service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Credentials were refused
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Monthly compression quota exhausted
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    /// The service refused the input (invalid image, unreachable source url)
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// 5xx from the service
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// Network failure talking to the service
    #[error("service unreachable: {0}")]
    Unreachable(String),
    /// Response did not have the expected shape
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Main error type for the optimizer.
///
/// Every failure in the pipeline is converted to this type before it is
/// turned into an item outcome or returned to the command layer.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// Configuration or input validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Remote directory listing could not be parsed
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    /// Remote store operation failed
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Transform service call failed
    #[error("Transform error: {0}")]
    Transform(#[from] ServiceError),

    /// Local file IO error
    #[error("IO error: {0}")]
    IO(String),

    /// Anything else that went wrong while processing an item
    #[error("Processing error: {0}")]
    Processing(String),
}

/// Convenience result type for optimizer operations.
pub type OptimizerResult<T> = Result<T, OptimizerError>;

// Helper methods for error creation
impl OptimizerError {
    pub fn processing<T: Into<String>>(msg: T) -> Self {
        Self::Processing(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::IO(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(ValidationError::settings(msg))
    }

    /// True when the remote connection is likely unusable and must be
    /// re-established before it is used again.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::Transport(_)))
    }
}

// Helper methods for validation error creation
impl ValidationError {
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NotFound(path.into()))
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NotFile(path.into()))
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}

// Convert std::io::Error to OptimizerError
impl From<io::Error> for OptimizerError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

// Convert io::Error to PathError
impl From<io::Error> for PathError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

// Convert PathError to OptimizerError
impl From<PathError> for OptimizerError {
    fn from(err: PathError) -> Self {
        Self::Validation(ValidationError::Path(err))
    }
}
