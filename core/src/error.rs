//! Error types for the gate, the loader and the XLSX decoder.

use thiserror::Error;

use crate::auth::AuthState;

/// Result type for XLSX decoding.
pub type WorkbookResult<T> = std::result::Result<T, WorkbookError>;

/// Errors raised while talking to the biometric collaborator.
#[derive(Debug, Error)]
pub enum BiometricError {
    /// D-Bus connection or call failure
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error("No fingerprint devices available")]
    NoDeviceAvailable,
}

/// Errors raised while downloading the document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while decoding an XLSX document.
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    #[error("Missing required part: {0}")]
    MissingPart(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Any failure of the fetch, decode and measure sequence.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    /// The blocking decode task panicked or was cancelled
    #[error("Decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Reasons a fetch is refused before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchRejected {
    #[error("Authenticate before loading the table (state: {0})")]
    NotAuthenticated(AuthState),

    #[error("A table download is already in progress")]
    AlreadyLoading,
}
