//! XML codec errors.

use thiserror::Error;

/// Errors that can occur while rendering a document to XML.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The underlying writer failed.
    #[error("XML write error: {0}")]
    Write(String),

    /// The rendered bytes were not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(String),
}

/// Result type for XML rendering.
pub type Result<T> = std::result::Result<T, XmlError>;
