//! Error type shared by the reader, the backend client and the document loader.

/// Failure of a reader operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderError {
    /// The whole document could not be fetched or decoded
    DocumentLoad(String),
    /// A single page failed to render; the rest of the document is unaffected
    PageRender { page: u32, reason: String },
    /// Input rejected before any request was made
    Validation(String),
    /// Transport-level failure (connection, timeout, body read)
    Request(String),
    /// The backend answered with a non-success status
    Api { status: u16, message: String },
    /// The backend answered with a body we could not decode
    Decode(String),
    /// Missing or malformed configuration
    Config(String),
}

impl std::fmt::Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderError::DocumentLoad(msg) => write!(f, "Failed to load document: {}", msg),
            ReaderError::PageRender { page, reason } => {
                write!(f, "Failed to render page {}: {}", page, reason)
            }
            ReaderError::Validation(msg) => write!(f, "{}", msg),
            ReaderError::Request(msg) => write!(f, "Request failed: {}", msg),
            ReaderError::Api { status, message } => {
                write!(f, "Server returned {}: {}", status, message)
            }
            ReaderError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
            ReaderError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ReaderError {}

impl From<reqwest::Error> for ReaderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ReaderError::Decode(e.to_string())
        } else {
            ReaderError::Request(e.to_string())
        }
    }
}
