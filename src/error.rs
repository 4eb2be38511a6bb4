use serde_json::Value;
use thiserror::Error;

/// ApiError
///
/// Every way a call to the events API can fail. The stores hand these back to
/// their caller untouched, except `Unauthorized`, which also ends the session.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the token is missing, expired or revoked.
    #[error("session is no longer valid")]
    Unauthorized,
    /// 403 from the server, or an admin-only operation attempted without admin rights.
    #[error("operation not permitted")]
    Forbidden,
    #[error("resource not found")]
    NotFound,
    /// Any other 4xx. The body is kept as-is for field-level form errors.
    #[error("request rejected with status {status}")]
    Rejected { status: u16, body: Value },
    #[error("server error {status}")]
    Server { status: u16, body: Value },
    /// No response at all (connection refused, DNS, timeout).
    #[error("network unavailable: {0}")]
    Network(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Maps a non-success status and its body onto the taxonomy.
    pub fn from_status(status: u16, body: Value) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 | 410 => ApiError::NotFound,
            400..=499 => ApiError::Rejected { status, body },
            _ => ApiError::Server { status, body },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// StorageError
///
/// Failure to read or write the persisted token.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("token storage unavailable: {0}")]
    Unavailable(String),
}
