use thiserror::Error;

/// Session core error taxonomy.
///
/// `Clone` is required so the refresh coordinator can fan a settled error out
/// to every waiter of a single-flight operation.
///
/// Cryptographic failures are deliberately absent: the vault collapses them
/// into "no cached data" (see `vault`), so no caller-visible variant exists
/// that could act as a decryption oracle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    #[error("CSRF token missing")]
    CsrfTokenMissing,

    #[error("{0}")]
    RateLimited(String),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Malformed server response: {0}")]
    Protocol(String),
}

impl From<bridge_traits::BridgeError> for SessionError {
    fn from(e: bridge_traits::BridgeError) -> Self {
        match e {
            bridge_traits::BridgeError::Network(msg) => SessionError::Network(msg),
            other => SessionError::Storage(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
