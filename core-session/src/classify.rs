//! Heuristic classification of auth-related errors
//!
//! Any error raised anywhere in the application can be run through this
//! filter to decide whether it should trigger the wipe-and-redirect path. It
//! is substring matching over the error text, tuned to over-trigger: a false
//! positive costs one extra login prompt, a false negative leaves a stale
//! session behind.

use crate::error::SessionError;
use std::error::Error;

/// Substrings that mark an error message as auth-related.
const AUTH_NEEDLES: &[&str] = &[
    "expired",
    "unauthorized",
    "unauthenticated",
    "forbidden",
    "401",
    "403",
    "invalid token",
    "invalid session",
    "not logged in",
    "csrf",
];

/// Whether an error message reads as auth-related.
pub fn is_auth_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    AUTH_NEEDLES.iter().any(|needle| lowered.contains(needle))
}

/// Whether an arbitrary error, including its source chain, reads as
/// auth-related.
pub fn is_auth_error(error: &(dyn Error + 'static)) -> bool {
    let mut current: Option<&(dyn Error + 'static)> = Some(error);
    while let Some(e) = current {
        if is_auth_message(&e.to_string()) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Whether a core error should trigger the session-expired path.
///
/// Structured variants are matched directly; the string heuristic only
/// applies to the free-text ones.
pub fn is_session_terminal(error: &SessionError) -> bool {
    match error {
        SessionError::AuthRejected(_) | SessionError::CsrfTokenMissing => true,
        SessionError::Network(msg) | SessionError::Protocol(msg) => is_auth_message(msg),
        SessionError::RateLimited(_) | SessionError::Storage(_) => false,
    }
}
