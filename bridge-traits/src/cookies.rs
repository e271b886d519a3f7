//! Cookie Access Abstraction
//!
//! Read access to script-visible cookies of the application origin.

use async_trait::async_trait;

use crate::error::Result;

/// Script-visible cookie reader
///
/// The protected session cookie is HttpOnly and deliberately invisible through
/// this trait; the only cookie the core reads is the double-submit CSRF token
/// the server reissues on login and on successful renewal.
///
/// Values are returned exactly as stored (still percent-encoded if the server
/// encoded them); decoding is the caller's concern.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Get the raw value of a cookie by name
    ///
    /// Returns `Ok(None)` if no cookie with that name is visible.
    async fn get(&self, name: &str) -> Result<Option<String>>;
}
