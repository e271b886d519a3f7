//! Session core configuration

use std::time::Duration;

/// Configuration for the session manager and its components.
///
/// Defaults match the first-party session API conventions; embedders override
/// individual fields with the builder methods.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the session API (no trailing slash), e.g.
    /// `https://app.example.com/api/auth`
    pub base_url: String,
    /// Name of the script-readable cookie carrying the CSRF token
    pub csrf_cookie_name: String,
    /// Header the CSRF token is echoed into on mutating requests
    pub csrf_header_name: String,
    /// Path of the login surface redirected to after wipe
    pub login_path: String,
    /// Durable-store key holding the encrypted vault payload
    pub vault_payload_key: String,
    /// Volatile-store key holding the exported session encryption key
    pub session_key_slot: String,
    /// Maximum login attempts inside the throttle window
    pub throttle_max_attempts: usize,
    /// Throttle window length in milliseconds
    pub throttle_window_ms: i64,
    /// Safety margin (milliseconds) before the recorded access-token expiry
    /// at which renewal is already attempted
    pub refresh_margin_ms: i64,
    /// Timeout applied to each network operation
    pub request_timeout: Duration,
    /// User agent reported in login/refresh context fields
    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "/api/auth".to_string(),
            csrf_cookie_name: "csrf_token".to_string(),
            csrf_header_name: "X-CSRF-Token".to_string(),
            login_path: "/login".to_string(),
            vault_payload_key: "vault_payload".to_string(),
            session_key_slot: "vault_session_key".to_string(),
            throttle_max_attempts: 5,
            throttle_window_ms: 60_000,
            refresh_margin_ms: crate::manager::ACCESS_EXPIRY_MARGIN_MS,
            request_timeout: Duration::from_secs(30),
            user_agent: format!("session-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SessionConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_throttle(mut self, max_attempts: usize, window_ms: i64) -> Self {
        self.throttle_max_attempts = max_attempts;
        self.throttle_window_ms = window_ms;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Absolute URL for an endpoint path like `"/login"`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
