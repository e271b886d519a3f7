//! Double-submit CSRF defense
//!
//! The server reissues a script-readable cookie carrying the CSRF token on
//! login and on successful renewal. Mutating requests must echo that value in
//! a header, byte-identical to the cookie; read-only methods bypass
//! attachment entirely.

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::types::CsrfTokenResponse;
use bridge_traits::cookies::CookieStore;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tracing::{debug, warn};

/// How a missing CSRF token is handled on a mutating request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMode {
    /// Fail closed: abort with [`SessionError::CsrfTokenMissing`].
    Strict,
    /// Fail open: log and send without the header. Reserved for best-effort
    /// paths like logout, where the server-side failure is harmless.
    Lenient,
}

/// Reads the double-submit cookie and attaches it to outbound requests.
pub struct CsrfGuard {
    cookies: Arc<dyn CookieStore>,
    http: Arc<dyn HttpClient>,
    cookie_name: String,
    header_name: String,
}

impl CsrfGuard {
    pub fn new(
        cookies: Arc<dyn CookieStore>,
        http: Arc<dyn HttpClient>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            cookies,
            http,
            cookie_name: config.csrf_cookie_name.clone(),
            header_name: config.csrf_header_name.clone(),
        }
    }

    /// Current token from the cookie, percent-decoded, or `None`.
    pub async fn token(&self) -> Result<Option<String>> {
        let raw = self.cookies.get(&self.cookie_name).await?;
        match raw {
            Some(value) => {
                let decoded = percent_decode_str(&value)
                    .decode_utf8()
                    .map_err(|e| SessionError::Protocol(format!("CSRF cookie not UTF-8: {}", e)))?
                    .into_owned();
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }

    /// Attach the token header to `request`.
    ///
    /// With [`AttachMode::Strict`] a missing token aborts; with
    /// [`AttachMode::Lenient`] the request goes out headerless.
    pub async fn attach(&self, request: HttpRequest, mode: AttachMode) -> Result<HttpRequest> {
        match self.token().await? {
            Some(token) => Ok(request.header(&self.header_name, token)),
            None => match mode {
                AttachMode::Strict => Err(SessionError::CsrfTokenMissing),
                AttachMode::Lenient => {
                    warn!(cookie = %self.cookie_name, "CSRF token absent, proceeding without header");
                    Ok(request)
                }
            },
        }
    }

    /// Execute `request` with method-aware CSRF handling.
    ///
    /// Read-only methods (GET, HEAD, OPTIONS) go out untouched. Mutating
    /// methods get the token attached per `mode` first, so a mutating request
    /// is never sent without at least a best-effort attempt.
    pub async fn execute_protected(
        &self,
        request: HttpRequest,
        mode: AttachMode,
    ) -> Result<HttpResponse> {
        let request = if request.method.is_read_only() {
            request
        } else {
            self.attach(request, mode).await?
        };
        Ok(self.http.execute(request).await?)
    }

    /// Return the existing token, or prime one from the server.
    ///
    /// Hits the token endpoint when the cookie is absent; the server sets the
    /// cookie as a side effect and echoes the value in the body. Fails if
    /// neither source yields a token.
    pub async fn ensure_token(&self, token_url: &str) -> Result<String> {
        if let Some(token) = self.token().await? {
            return Ok(token);
        }

        debug!("priming CSRF token from server");
        let response = self
            .http
            .execute(HttpRequest::new(HttpMethod::Get, token_url))
            .await?;
        if !response.is_success() {
            return Err(SessionError::Network(format!(
                "CSRF token endpoint returned {}",
                response.status
            )));
        }

        // Prefer the freshly set cookie; fall back to the echoed body value.
        if let Some(token) = self.token().await? {
            return Ok(token);
        }
        let body: CsrfTokenResponse = response
            .json()
            .map_err(|e| SessionError::Protocol(e.to_string()))?;
        body.csrf_token.ok_or(SessionError::CsrfTokenMissing)
    }
}
