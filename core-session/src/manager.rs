//! Session lifecycle orchestration
//!
//! [`SessionManager`] is the only writer of the session state cache. It wires
//! the CSRF guard, refresh coordinator, vault, wiper, and throttle together
//! and emits lifecycle events to the application's event bus.

use crate::classify;
use crate::config::SessionConfig;
use crate::csrf::{AttachMode, CsrfGuard};
use crate::error::{Result, SessionError};
use crate::redirect;
use crate::refresh::RefreshCoordinator;
use crate::state::SessionStateCache;
use crate::throttle::LoginThrottle;
use crate::types::{
    AuthResponse, ClientContext, LoginCredentials, LoginRequest, RefreshRequest, SessionResponse,
    SessionStatus,
};
use crate::vault::EncryptedVault;
use crate::wipe::SensitiveDataWiper;
use bridge_traits::cookies::CookieStore;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, EventBus, Receiver, SessionEvent};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Safety margin applied before the recorded access-token expiry when
/// deciding whether to renew proactively.
pub const ACCESS_EXPIRY_MARGIN_MS: i64 = 30_000;

/// Durable key holding the stable device identifier sent as the login
/// fingerprint. Deliberately survives [`SensitiveDataWiper::wipe_all`].
const DEVICE_ID_KEY: &str = "device_id";

/// Entry point for the session security core.
///
/// Holds the four lifecycle operations (`login`, `refresh_tokens`,
/// `check_session`, `logout`) plus the uniform session-expired handler.
/// Construct one per process and share it behind an `Arc`.
///
/// # Examples
///
/// ```ignore
/// use core_session::{SessionConfig, SessionManager};
/// use core_runtime::events::EventBus;
/// use std::sync::Arc;
///
/// let manager = SessionManager::new(
///     http_client,
///     cookie_store,
///     durable_store,
///     volatile_store,
///     clock,
///     EventBus::default(),
///     SessionConfig::default().with_base_url("https://app.example.com/api/auth"),
/// );
/// let status = manager.login(&credentials).await?;
/// ```
pub struct SessionManager {
    config: SessionConfig,
    durable: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    state: SessionStateCache,
    csrf: CsrfGuard,
    coordinator: RefreshCoordinator<SessionStatus>,
    vault: EncryptedVault,
    wiper: SensitiveDataWiper,
    throttle: LoginThrottle,
}

impl SessionManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        http: Arc<dyn HttpClient>,
        cookies: Arc<dyn CookieStore>,
        durable: Arc<dyn KeyValueStore>,
        volatile: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
        config: SessionConfig,
    ) -> Self {
        let csrf = CsrfGuard::new(cookies, http, &config);
        let vault = EncryptedVault::new(Arc::clone(&durable), Arc::clone(&volatile), &config);
        let wiper = SensitiveDataWiper::new(Arc::clone(&durable), Arc::clone(&volatile), &config);
        let throttle = LoginThrottle::new(
            Arc::clone(&clock),
            config.throttle_max_attempts,
            config.throttle_window_ms,
        );
        Self {
            config,
            durable,
            clock,
            event_bus,
            state: SessionStateCache::new(),
            csrf,
            coordinator: RefreshCoordinator::new(),
            vault,
            wiper,
            throttle,
        }
    }

    /// Snapshot of the cached session status.
    pub async fn status(&self) -> SessionStatus {
        self.state.status().await
    }

    /// Whether the cached projection says we are authenticated.
    pub async fn is_authenticated(&self) -> bool {
        self.state.is_authenticated().await
    }

    /// The encrypted vault for caching credential-adjacent material locally.
    pub fn vault(&self) -> &EncryptedVault {
        &self.vault
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// Authenticate with email and password.
    ///
    /// Throttled client-side as a courtesy; the server remains the real rate
    /// limiter. On success the state cache is overwritten and `SignedIn` is
    /// emitted; on failure the cache resets to signed-out and `AuthFailure`
    /// is emitted.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<SessionStatus> {
        if let Some(wait) = self.throttle.check() {
            debug!("login attempt throttled");
            return Err(SessionError::RateLimited(wait));
        }
        self.throttle.record();

        let context = self.client_context().await?;
        let body = LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
            device_fingerprint: &context.device_fingerprint,
            timezone: &context.timezone,
            user_agent: &context.user_agent,
        };
        let request = HttpRequest::new(HttpMethod::Post, self.config.endpoint("/login"))
            .json(&body)
            .map_err(|e| SessionError::Protocol(e.to_string()))?
            .timeout(self.config.request_timeout);

        // The CSRF cookie may not exist before first login; attach best-effort.
        match self.perform_auth_call(request, AttachMode::Lenient).await {
            Ok(status) => {
                info!("login succeeded");
                self.state.set(status.clone()).await;
                if let Some(user_id) = &status.user_id {
                    let _ = self.event_bus.emit(CoreEvent::Session(SessionEvent::SignedIn {
                        user_id: user_id.clone(),
                    }));
                }
                Ok(status)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                self.state.reset().await;
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Session(SessionEvent::AuthFailure {
                        message: e.to_string(),
                        recoverable: matches!(e, SessionError::Network(_)),
                    }));
                Err(e)
            }
        }
    }

    /// Renew the session tokens, collapsing concurrent callers into one
    /// network call.
    ///
    /// Exactly one caller leads the flight; everyone else receives the same
    /// settlement. A flight that settles after [`logout`](Self::logout) is
    /// discarded so it cannot resurrect cleared state.
    #[instrument(skip(self))]
    pub async fn refresh_tokens(&self) -> Result<SessionStatus> {
        let flight = self.coordinator.run(self.execute_refresh()).await;

        if !self.coordinator.is_current(flight.generation) {
            warn!("discarding renewal that settled after sign-out");
            return Err(SessionError::AuthRejected(
                "session ended during renewal".to_string(),
            ));
        }

        match flight.outcome {
            Ok(status) => {
                // Only the leader applies side effects; waiters just observe.
                if flight.led {
                    info!("session tokens refreshed");
                    self.state.set(status.clone()).await;
                    if let Some(access_expires_at) = status.access_expires_at {
                        let _ = self
                            .event_bus
                            .emit(CoreEvent::Session(SessionEvent::TokenRefreshed {
                                access_expires_at,
                            }));
                    }
                }
                Ok(status)
            }
            Err(e) => {
                if flight.led {
                    warn!(error = %e, "token renewal failed");
                    self.state.reset().await;
                    let _ = self
                        .event_bus
                        .emit(CoreEvent::Session(SessionEvent::AuthFailure {
                            message: e.to_string(),
                            recoverable: matches!(e, SessionError::Network(_)),
                        }));
                }
                Err(e)
            }
        }
    }

    /// Query the server for the authoritative session state.
    ///
    /// Always overwrites the cached projection with whatever the server says.
    #[instrument(skip(self))]
    pub async fn check_session(&self) -> Result<SessionStatus> {
        let request = HttpRequest::new(HttpMethod::Get, self.config.endpoint("/session"))
            .timeout(self.config.request_timeout);
        let response = self
            .csrf
            .execute_protected(request, AttachMode::Lenient)
            .await?;
        if !response.is_success() {
            return Err(SessionError::Network(format!(
                "session check returned {}",
                response.status
            )));
        }
        let body: SessionResponse = response
            .json()
            .map_err(|e| SessionError::Protocol(e.to_string()))?;

        let status = SessionStatus {
            authenticated: body.authenticated,
            user_id: body.user_id,
            access_expires_at: body.access_expires_at,
            refresh_expires_at: body.refresh_expires_at,
        };
        self.state.set(status.clone()).await;
        Ok(status)
    }

    /// Sign out immediately and unconditionally.
    ///
    /// Local state is invalidated and wiped before the network is touched;
    /// the server-side logout call is best-effort and its failures are
    /// swallowed. An outstanding renewal keeps running but its settlement
    /// is discarded.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        self.coordinator.invalidate();
        self.state.reset().await;
        self.wiper.wipe_all().await?;

        let request = HttpRequest::new(HttpMethod::Post, self.config.endpoint("/logout"))
            .timeout(self.config.request_timeout);
        match self.csrf.execute_protected(request, AttachMode::Lenient).await {
            Ok(response) if response.is_success() => debug!("server-side logout acknowledged"),
            Ok(response) => {
                warn!(status = response.status, "server-side logout declined, ignoring")
            }
            Err(e) => warn!(error = %e, "server-side logout failed, ignoring"),
        }

        let _ = self.event_bus.emit(CoreEvent::Session(SessionEvent::SignedOut));
        info!("signed out");
        Ok(())
    }

    /// Uniform handler for a detected session expiry.
    ///
    /// Wipes every local artifact, emits `SessionExpired`, and returns the
    /// login destination carrying the message and a sanitized return URL.
    #[instrument(skip(self))]
    pub async fn session_expired(&self, reason: &str, return_to: Option<&str>) -> Result<String> {
        self.coordinator.invalidate();
        self.state.reset().await;
        self.wiper.wipe_all().await?;

        let _ = self
            .event_bus
            .emit(CoreEvent::Session(SessionEvent::SessionExpired {
                reason: reason.to_string(),
            }));
        warn!("session expired, artifacts wiped");
        Ok(self.login_destination(reason, return_to))
    }

    /// Route an arbitrary application error through the auth-error
    /// classifier.
    ///
    /// Returns the login destination when the error reads as auth-related
    /// (after wiping, as [`session_expired`](Self::session_expired) does),
    /// or `None` when the error is not ours to handle.
    pub async fn handle_error(
        &self,
        error: &(dyn std::error::Error + 'static),
        return_to: Option<&str>,
    ) -> Result<Option<String>> {
        if !classify::is_auth_error(error) {
            return Ok(None);
        }
        let destination = self
            .session_expired("Your session has expired. Please log in again.", return_to)
            .await?;
        Ok(Some(destination))
    }

    /// Whether the access token is expired or inside the renewal margin.
    ///
    /// Missing expiry data counts as expired so that renewal is attempted
    /// rather than silently running on a stale token.
    pub async fn is_access_token_expired(&self) -> bool {
        let status = self.state.status().await;
        if !status.authenticated {
            return true;
        }
        match status.access_expires_at {
            Some(expires_at) => {
                self.clock.unix_timestamp_millis() >= expires_at - self.config.refresh_margin_ms
            }
            None => true,
        }
    }

    /// Renew proactively if the access token is at or near expiry.
    pub async fn ensure_fresh(&self) -> Result<SessionStatus> {
        if self.is_access_token_expired().await {
            self.refresh_tokens().await
        } else {
            Ok(self.state.status().await)
        }
    }

    /// Return the CSRF token, priming one from the server if absent.
    pub async fn ensure_csrf_token(&self) -> Result<String> {
        self.csrf
            .ensure_token(&self.config.endpoint("/csrf-token"))
            .await
    }

    async fn execute_refresh(&self) -> Result<SessionStatus> {
        let _ = self
            .event_bus
            .emit(CoreEvent::Session(SessionEvent::TokenRefreshing));

        let context = self.client_context().await?;
        let body = RefreshRequest {
            device_fingerprint: &context.device_fingerprint,
            timezone: &context.timezone,
            user_agent: &context.user_agent,
        };
        let request = HttpRequest::new(HttpMethod::Post, self.config.endpoint("/refresh"))
            .json(&body)
            .map_err(|e| SessionError::Protocol(e.to_string()))?
            .timeout(self.config.request_timeout);

        // Renewal is never sent without the CSRF header.
        self.perform_auth_call(request, AttachMode::Strict).await
    }

    async fn perform_auth_call(
        &self,
        request: HttpRequest,
        mode: AttachMode,
    ) -> Result<SessionStatus> {
        let response = self.csrf.execute_protected(request, mode).await?;

        if !response.is_success() {
            let message = response
                .json::<AuthResponse>()
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("server returned {}", response.status));
            return Err(if response.status == 401 || response.status == 403 {
                SessionError::AuthRejected(message)
            } else {
                SessionError::Network(message)
            });
        }

        let body: AuthResponse = response
            .json()
            .map_err(|e| SessionError::Protocol(e.to_string()))?;
        if !body.success {
            return Err(SessionError::AuthRejected(
                body.message
                    .unwrap_or_else(|| "credentials rejected".to_string()),
            ));
        }
        let user_id = body
            .user_id
            .ok_or_else(|| SessionError::Protocol("missing user_id in auth response".to_string()))?;

        Ok(SessionStatus {
            authenticated: true,
            user_id: Some(user_id),
            access_expires_at: body.access_expires_at,
            refresh_expires_at: body.refresh_expires_at,
        })
    }

    async fn client_context(&self) -> Result<ClientContext> {
        Ok(ClientContext {
            device_fingerprint: self.device_fingerprint().await?,
            timezone: chrono::Local::now().format("%:z").to_string(),
            user_agent: self.config.user_agent.clone(),
        })
    }

    // Stable per-install identifier; generated once and preserved by wipes.
    async fn device_fingerprint(&self) -> Result<String> {
        if let Some(id) = self.durable.get(DEVICE_ID_KEY).await? {
            return Ok(id);
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.durable.set(DEVICE_ID_KEY, &id).await?;
        Ok(id)
    }

    fn login_destination(&self, message: &str, return_to: Option<&str>) -> String {
        let return_url = redirect::validate(return_to);
        format!(
            "{}?message={}&returnUrl={}",
            self.config.login_path,
            utf8_percent_encode(message, NON_ALPHANUMERIC),
            utf8_percent_encode(&return_url, NON_ALPHANUMERIC),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_memory::{ManualClock, MemoryCookieStore, MemoryStore};
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct ScriptedHttp {
        responses: Mutex<Vec<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttp {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn ok(body: &str) -> HttpResponse {
            Self::status(200, body)
        }

        fn status(status: u16, body: &str) -> HttpResponse {
            HttpResponse {
                status,
                headers: HashMap::new(),
                body: Bytes::from(body.to_string()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedHttp {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> bridge_traits::error::Result<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(bridge_traits::BridgeError::Network(
                    "no scripted response".to_string(),
                ));
            }
            Ok(responses.remove(0))
        }
    }

    struct Fixture {
        manager: SessionManager,
        http: Arc<ScriptedHttp>,
        cookies: Arc<MemoryCookieStore>,
        durable: MemoryStore,
        volatile: MemoryStore,
        clock: Arc<ManualClock>,
    }

    fn fixture(responses: Vec<HttpResponse>) -> Fixture {
        let http = Arc::new(ScriptedHttp::new(responses));
        let cookies = Arc::new(MemoryCookieStore::new());
        let durable = MemoryStore::new();
        let volatile = MemoryStore::new();
        let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
        let manager = SessionManager::new(
            Arc::clone(&http) as Arc<dyn HttpClient>,
            Arc::clone(&cookies) as Arc<dyn CookieStore>,
            Arc::new(durable.clone()),
            Arc::new(volatile.clone()),
            Arc::clone(&clock) as Arc<dyn Clock>,
            EventBus::default(),
            SessionConfig::default().with_base_url("https://x.test/api/auth"),
        );
        Fixture {
            manager,
            http,
            cookies,
            durable,
            volatile,
            clock,
        }
    }

    fn credentials() -> LoginCredentials {
        LoginCredentials {
            email: "a@b.test".to_string(),
            password: "hunter2".to_string(),
        }
    }

    const LOGIN_OK: &str = r#"{
        "success": true,
        "user_id": "u-1",
        "access_expires_at": 1700000900000,
        "refresh_expires_at": 1700600000000
    }"#;

    #[tokio::test]
    async fn test_login_success_updates_state_and_emits() {
        let fx = fixture(vec![ScriptedHttp::ok(LOGIN_OK)]);
        let mut events = fx.manager.subscribe();

        let status = fx.manager.login(&credentials()).await.unwrap();
        assert!(status.authenticated);
        assert_eq!(status.user_id.as_deref(), Some("u-1"));
        assert!(fx.manager.is_authenticated().await);

        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Session(SessionEvent::SignedIn {
                user_id: "u-1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_login_sends_fingerprint_and_persists_it() {
        let fx = fixture(vec![ScriptedHttp::ok(LOGIN_OK)]);
        fx.manager.login(&credentials()).await.unwrap();

        let device_id = fx.durable.get("device_id").await.unwrap().unwrap();
        let sent = fx.http.requests.lock().unwrap();
        let body = String::from_utf8(sent[0].body.as_ref().unwrap().to_vec()).unwrap();
        assert!(body.contains(&device_id));
        assert!(!body.contains("\"password\":\"[REDACTED]\""));
    }

    #[tokio::test]
    async fn test_login_rejection_resets_state() {
        let fx = fixture(vec![ScriptedHttp::status(
            401,
            r#"{"success":false,"message":"bad credentials"}"#,
        )]);
        let mut events = fx.manager.subscribe();

        let err = fx.manager.login(&credentials()).await.unwrap_err();
        assert_eq!(err, SessionError::AuthRejected("bad credentials".to_string()));
        assert!(!fx.manager.is_authenticated().await);

        match events.recv().await.unwrap() {
            CoreEvent::Session(SessionEvent::AuthFailure { recoverable, .. }) => {
                assert!(!recoverable)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_throttled_after_saturation() {
        let mut responses = Vec::new();
        for _ in 0..5 {
            responses.push(ScriptedHttp::status(
                401,
                r#"{"success":false,"message":"nope"}"#,
            ));
        }
        let fx = fixture(responses);

        for _ in 0..5 {
            let _ = fx.manager.login(&credentials()).await;
        }
        let err = fx.manager.login(&credentials()).await.unwrap_err();
        assert!(matches!(err, SessionError::RateLimited(_)));

        // Window elapses; attempts are allowed again (and hit the network).
        fx.clock.advance(chrono::Duration::milliseconds(60_001));
        let err = fx.manager.login(&credentials()).await.unwrap_err();
        assert!(matches!(err, SessionError::Network(_)));
    }

    #[tokio::test]
    async fn test_refresh_requires_csrf_token() {
        let fx = fixture(vec![ScriptedHttp::ok(LOGIN_OK)]);

        let err = fx.manager.refresh_tokens().await.unwrap_err();
        assert_eq!(err, SessionError::CsrfTokenMissing);
        assert!(fx.http.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_success_updates_expiries() {
        let fx = fixture(vec![ScriptedHttp::ok(LOGIN_OK)]);
        fx.cookies.insert("csrf_token", "tok").await;

        let status = fx.manager.refresh_tokens().await.unwrap();
        assert_eq!(status.access_expires_at, Some(1_700_000_900_000));
        assert_eq!(fx.manager.status().await, status);

        let sent = fx.http.requests.lock().unwrap();
        assert_eq!(sent[0].headers.get("X-CSRF-Token"), Some(&"tok".to_string()));
    }

    #[tokio::test]
    async fn test_refresh_failure_resets_state() {
        let fx = fixture(vec![
            ScriptedHttp::ok(LOGIN_OK),
            ScriptedHttp::status(401, r#"{"success":false,"message":"expired"}"#),
        ]);
        fx.cookies.insert("csrf_token", "tok").await;

        fx.manager.login(&credentials()).await.unwrap();
        let err = fx.manager.refresh_tokens().await.unwrap_err();
        assert!(matches!(err, SessionError::AuthRejected(_)));
        assert!(!fx.manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_check_session_overrides_cache() {
        let fx = fixture(vec![
            ScriptedHttp::ok(LOGIN_OK),
            ScriptedHttp::ok(r#"{"authenticated": false}"#),
        ]);

        fx.manager.login(&credentials()).await.unwrap();
        assert!(fx.manager.is_authenticated().await);

        let status = fx.manager.check_session().await.unwrap();
        assert!(!status.authenticated);
        assert!(!fx.manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_logout_wipes_and_swallows_network_failure() {
        let fx = fixture(vec![ScriptedHttp::ok(LOGIN_OK)]);
        fx.manager.login(&credentials()).await.unwrap();
        fx.durable.set("access_token", "legacy").await.unwrap();
        fx.volatile.set("vault_session_key", "k").await.unwrap();

        // No scripted response left: the logout POST fails, and is ignored.
        fx.manager.logout().await.unwrap();

        assert!(!fx.manager.is_authenticated().await);
        assert_eq!(fx.durable.get("access_token").await.unwrap(), None);
        assert!(fx.volatile.is_empty().await);
    }

    #[tokio::test]
    async fn test_expiry_margin() {
        let fx = fixture(vec![ScriptedHttp::ok(LOGIN_OK)]);
        fx.manager.login(&credentials()).await.unwrap();

        // 15 minutes before expiry: fresh.
        assert!(!fx.manager.is_access_token_expired().await);

        // Inside the 30-second margin: treated as expired.
        fx.clock.set_millis(1_700_000_900_000 - ACCESS_EXPIRY_MARGIN_MS + 1);
        assert!(fx.manager.is_access_token_expired().await);
    }

    #[tokio::test]
    async fn test_session_expired_returns_sanitized_destination() {
        let fx = fixture(vec![]);

        let destination = fx
            .manager
            .session_expired("Session expired", Some("https://evil.example/x"))
            .await
            .unwrap();
        assert!(destination.starts_with("/login?message="));
        assert!(destination.contains("returnUrl=%2Fdashboard"));
        assert!(!destination.contains("evil.example"));
    }

    #[tokio::test]
    async fn test_handle_error_ignores_unrelated_errors() {
        let fx = fixture(vec![]);
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(fx.manager.handle_error(&err, None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_handle_error_wipes_on_auth_error() {
        let fx = fixture(vec![ScriptedHttp::ok(LOGIN_OK)]);
        fx.manager.login(&credentials()).await.unwrap();

        let err = std::io::Error::new(std::io::ErrorKind::Other, "HTTP 401 Unauthorized");
        let destination = fx
            .manager
            .handle_error(&err, Some("/proposals/7"))
            .await
            .unwrap()
            .expect("auth-shaped error should trigger expiry");

        assert!(destination.contains("returnUrl=%2Fproposals%2F7"));
        assert!(!fx.manager.is_authenticated().await);
    }
}
