//! Process-wide session state cache

use crate::types::SessionStatus;
use tokio::sync::RwLock;

/// In-memory projection of the authentication status.
///
/// Single-writer contract: only the four lifecycle operations on
/// `SessionManager` (login, refresh, check_session, logout) write here, which
/// is why the mutating methods are `pub(crate)`. Everything else reads through
/// [`status`](Self::status). The cache is optimistic; `check_session` is the
/// authoritative source and always overrides it.
#[derive(Debug, Default)]
pub struct SessionStateCache {
    status: RwLock<SessionStatus>,
}

impl SessionStateCache {
    /// Create a cache in the unauthenticated baseline state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current status.
    pub async fn status(&self) -> SessionStatus {
        self.status.read().await.clone()
    }

    /// Whether the cached projection says we are authenticated.
    pub async fn is_authenticated(&self) -> bool {
        self.status.read().await.authenticated
    }

    /// Overwrite the status wholesale.
    pub(crate) async fn set(&self, status: SessionStatus) {
        *self.status.write().await = status;
    }

    /// Return to the unauthenticated baseline.
    pub(crate) async fn reset(&self) {
        *self.status.write().await = SessionStatus::signed_out();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starts_unauthenticated() {
        let cache = SessionStateCache::new();
        assert!(!cache.is_authenticated().await);
        assert_eq!(cache.status().await, SessionStatus::signed_out());
    }

    #[tokio::test]
    async fn test_set_and_reset() {
        let cache = SessionStateCache::new();
        cache
            .set(SessionStatus {
                authenticated: true,
                user_id: Some("u-1".to_string()),
                access_expires_at: Some(1_000),
                refresh_expires_at: Some(2_000),
            })
            .await;
        assert!(cache.is_authenticated().await);

        cache.reset().await;
        assert_eq!(cache.status().await, SessionStatus::signed_out());
    }
}
