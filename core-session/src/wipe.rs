//! Deterministic erasure of session artifacts
//!
//! One wiper covers every place credential material can end up: the encrypted
//! vault payload, legacy plain-text auth keys kept from earlier schema
//! generations, PII fields, and the whole volatile slot. Invoked from logout
//! and from the session-expired handler, so it must converge to the same
//! empty state no matter how often or in what state it runs.

use crate::config::SessionConfig;
use crate::error::Result;
use bridge_traits::storage::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Durable keys holding credential material or PII, including legacy aliases
/// still wiped for users migrating from older schema generations.
const SENSITIVE_KEYS: &[&str] = &[
    "access_token",
    "refresh_token",
    "token_expires_at",
    "refresh_expires_at",
    "auth_token",
    "session_id",
    "user_id",
    "user_email",
    "user_name",
    "remember_me",
    "logged_in",
];

/// Key prefixes treated as sensitive wholesale.
const SENSITIVE_PREFIXES: &[&str] = &["auth_", "session_", "token_"];

/// Non-sensitive preference keys the wiper must never touch, even when they
/// match a sensitive prefix.
const PRESERVED_KEYS: &[&str] = &["theme", "locale", "device_id"];

/// Idempotent eraser across the durable and volatile storage slots.
#[derive(Clone)]
pub struct SensitiveDataWiper {
    durable: Arc<dyn KeyValueStore>,
    volatile: Arc<dyn KeyValueStore>,
    vault_payload_key: String,
}

impl SensitiveDataWiper {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        volatile: Arc<dyn KeyValueStore>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            durable,
            volatile,
            vault_payload_key: config.vault_payload_key.clone(),
        }
    }

    fn is_sensitive(&self, key: &str) -> bool {
        if PRESERVED_KEYS.contains(&key) {
            return false;
        }
        key == self.vault_payload_key
            || SENSITIVE_KEYS.contains(&key)
            || SENSITIVE_PREFIXES.iter().any(|p| key.starts_with(p))
    }

    /// Remove every sensitive durable key and clear the volatile slot.
    ///
    /// Repeated calls converge to the same empty state with no errors.
    #[instrument(skip(self))]
    pub async fn wipe_all(&self) -> Result<()> {
        let mut removed = 0usize;
        for key in self.durable.keys().await? {
            if self.is_sensitive(&key) {
                self.durable.remove(&key).await?;
                removed += 1;
            }
        }
        // Volatile holds only per-tab session material; drop it wholesale.
        self.volatile.clear_all().await?;

        debug!(removed, "sensitive data wiped");
        Ok(())
    }

    /// Sensitive keys still present, for post-wipe verification.
    ///
    /// Durable keys are filtered through the sensitivity rules; every
    /// remaining volatile key counts, since the volatile slot is supposed to
    /// be empty after a wipe.
    pub async fn audit(&self) -> Result<Vec<String>> {
        let mut leftover: Vec<String> = self
            .durable
            .keys()
            .await?
            .into_iter()
            .filter(|k| self.is_sensitive(k))
            .collect();
        leftover.extend(self.volatile.keys().await?);
        leftover.sort();
        Ok(leftover)
    }
}
