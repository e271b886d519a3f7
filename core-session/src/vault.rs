//! Encrypted credential vault
//!
//! Seals cached credential material under AES-256-GCM with a per-session
//! symmetric key. The key lives only in the volatile slot (one tab/process
//! lifetime) while the sealed payload lives in the durable slot, so losing
//! the key intentionally orphans the payload. The vault is a secondary
//! fallback; the primary session transport is the protected cookie.
//!
//! Decryption failure of any kind — missing key, tampered ciphertext,
//! malformed payload, unknown schema version — wipes the slots and reads as
//! "no data". Callers cannot distinguish a wrong key from an empty vault.

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::types::{EncryptedPayload, PAYLOAD_VERSION};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use bridge_traits::storage::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// GCM nonce length in bytes.
const IV_LEN: usize = 12;

/// Per-session AES-256 key, exported as hex for the volatile slot.
#[derive(Clone)]
pub struct SessionKey {
    key_bytes: Vec<u8>,
}

impl SessionKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        Self {
            key_bytes: key.to_vec(),
        }
    }

    /// Serialize to hex for storage.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.key_bytes)
    }

    /// Deserialize from hex; fails on bad hex or wrong length.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| SessionError::Storage(format!("invalid hex key: {}", e)))?;
        if bytes.len() != 32 {
            return Err(SessionError::Storage(
                "invalid key length, expected 32 bytes for AES-256".to_string(),
            ));
        }
        Ok(Self { key_bytes: bytes })
    }

    fn cipher(&self) -> Aes256Gcm {
        let key = aes_gcm::Key::<Aes256Gcm>::from_slice(&self.key_bytes);
        Aes256Gcm::new(key)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("key_bytes", &"[REDACTED]")
            .finish()
    }
}

/// AES-256-GCM vault over the durable/volatile storage pair.
pub struct EncryptedVault {
    durable: Arc<dyn KeyValueStore>,
    volatile: Arc<dyn KeyValueStore>,
    payload_key: String,
    key_slot: String,
}

impl EncryptedVault {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        volatile: Arc<dyn KeyValueStore>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            durable,
            volatile,
            payload_key: config.vault_payload_key.clone(),
            key_slot: config.session_key_slot.clone(),
        }
    }

    /// Seal `record` and persist it, replacing any previous payload.
    ///
    /// The session key is created lazily on first store. Every call uses a
    /// fresh random IV.
    pub async fn store<T: Serialize>(&self, record: &T) -> Result<()> {
        let key = self.ensure_key().await?;

        let plaintext = serde_json::to_vec(record)
            .map_err(|e| SessionError::Storage(format!("vault serialization failed: {}", e)))?;

        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        let ciphertext = key
            .cipher()
            .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
            .map_err(|_| SessionError::Storage("vault encryption failed".to_string()))?;

        let payload = EncryptedPayload {
            version: PAYLOAD_VERSION,
            iv: iv.to_vec(),
            ciphertext,
        };
        let json = serde_json::to_string(&payload)
            .map_err(|e| SessionError::Storage(format!("vault serialization failed: {}", e)))?;
        self.durable.set(&self.payload_key, &json).await?;
        Ok(())
    }

    /// Unseal the stored payload, or `None` when nothing readable exists.
    ///
    /// Missing key, missing payload, parse failure, version mismatch, and tag
    /// mismatch all converge on `Ok(None)`; the unreadable slots are wiped on
    /// the way out. Only genuine storage-layer failures surface as errors.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let key = match self.volatile.get(&self.key_slot).await? {
            Some(hex_key) => match SessionKey::from_hex(&hex_key) {
                Ok(key) => key,
                Err(_) => {
                    self.wipe_slots().await;
                    return Ok(None);
                }
            },
            None => {
                // Key gone (tab closed); any leftover payload is orphaned.
                self.wipe_slots().await;
                return Ok(None);
            }
        };

        let json = match self.durable.get(&self.payload_key).await? {
            Some(json) => json,
            None => return Ok(None),
        };

        match self.unseal(&key, &json) {
            Some(record) => Ok(Some(record)),
            None => {
                debug!("vault payload unreadable, treating as absent");
                self.wipe_slots().await;
                Ok(None)
            }
        }
    }

    /// Remove both the payload and the session key.
    pub async fn clear(&self) -> Result<()> {
        self.durable.remove(&self.payload_key).await?;
        self.volatile.remove(&self.key_slot).await?;
        Ok(())
    }

    fn unseal<T: DeserializeOwned>(&self, key: &SessionKey, json: &str) -> Option<T> {
        let payload: EncryptedPayload = serde_json::from_str(json).ok()?;
        if payload.version != PAYLOAD_VERSION || payload.iv.len() != IV_LEN {
            return None;
        }
        // GCM verifies the 128-bit tag here; any mismatch fails wholesale.
        let plaintext = key
            .cipher()
            .decrypt(Nonce::from_slice(&payload.iv), payload.ciphertext.as_slice())
            .ok()?;
        serde_json::from_slice(&plaintext).ok()
    }

    async fn ensure_key(&self) -> Result<SessionKey> {
        if let Some(hex_key) = self.volatile.get(&self.key_slot).await? {
            if let Ok(key) = SessionKey::from_hex(&hex_key) {
                return Ok(key);
            }
            warn!("session key slot unreadable, regenerating");
        }
        let key = SessionKey::generate();
        self.volatile.set(&self.key_slot, &key.to_hex()).await?;
        Ok(key)
    }

    async fn wipe_slots(&self) {
        if let Err(e) = self.clear().await {
            warn!(error = %e, "failed to wipe vault slots");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_memory::MemoryStore;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::BridgeError;
    use mockall::mock;
    use serde::Deserialize;

    mock! {
        Store {}

        #[async_trait::async_trait]
        impl KeyValueStore for Store {
            async fn set(&self, key: &str, value: &str) -> BridgeResult<()>;
            async fn get(&self, key: &str) -> BridgeResult<Option<String>>;
            async fn remove(&self, key: &str) -> BridgeResult<()>;
            async fn keys(&self) -> BridgeResult<Vec<String>>;
            async fn clear_all(&self) -> BridgeResult<()>;
        }
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
    struct CachedProfile {
        user_id: String,
        email: String,
    }

    fn sample() -> CachedProfile {
        CachedProfile {
            user_id: "u-42".to_string(),
            email: "a@b.test".to_string(),
        }
    }

    fn vault_over(durable: MemoryStore, volatile: MemoryStore) -> EncryptedVault {
        EncryptedVault::new(
            Arc::new(durable),
            Arc::new(volatile),
            &SessionConfig::default(),
        )
    }

    #[test]
    fn test_key_hex_roundtrip() {
        let key = SessionKey::generate();
        let back = SessionKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(back.key_bytes, key.key_bytes);
    }

    #[test]
    fn test_key_rejects_wrong_length() {
        assert!(SessionKey::from_hex("deadbeef").is_err());
        assert!(SessionKey::from_hex("not hex at all").is_err());
    }

    #[test]
    fn test_key_debug_redacted() {
        let key = SessionKey::generate();
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&key.to_hex()));
    }

    #[tokio::test]
    async fn test_store_load_roundtrip() {
        let vault = vault_over(MemoryStore::new(), MemoryStore::new());

        vault.store(&sample()).await.unwrap();
        let loaded: Option<CachedProfile> = vault.load().await.unwrap();
        assert_eq!(loaded, Some(sample()));
    }

    #[tokio::test]
    async fn test_fresh_iv_per_store() {
        let durable = MemoryStore::new();
        let vault = vault_over(durable.clone(), MemoryStore::new());

        vault.store(&sample()).await.unwrap();
        let first = durable.get("vault_payload").await.unwrap().unwrap();
        vault.store(&sample()).await.unwrap();
        let second = durable.get("vault_payload").await.unwrap().unwrap();

        let first: EncryptedPayload = serde_json::from_str(&first).unwrap();
        let second: EncryptedPayload = serde_json::from_str(&second).unwrap();
        assert_ne!(first.iv, second.iv);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[tokio::test]
    async fn test_load_without_key_wipes_and_returns_none() {
        let durable = MemoryStore::new();
        let volatile = MemoryStore::new();
        let vault = vault_over(durable.clone(), volatile.clone());

        vault.store(&sample()).await.unwrap();
        volatile.remove("vault_session_key").await.unwrap();

        let loaded: Option<CachedProfile> = vault.load().await.unwrap();
        assert_eq!(loaded, None);
        // Orphaned payload is gone too.
        assert_eq!(durable.get("vault_payload").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tampered_ciphertext_reads_as_absent() {
        let durable = MemoryStore::new();
        let vault = vault_over(durable.clone(), MemoryStore::new());

        vault.store(&sample()).await.unwrap();
        let json = durable.get("vault_payload").await.unwrap().unwrap();
        let mut payload: EncryptedPayload = serde_json::from_str(&json).unwrap();
        payload.ciphertext[0] ^= 0x01;
        durable
            .set("vault_payload", &serde_json::to_string(&payload).unwrap())
            .await
            .unwrap();

        let loaded: Option<CachedProfile> = vault.load().await.unwrap();
        assert_eq!(loaded, None);
        assert_eq!(durable.get("vault_payload").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_version_reads_as_absent() {
        let durable = MemoryStore::new();
        let vault = vault_over(durable.clone(), MemoryStore::new());

        vault.store(&sample()).await.unwrap();
        let json = durable.get("vault_payload").await.unwrap().unwrap();
        let mut payload: EncryptedPayload = serde_json::from_str(&json).unwrap();
        payload.version = PAYLOAD_VERSION + 1;
        durable
            .set("vault_payload", &serde_json::to_string(&payload).unwrap())
            .await
            .unwrap();

        let loaded: Option<CachedProfile> = vault.load().await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_malformed_payload_reads_as_absent() {
        let durable = MemoryStore::new();
        let vault = vault_over(durable.clone(), MemoryStore::new());

        // Establish a key, then corrupt the payload wholesale.
        vault.store(&sample()).await.unwrap();
        durable.set("vault_payload", "not json").await.unwrap();

        let loaded: Option<CachedProfile> = vault.load().await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_wrong_key_indistinguishable_from_empty() {
        let durable = MemoryStore::new();
        let volatile = MemoryStore::new();
        let vault = vault_over(durable.clone(), volatile.clone());

        vault.store(&sample()).await.unwrap();
        volatile
            .set("vault_session_key", &SessionKey::generate().to_hex())
            .await
            .unwrap();
        let wrong_key: Option<CachedProfile> = vault.load().await.unwrap();

        let empty_vault = vault_over(MemoryStore::new(), MemoryStore::new());
        let empty: Option<CachedProfile> = empty_vault.load().await.unwrap();

        assert_eq!(wrong_key, empty);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_as_error() {
        // Unlike crypto failure, a broken storage layer is a real error.
        let mut volatile = MockStore::new();
        volatile
            .expect_get()
            .returning(|_| Err(BridgeError::OperationFailed("db locked".to_string())));
        let vault = EncryptedVault::new(
            Arc::new(MemoryStore::new()),
            Arc::new(volatile),
            &SessionConfig::default(),
        );

        let result: Result<Option<CachedProfile>> = vault.load().await;
        assert!(matches!(result, Err(SessionError::Storage(_))));
    }

    #[tokio::test]
    async fn test_clear_removes_both_slots() {
        let durable = MemoryStore::new();
        let volatile = MemoryStore::new();
        let vault = vault_over(durable.clone(), volatile.clone());

        vault.store(&sample()).await.unwrap();
        vault.clear().await.unwrap();

        assert_eq!(durable.get("vault_payload").await.unwrap(), None);
        assert_eq!(volatile.get("vault_session_key").await.unwrap(), None);
    }
}
