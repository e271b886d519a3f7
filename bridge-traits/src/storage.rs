//! Storage Abstractions
//!
//! Provides the platform-agnostic key-value storage trait the session core
//! uses for both of its storage slots.

use async_trait::async_trait;

use crate::error::Result;

/// String-valued key-value storage trait
///
/// Abstracts the two storage surfaces the session core writes to:
///
/// - **Durable slot**: shared across every tab of the same origin and survives
///   restarts (browser `localStorage`, a settings file on desktop). Holds the
///   encrypted vault payload, legacy plain keys kept for migration wiping, and
///   non-sensitive preferences.
/// - **Volatile slot**: scoped to one tab/process lifetime (`sessionStorage`,
///   process memory on desktop). Holds only the exported session key; its loss
///   intentionally orphans the vault payload.
///
/// The trait is slot-agnostic; the core is constructed with one instance per
/// slot.
///
/// # Security Requirements
///
/// Implementations MUST:
/// - Never log stored values
/// - Make `remove` and `clear_all` unconditional (no soft delete)
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn remember(store: &dyn KeyValueStore) -> Result<()> {
///     store.set("theme", "dark").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store a value, overwriting any previous value for the key
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove a key
    ///
    /// Succeeds even if the key doesn't exist.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Check if a key exists without retrieving it
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// List all keys (without values)
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove every key
    async fn clear_all(&self) -> Result<()>;
}
