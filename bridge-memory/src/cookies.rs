//! In-memory cookie store

use async_trait::async_trait;
use bridge_traits::cookies::CookieStore;
use bridge_traits::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// HashMap-backed [`CookieStore`] with write access for tests
///
/// Tests play the server's role by planting or deleting cookies between calls
/// into the core.
#[derive(Clone, Default)]
pub struct MemoryCookieStore {
    cookies: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant a cookie as the server would
    pub async fn insert(&self, name: &str, value: &str) {
        let mut cookies = self.cookies.lock().await;
        cookies.insert(name.to_string(), value.to_string());
    }

    /// Delete a cookie
    pub async fn delete(&self, name: &str) {
        let mut cookies = self.cookies.lock().await;
        cookies.remove(name);
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        let cookies = self.cookies.lock().await;
        Ok(cookies.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryCookieStore::new();
        store.insert("csrf_token", "abc123").await;

        assert_eq!(
            store.get("csrf_token").await.unwrap(),
            Some("abc123".to_string())
        );
        assert_eq!(store.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryCookieStore::new();
        store.insert("csrf_token", "abc123").await;
        store.delete("csrf_token").await;

        assert_eq!(store.get("csrf_token").await.unwrap(), None);
    }
}
