//! Cookie access over the shared reqwest jar

use async_trait::async_trait;
use bridge_traits::cookies::CookieStore;
use bridge_traits::error::{BridgeError, Result};
use reqwest::cookie::{CookieStore as ReqwestCookieStore, Jar};
use std::sync::Arc;
use url::Url;

/// Reads named cookies from the jar shared with [`crate::ReqwestHttpClient`]
///
/// Only cookies visible for the configured origin are considered. Values are
/// returned exactly as the server sent them; percent-decoding is the
/// caller's concern.
pub struct JarCookieStore {
    jar: Arc<Jar>,
    origin: Url,
}

impl JarCookieStore {
    pub fn new(jar: Arc<Jar>, origin: Url) -> Self {
        Self { jar, origin }
    }
}

#[async_trait]
impl CookieStore for JarCookieStore {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        let header = match self.jar.cookies(&self.origin) {
            Some(header) => header,
            None => return Ok(None),
        };
        let cookies = header
            .to_str()
            .map_err(|e| BridgeError::OperationFailed(format!("Cookie header not ASCII: {}", e)))?
            .to_string();

        for pair in cookies.split("; ") {
            if let Some((key, value)) = pair.split_once('=') {
                if key == name {
                    return Ok(Some(value.to_string()));
                }
            }
        }
        Ok(None)
    }
}
