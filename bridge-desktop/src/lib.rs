//! # Desktop Bridge Implementations
//!
//! Production implementations of the bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//!
//! - `HttpClient` using `reqwest`, sharing a cookie jar with the cookie store
//! - `CookieStore` reading the script-visible CSRF cookie from that jar
//! - `KeyValueStore` using a SQLite-backed table for the durable slot
//!
//! The volatile slot has no desktop-specific adapter; embedders use the
//! in-memory store, whose process lifetime matches the slot's contract.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{JarCookieStore, ReqwestHttpClient, SqliteKeyValueStore};
//! use reqwest::cookie::Jar;
//! use std::sync::Arc;
//! use url::Url;
//!
//! let jar = Arc::new(Jar::default());
//! let origin: Url = "https://app.example.com".parse()?;
//! let http = ReqwestHttpClient::with_cookie_jar(Arc::clone(&jar));
//! let cookies = JarCookieStore::new(jar, origin);
//! let durable = SqliteKeyValueStore::new(data_dir.join("session.db")).await?;
//! ```

mod cookies;
mod http;
mod store;

pub use cookies::JarCookieStore;
pub use http::ReqwestHttpClient;
pub use store::SqliteKeyValueStore;
