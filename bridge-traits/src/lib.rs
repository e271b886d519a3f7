//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host environment.
//!
//! ## Overview
//!
//! This crate defines the contract between the session security core and the
//! environment it runs in. Each trait represents a capability the core requires
//! but that differs per host (desktop shell, embedded web view, test harness).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP with ambient cookie credentials
//! - [`CookieStore`](cookies::CookieStore) - Read access to script-visible cookies
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - String-valued key-value storage.
//!   The core binds one instance to the durable, origin-shared slot and a second
//!   instance to the volatile, per-tab slot; the trait itself is slot-agnostic.
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive error when a required capability is
//! missing rather than degrading silently.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod cookies;
pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use cookies::CookieStore;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::KeyValueStore;
pub use time::{Clock, SystemClock};
