//! # In-Memory Bridge Adapters
//!
//! HashMap-backed implementations of the bridge traits for tests and
//! embedded/headless use. Every adapter is cheap to construct per test and
//! fully isolated from the host environment.

mod clock;
mod cookies;
mod store;

pub use clock::ManualClock;
pub use cookies::MemoryCookieStore;
pub use store::MemoryStore;
