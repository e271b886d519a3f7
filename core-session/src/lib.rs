//! # Session Security Core
//!
//! Client-side session security: authentication-state tracking, race-free
//! token renewal, CSRF defense for mutating requests, authenticated
//! encryption of locally cached credential material, and complete idempotent
//! erasure of session artifacts on logout or detected failure.
//!
//! ## Overview
//!
//! [`SessionManager`] is the single entry point. It orchestrates:
//!
//! - [`SessionStateCache`] - process-wide authentication status projection
//! - [`RefreshCoordinator`] - single-flight discipline around token renewal
//! - [`CsrfGuard`] - double-submit cookie/header defense on mutating calls
//! - [`EncryptedVault`] - AES-256-GCM sealing of cached credential material
//! - [`SensitiveDataWiper`] - deterministic erasure across both storage slots
//! - [`LoginThrottle`] - sliding-window feedback on repeated login attempts
//! - [`redirect`] - allow-list sanitization of return destinations
//!
//! Everything else in the application is a collaborator that calls the four
//! lifecycle operations (`login`, `refresh_tokens`, `check_session`,
//! `logout`) and reacts to the uniform
//! [`SessionExpired`](core_runtime::events::SessionEvent::SessionExpired)
//! event.
//!
//! ## Failure philosophy
//!
//! Mutating requests fail closed when the CSRF token is missing (except on
//! documented best-effort paths). Vault decryption failures collapse into
//! "no cached data" so an attacker cannot distinguish a wrong key from an
//! empty slot. The auth-error classifier deliberately over-triggers: a false
//! positive costs one extra login prompt, a false negative would leave a
//! stale session behind.

pub mod classify;
pub mod config;
pub mod csrf;
pub mod error;
pub mod manager;
pub mod redirect;
pub mod refresh;
pub mod state;
pub mod throttle;
pub mod types;
pub mod vault;
pub mod wipe;

pub use config::SessionConfig;
pub use csrf::CsrfGuard;
pub use error::{Result, SessionError};
pub use manager::SessionManager;
pub use refresh::RefreshCoordinator;
pub use state::SessionStateCache;
pub use throttle::LoginThrottle;
pub use types::{LoginCredentials, SessionStatus};
pub use vault::EncryptedVault;
pub use wipe::SensitiveDataWiper;
