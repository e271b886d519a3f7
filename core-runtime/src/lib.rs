//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the session security core:
//! - Logging and tracing infrastructure
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the session core depends on. It
//! establishes the logging conventions and the event broadcasting mechanism
//! through which the rest of the application observes session transitions.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
