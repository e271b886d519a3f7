//! # Event Bus System
//!
//! Provides an event-driven architecture for the session core using
//! `tokio::sync::broadcast`. This module enables decoupled communication
//! between the session core and the rest of the application through typed
//! events.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enums for session transitions
//! - **EventBus**: Central broadcast channel for publishing events
//! - **Subscription Management**: Multiple subscribers can listen independently
//!
//! The single most important consumer contract is [`SessionEvent::SessionExpired`]:
//! every surrounding feature reacts to that one uniform signal instead of
//! interpreting auth failures on its own.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, SessionEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! let event = CoreEvent::Session(SessionEvent::SignedIn {
//!     user_id: "user-123".to_string(),
//! });
//! event_bus.emit(event).ok();
//! ```
//!
//! ## Delivery Semantics
//!
//! - Events are delivered to every subscriber active at emit time.
//! - Slow subscribers receive `Lagged` errors but don't block fast ones.
//! - Past events are not replayed for new subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that fall behind by more than this many events receive
/// `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
///
/// This is the main event type published and received through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Session lifecycle events
    Session(SessionEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Session(SessionEvent::AuthFailure { .. }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::SessionExpired { .. }) => EventSeverity::Warning,
            CoreEvent::Session(SessionEvent::SignedIn { .. }) => EventSeverity::Info,
            CoreEvent::Session(SessionEvent::SignedOut { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

/// Events describing session lifecycle transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// User successfully authenticated.
    SignedIn {
        /// Identifier of the authenticated user.
        user_id: String,
    },
    /// User signed out (explicit logout).
    SignedOut,
    /// Token renewal started.
    TokenRefreshing,
    /// Token renewal completed successfully.
    TokenRefreshed {
        /// New access-token expiry (Unix epoch milliseconds).
        access_expires_at: i64,
    },
    /// The session was detected as expired; all local artifacts were wiped.
    ///
    /// Consumers should route the user to the login surface. The destination
    /// returned by the session manager already carries a sanitized return URL.
    SessionExpired {
        /// Human-readable reason shown on the login surface.
        reason: String,
    },
    /// Authentication error (login or renewal declined, network failure).
    AuthFailure {
        /// Human-readable error message.
        message: String,
        /// Whether the error is recoverable (e.g., retry possible).
        recoverable: bool,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::SignedIn { .. } => "User signed in successfully",
            SessionEvent::SignedOut => "User signed out",
            SessionEvent::TokenRefreshing => "Refreshing session tokens",
            SessionEvent::TokenRefreshed { .. } => "Tokens refreshed successfully",
            SessionEvent::SessionExpired { .. } => "Session expired, artifacts wiped",
            SessionEvent::AuthFailure { .. } => "Authentication error",
        }
    }
}

/// Central event bus broadcasting [`CoreEvent`]s to all subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers. Emitters that don't care whether
    /// anyone is listening should discard the result.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}
