//! Single-flight coordination for token renewal
//!
//! Collapses concurrent renewal attempts into one underlying network call.
//! The first caller becomes the leader and drives the executor; callers
//! arriving before settlement subscribe to the same outcome over a broadcast
//! channel. On settlement the in-flight slot clears, so a later call starts a
//! fresh flight. A failed executor settles every waiter with a cloned error
//! and does not poison subsequent flights.
//!
//! The coordinator also carries a generation counter. Logout bumps it via
//! [`invalidate`](RefreshCoordinator::invalidate); a flight that settles with
//! a generation older than the current one must be discarded by the caller,
//! which is how a renewal resolving after logout is prevented from
//! resurrecting session state.

use crate::error::{Result, SessionError};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

/// Outcome of one coordinated flight, as observed by one caller.
#[derive(Debug, Clone)]
pub struct FlightOutcome<T> {
    /// Generation the flight started under.
    pub generation: u64,
    /// The shared settlement.
    pub outcome: Result<T>,
    /// Whether this caller drove the executor (leader) or joined a flight
    /// already underway.
    pub led: bool,
}

/// Single-flight coordinator holding at most one outstanding operation.
pub struct RefreshCoordinator<T: Clone + Send + 'static> {
    inflight: Mutex<Option<broadcast::Sender<(u64, Result<T>)>>>,
    generation: AtomicU64,
}

impl<T: Clone + Send + 'static> RefreshCoordinator<T> {
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Bump the generation so in-flight settlements become stale.
    ///
    /// Called on logout. The flight itself still runs to completion (no
    /// cancellation); only its outcome is discarded.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether a settlement from `generation` is still current.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation()
    }

    /// Run `executor` with single-flight semantics.
    ///
    /// For N concurrent calls while no flight is outstanding, the executor
    /// runs exactly once and all N callers observe an equivalent outcome. The
    /// executor future is dropped unpolled when the caller joins an existing
    /// flight.
    pub async fn run<Fut>(&self, executor: Fut) -> FlightOutcome<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        // Join an existing flight if one is underway, otherwise claim the slot.
        let join_rx = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(tx) => Some(tx.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    *slot = Some(tx);
                    None
                }
            }
        };

        if let Some(mut rx) = join_rx {
            debug!("joining in-flight renewal");
            return match rx.recv().await {
                Ok((generation, outcome)) => FlightOutcome {
                    generation,
                    outcome,
                    led: false,
                },
                // Leader dropped without settling; surface as a network-class
                // failure rather than hanging or re-running the executor.
                Err(_) => FlightOutcome {
                    generation: self.generation(),
                    outcome: Err(SessionError::Network(
                        "renewal abandoned before settling".to_string(),
                    )),
                    led: false,
                },
            };
        }

        let generation = self.generation();
        let outcome = executor.await;

        // Settle: clear the slot and fan out while holding the lock, so a
        // late arrival either subscribed before this send or finds the slot
        // empty and starts a fresh flight.
        {
            let mut slot = self.inflight.lock().await;
            if let Some(tx) = slot.take() {
                let _ = tx.send((generation, outcome.clone()));
            }
        }

        FlightOutcome {
            generation,
            outcome,
            led: true,
        }
    }
}

impl<T: Clone + Send + 'static> Default for RefreshCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}
