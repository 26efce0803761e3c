//! Collapses overlapping requests onto one in-flight computation.
//!
//! # Design Decisions
//! - One pending slot per guard; callers arriving while it is occupied
//!   await a clone of the same shared future
//! - The slot is cleared by the computation itself when it settles, so
//!   the next caller after completion always starts fresh
//! - The slot lock is never held across an await
//! - A spawned task drives every computation to completion, so a caller
//!   that is dropped mid-flight cannot strand the slot

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::observability::metrics;

struct InFlight<T: Clone> {
    id: u64,
    future: Shared<BoxFuture<'static, T>>,
}

type Slot<T> = Arc<Mutex<Option<InFlight<T>>>>;

/// Result of [`SingleFlight::run`].
#[derive(Debug, Clone)]
pub struct Flight<T> {
    pub value: T,
    /// `true` when this caller reused a computation another caller started.
    pub joined: bool,
}

pub struct SingleFlight<T: Clone> {
    slot: Slot<T>,
    next_id: AtomicU64,
    joins: AtomicU64,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
            joins: AtomicU64::new(0),
        }
    }

    /// Await the in-flight computation, or start one with `start`.
    ///
    /// `start` is only called when nothing is in flight.
    pub async fn run<F, Fut>(&self, start: F) -> Flight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (future, joined) = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(in_flight) => (in_flight.future.clone(), true),
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let future = settle_into(Arc::clone(&self.slot), id, start());
                    *slot = Some(InFlight {
                        id,
                        future: future.clone(),
                    });
                    tokio::spawn(future.clone());
                    (future, false)
                }
            }
        };

        if joined {
            self.joins.fetch_add(1, Ordering::Relaxed);
            metrics::record_single_flight_join();
        }

        Flight {
            value: future.await,
            joined,
        }
    }

    /// Callers so far that reused an in-flight computation.
    pub fn joins(&self) -> u64 {
        self.joins.load(Ordering::Relaxed)
    }

    pub fn is_in_flight(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl<T> Default for SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap `work` so that finishing it empties the slot it was stored in.
fn settle_into<T, Fut>(slot: Slot<T>, id: u64, work: Fut) -> Shared<BoxFuture<'static, T>>
where
    T: Clone + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    async move {
        let value = work.await;
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|f| f.id == id) {
            *slot = None;
        }
        value
    }
    .boxed()
    .shared()
}
