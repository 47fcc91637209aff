//! Per-queue flush scheduling.
//!
//! Each queue name owns one `Scheduler`, which moves through
//! `Idle → Armed → Draining → (Armed | Idle)`. Only the `Idle → Armed`
//! transition starts a timer, so at most one timer is outstanding per queue.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use super::dispatcher::Dispatcher;
use super::queue::{PendingRequest, QueueName, RequestQueue};

/// Scheduling state of one queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    /// No timer pending.
    #[default]
    Idle,
    /// A flush timer is pending.
    Armed,
    /// A slice is being removed and handed to the dispatcher.
    Draining,
}

/// Counters for one queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Requests accepted by `enqueue`.
    pub total_enqueued: u64,
    /// Flush timers that fired.
    pub total_flushes: u64,
    /// Non-empty slices handed to the dispatcher.
    pub total_slices: u64,
    /// Requests handed to the dispatcher.
    pub total_dispatched: u64,
    /// Requests currently waiting.
    pub queued: usize,
}

#[derive(Debug, Default)]
struct Slot {
    queue: RequestQueue,
    state: SchedulerState,
    stats: BatchStats,
}

/// Debounced flusher for one queue.
#[derive(Debug)]
pub struct Scheduler {
    name: QueueName,
    delay: Duration,
    max_batch_size: usize,
    dispatcher: Dispatcher,
    slot: Mutex<Slot>,
}

impl Scheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new(name: QueueName, delay: Duration, max_batch_size: usize, dispatcher: Dispatcher) -> Self {
        Self { name, delay, max_batch_size, dispatcher, slot: Mutex::new(Slot::default()) }
    }

    /// The queue this scheduler drains.
    #[must_use]
    pub const fn name(&self) -> QueueName {
        self.name
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.lock().state
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> BatchStats {
        let slot = self.lock();
        BatchStats { queued: slot.queue.len(), ..slot.stats.clone() }
    }

    // The lock is never held across an await, and every critical section
    // leaves the slot consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a request and arms the flush timer when idle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue(self: &Arc<Self>, pending: PendingRequest) {
        let arm = {
            let mut slot = self.lock();
            slot.queue.push(pending);
            slot.stats.total_enqueued += 1;
            if slot.state == SchedulerState::Idle {
                slot.state = SchedulerState::Armed;
                true
            } else {
                false
            }
        };

        if arm {
            self.arm_timer();
        }
    }

    fn arm_timer(self: &Arc<Self>) {
        debug!(queue = %self.name, delay_ms = self.delay.as_millis() as u64, "Arming batch timer");
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(scheduler.delay).await;
            scheduler.flush();
        });
    }

    /// Drains one slice, hands it to the dispatcher and re-arms if requests remain.
    pub(crate) fn flush(self: &Arc<Self>) {
        let slice = {
            let mut slot = self.lock();
            slot.state = SchedulerState::Draining;
            slot.stats.total_flushes += 1;
            let slice = slot.queue.take_slice(self.max_batch_size);
            if !slice.is_empty() {
                slot.stats.total_slices += 1;
                slot.stats.total_dispatched += slice.len() as u64;
            }
            slice
        };

        debug!(queue = %self.name, slice_len = slice.len(), "Flushing batch queue");

        if !slice.is_empty() {
            let dispatcher = self.dispatcher.clone();
            let name = self.name;
            tokio::spawn(async move {
                dispatcher.dispatch(name, slice).await;
            });
        }

        // Requests enqueued while draining are picked up here, never by a second timer
        let rearm = {
            let mut slot = self.lock();
            if slot.queue.is_empty() {
                slot.state = SchedulerState::Idle;
                false
            } else {
                slot.state = SchedulerState::Armed;
                true
            }
        };

        if rearm {
            self.arm_timer();
        }
    }
}
