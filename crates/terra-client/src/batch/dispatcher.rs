//! Concurrent dispatch of one batch slice.

use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use terra_abstraction::{GraphqlError, Transport};
use tracing::{debug, error};

use super::queue::{PendingRequest, QueueName};

/// Sends every request of a slice concurrently and settles each one with its own outcome.
///
/// The API has no batch endpoint, so a slice becomes N parallel calls. A failed
/// call only rejects its own request.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Dispatches a slice and settles every request in it.
    ///
    /// Each request settles as soon as its own call finishes, so a slow or
    /// hung call never holds back its siblings. Completion order inside the
    /// slice is unspecified.
    pub async fn dispatch(&self, queue: QueueName, slice: Vec<PendingRequest>) {
        if slice.is_empty() {
            return;
        }

        let expected = slice.len();
        debug!(queue = %queue, slice_len = expected, "Dispatching batch slice");

        let transport = &self.transport;
        let settled: Vec<Settled> = join_all(slice.into_iter().map(|pending| async move {
            let outcome = transport.send(pending.request()).await;
            let settled = if let Err(e) = &outcome {
                debug!(queue = %queue, error = %e, "Batched request failed");
                Settled::Rejected
            } else {
                Settled::Resolved
            };
            pending.settle(outcome);
            settled
        }))
        .await;

        if let Err(e) = check_settled(expected, &settled) {
            error!(queue = %queue, error = %e, "Batch slice settled incompletely");
            return;
        }

        let failed = settled.iter().filter(|s| **s == Settled::Rejected).count();
        debug!(queue = %queue, failed, "Batch slice settled");
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").field("endpoint", &self.transport.endpoint()).finish()
    }
}

/// How one request of a slice was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settled {
    Resolved,
    Rejected,
}

/// Verifies that every request of a slice reported a settlement.
///
/// Settlements are collected in lockstep with requests, so a mismatch means a bug.
pub(crate) fn check_settled(expected: usize, settled: &[Settled]) -> Result<(), GraphqlError> {
    if settled.len() == expected {
        Ok(())
    } else {
        Err(GraphqlError::SliceIntegrity { expected, actual: settled.len() })
    }
}
