//! Queue names, pending requests and the FIFO queue that holds them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};
use terra_abstraction::{GraphqlError, GraphqlRequest};
use tokio::sync::oneshot;

/// Latency tier a request is queued under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueName {
    /// Short flush delay, for data needed to render at all.
    Critical,
    /// Longer flush delay, trading latency for larger batches.
    #[default]
    General,
}

impl QueueName {
    /// Both queues, critical first.
    pub const ALL: [Self; 2] = [Self::Critical, Self::General];

    /// Returns the queue name as used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::General => "general",
        }
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueName {
    type Err = GraphqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "general" => Ok(Self::General),
            other => Err(GraphqlError::Config(format!("Unknown queue: {}", other))),
        }
    }
}

/// Outcome delivered to the caller of a batched request.
pub type Outcome = Result<Value, GraphqlError>;

/// A request waiting in a queue, together with the channel that settles it.
#[derive(Debug)]
pub struct PendingRequest {
    request: GraphqlRequest,
    responder: oneshot::Sender<Outcome>,
}

impl PendingRequest {
    /// Creates a pending request and the future its caller awaits.
    pub fn new(request: GraphqlRequest) -> (Self, ResponseFuture) {
        let (responder, receiver) = oneshot::channel();
        (Self { request, responder }, ResponseFuture { receiver })
    }

    /// The operation to send.
    #[must_use]
    pub const fn request(&self) -> &GraphqlRequest {
        &self.request
    }

    /// Settles the request. Consuming `self` makes a second settlement impossible.
    ///
    /// A caller that dropped its future is not an error.
    pub fn settle(self, outcome: Outcome) {
        let _ = self.responder.send(outcome);
    }
}

/// Future returned by `BatchClient::enqueue`; resolves once the request settles.
///
/// Dropping it does not withdraw the request.
#[derive(Debug)]
#[must_use = "the request is sent regardless, but its outcome is lost if the future is dropped"]
pub struct ResponseFuture {
    receiver: oneshot::Receiver<Outcome>,
}

impl Future for ResponseFuture {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(GraphqlError::Dropped)))
    }
}

/// FIFO of pending requests for one queue name.
#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: VecDeque<PendingRequest>,
}

impl RequestQueue {
    /// Appends a request at the tail.
    pub fn push(&mut self, request: PendingRequest) {
        self.pending.push_back(request);
    }

    /// Removes up to `max` requests from the head, oldest first.
    pub fn take_slice(&mut self, max: usize) -> Vec<PendingRequest> {
        let count = max.min(self.pending.len());
        self.pending.drain(..count).collect()
    }

    /// Number of queued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
