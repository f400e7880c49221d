//! Call queue — ordered deferred method invocations for the renderer.
//!
//! DESIGN
//! ======
//! Every imperative action that cannot be expressed as a property
//! assignment (pan, fly-to, add layer, add control) becomes a call record.
//! Records carry a monotonically increasing sequence number; the peer
//! tracks the last applied sequence so a redelivered batch is never
//! re-executed, and acknowledgments trim the host-side queue. Each enqueue
//! yields only the newly appended record for transmission — the
//! accumulated history is never retransmitted.
//!
//! TRADE-OFFS
//! ==========
//! The queue is bounded. With `RejectNew` the overflowing caller gets the
//! error; with `DropOldest` the oldest unacknowledged call is discarded and
//! counted, visible via [`CallQueue::dropped`].

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::envelope::ErrorCode;

pub const DEFAULT_CAPACITY: usize = 1024;

// =============================================================================
// TYPES
// =============================================================================

/// One deferred method invocation, JSON-compatible end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedCall {
    pub seq: u64,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kwargs: BTreeMap<String, Value>,
    /// Set when the host expects a `call_result` back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<Uuid>,
}

/// What to do when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Fail the enqueue; the caller sees the error.
    #[default]
    RejectNew,
    /// Discard the oldest unacknowledged call and count the drop.
    DropOldest,
}

#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub capacity: usize,
    pub policy: OverflowPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY, policy: OverflowPolicy::default() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("call queue full ({capacity} unacknowledged calls); peer not draining")]
    Overflow { capacity: usize },
}

impl ErrorCode for QueueError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Overflow { .. } => "E_QUEUE_FULL",
        }
    }

    fn retryable(&self) -> bool {
        // Space frees up once the peer acknowledges.
        true
    }
}

// =============================================================================
// QUEUE
// =============================================================================

/// Host-side bounded queue of unacknowledged calls.
pub struct CallQueue {
    pending: VecDeque<QueuedCall>,
    next_seq: u64,
    acked: u64,
    dropped: u64,
    config: QueueConfig,
}

impl CallQueue {
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        Self { pending: VecDeque::new(), next_seq: 1, acked: 0, dropped: 0, config }
    }

    /// Append a call record and return a copy of it for transmission.
    ///
    /// # Errors
    ///
    /// Fails with [`QueueError::Overflow`] when the queue is full and the
    /// policy is `RejectNew`.
    pub fn enqueue(
        &mut self,
        method: impl Into<String>,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
        result_id: Option<Uuid>,
    ) -> Result<QueuedCall, QueueError> {
        if self.pending.len() >= self.config.capacity {
            match self.config.policy {
                OverflowPolicy::RejectNew => {
                    return Err(QueueError::Overflow { capacity: self.config.capacity });
                }
                OverflowPolicy::DropOldest => {
                    if let Some(dropped) = self.pending.pop_front() {
                        self.dropped += 1;
                        warn!(
                            seq = dropped.seq,
                            method = %dropped.method,
                            total_dropped = self.dropped,
                            "call queue full; dropped oldest unacknowledged call"
                        );
                    }
                }
            }
        }

        let call = QueuedCall { seq: self.next_seq, method: method.into(), args, kwargs, result_id };
        self.next_seq += 1;
        self.pending.push_back(call.clone());
        Ok(call)
    }

    /// Trim every pending call with `seq <= acked_seq`. Stale or repeated
    /// acks are ignored. Returns the number of trimmed records.
    pub fn ack(&mut self, acked_seq: u64) -> usize {
        let before = self.pending.len();
        while self.pending.front().is_some_and(|call| call.seq <= acked_seq) {
            self.pending.pop_front();
        }
        self.acked = self.acked.max(acked_seq);
        before - self.pending.len()
    }

    /// Unacknowledged calls in FIFO order, for redelivery to a
    /// (re)connecting peer.
    #[must_use]
    pub fn pending(&self) -> Vec<QueuedCall> {
        self.pending.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Highest sequence number the peer has confirmed.
    #[must_use]
    pub fn acked(&self) -> u64 {
        self.acked
    }

    /// Calls discarded under the `DropOldest` policy.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for CallQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
