//! Widget bridge — one widget instance's half of the host↔renderer pact.
//!
//! ARCHITECTURE
//! ============
//! The bridge composes the state store, the call queue, and the readiness
//! gate for a single widget. Host-side actions (property sets, method
//! calls) append envelopes to an outbox; inbound peer envelopes mutate the
//! same state. The caller — a widget flavor in-process, or the websocket
//! relay — drains the outbox and owns transmission, mirroring how handler
//! outcomes never send anything themselves.
//!
//! CONCURRENCY
//! ===========
//! Single-threaded by contract: all mutation happens synchronously inside
//! one message-handling turn. The serving layer serializes turns behind a
//! lock; the bridge itself takes `&mut self` and never blocks.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::envelope::{Body, Envelope, ErrorCode};
use crate::property::PropertySpec;
use crate::queue::{CallQueue, QueueConfig, QueueError};
use crate::readiness::{ReadinessGate, StagedCall};
use crate::store::{Observer, StateStore, StoreError};
use crate::widgets::Engine;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("unsupported message: {detail}")]
    UnsupportedMessage { detail: String },
    #[error("malformed envelope: {detail}")]
    MalformedEnvelope { detail: String },
}

impl ErrorCode for BridgeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.error_code(),
            Self::Queue(e) => e.error_code(),
            Self::UnsupportedMessage { .. } => "E_UNSUPPORTED",
            Self::MalformedEnvelope { .. } => "E_MALFORMED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            Self::Queue(e) => e.retryable(),
            Self::UnsupportedMessage { .. } | Self::MalformedEnvelope { .. } => false,
        }
    }
}

/// A renderer-side call failure reported back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFailure {
    pub seq: u64,
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

// =============================================================================
// BRIDGE
// =============================================================================

pub struct WidgetBridge {
    id: Uuid,
    engine: Engine,
    store: StateStore,
    queue: CallQueue,
    gate: ReadinessGate,
    outbox: Vec<Envelope>,
    results: BTreeMap<u64, Value>,
    failures: Vec<CallFailure>,
}

impl WidgetBridge {
    #[must_use]
    pub fn new(engine: Engine, schema: Vec<PropertySpec>, queue_config: QueueConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine,
            store: StateStore::from_schema(schema),
            queue: CallQueue::new(queue_config),
            gate: ReadinessGate::new(),
            outbox: Vec::new(),
            results: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn engine(&self) -> Engine {
        self.engine
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    // -------------------------------------------------------------------------
    // Host-side state
    // -------------------------------------------------------------------------

    /// Last known value of a property (may be stale relative to the live
    /// renderer).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.store.get(name)
    }

    /// Assign a property. Queues exactly one outbound `state` envelope.
    ///
    /// # Errors
    ///
    /// Propagates store validation failures; nothing is queued on rejection.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), BridgeError> {
        let body = self.store.set(name, value)?;
        self.push(body);
        Ok(())
    }

    /// Current value of every property.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(&'static str, Value)> {
        self.store.snapshot()
    }

    /// Watch one property for accepted changes from either side.
    pub fn observe(&mut self, name: impl Into<String>, observer: Observer) {
        self.store.observe(name, observer);
    }

    // -------------------------------------------------------------------------
    // Host-side calls
    // -------------------------------------------------------------------------

    /// Enqueue a call and queue an incremental one-record batch.
    ///
    /// # Errors
    ///
    /// Fails on queue overflow under the `RejectNew` policy.
    pub fn call(
        &mut self,
        method: impl Into<String>,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
    ) -> Result<u64, BridgeError> {
        let call = self.queue.enqueue(method, args, kwargs, None)?;
        let seq = call.seq;
        self.push(Body::Calls { calls: vec![call] });
        Ok(seq)
    }

    /// Like [`call`](Self::call), but tagged with a result id the peer will
    /// echo back in a `call_result` envelope.
    ///
    /// # Errors
    ///
    /// Fails on queue overflow under the `RejectNew` policy.
    pub fn call_with_result(
        &mut self,
        method: impl Into<String>,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
    ) -> Result<(u64, Uuid), BridgeError> {
        let result_id = Uuid::new_v4();
        let call = self.queue.enqueue(method, args, kwargs, Some(result_id))?;
        let seq = call.seq;
        self.push(Body::Calls { calls: vec![call] });
        Ok((seq, result_id))
    }

    /// Enqueue immediately when the renderer is ready, otherwise stage for
    /// the readiness flush. Used for draw controls, draw modes, and legends.
    ///
    /// # Errors
    ///
    /// Fails on queue overflow when enqueueing directly; staging never fails.
    pub fn call_when_ready(
        &mut self,
        method: impl Into<String>,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
    ) -> Result<(), BridgeError> {
        if self.gate.is_ready() {
            self.call(method, args, kwargs)?;
        } else {
            self.gate.stage(StagedCall { method: method.into(), args, kwargs, result_id: None });
        }
        Ok(())
    }

    /// Take the result of an acknowledged call, if the peer has sent one.
    pub fn take_result(&mut self, seq: u64) -> Option<Value> {
        self.results.remove(&seq)
    }

    /// Drain renderer-side call failures accumulated since the last check.
    pub fn take_failures(&mut self) -> Vec<CallFailure> {
        std::mem::take(&mut self.failures)
    }

    // -------------------------------------------------------------------------
    // Inbound
    // -------------------------------------------------------------------------

    /// Parse and apply one inbound peer message.
    ///
    /// # Errors
    ///
    /// `MalformedEnvelope` when the text is not JSON, `UnsupportedMessage`
    /// when it is JSON but not a known envelope shape; both are surfaced to
    /// the caller instead of being logged and swallowed.
    pub fn handle_inbound_text(&mut self, text: &str) -> Result<(), BridgeError> {
        match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) => self.handle_inbound(envelope),
            Err(e) => {
                if serde_json::from_str::<Value>(text).is_ok() {
                    Err(BridgeError::UnsupportedMessage { detail: e.to_string() })
                } else {
                    Err(BridgeError::MalformedEnvelope { detail: e.to_string() })
                }
            }
        }
    }

    /// Apply one inbound peer envelope.
    ///
    /// # Errors
    ///
    /// Store validation failures for peer property updates, queue overflow
    /// for a readiness flush that exceeds capacity.
    pub fn handle_inbound(&mut self, envelope: Envelope) -> Result<(), BridgeError> {
        match envelope.body {
            Body::State { name, value } => {
                self.store.apply_peer(&name, value)?;
                Ok(())
            }
            Body::Ready => self.on_ready(),
            Body::Ack { seq } => {
                let trimmed = self.queue.ack(seq);
                debug!(widget_id = %self.id, seq, trimmed, "peer acknowledged calls");
                Ok(())
            }
            Body::CallResult { seq, value } => {
                self.results.insert(seq, value);
                Ok(())
            }
            Body::CallError { seq, code, message, retryable } => {
                warn!(widget_id = %self.id, seq, %code, %message, "renderer rejected call");
                self.failures.push(CallFailure { seq, code, message, retryable });
                Ok(())
            }
            Body::Error { code, message, .. } => {
                // Peer-reported message-level failure; keep it visible.
                warn!(widget_id = %self.id, %code, %message, "peer reported error");
                Ok(())
            }
            Body::Calls { .. } => Err(BridgeError::UnsupportedMessage {
                detail: "call batches flow host to peer only".to_string(),
            }),
        }
    }

    fn on_ready(&mut self) -> Result<(), BridgeError> {
        let staged = self.gate.mark_ready();
        if staged.is_empty() {
            debug!(widget_id = %self.id, engine = %self.engine, "renderer ready");
        } else {
            debug!(
                widget_id = %self.id,
                engine = %self.engine,
                staged = staged.len(),
                "renderer ready; flushing staged calls"
            );
        }

        // Reflect readiness into the store when the schema declares it.
        if self.store.get("loaded").is_some() {
            self.store.apply_peer("loaded", Value::Bool(true))?;
        }

        // Enqueue one staged call at a time so an overflow mid-flush still
        // delivers the records that made it into the queue.
        let total = staged.len();
        let mut flushed = Vec::with_capacity(total);
        for call in staged {
            match self.queue.enqueue(call.method, call.args, call.kwargs, call.result_id) {
                Ok(record) => flushed.push(record),
                Err(e) => {
                    warn!(
                        widget_id = %self.id,
                        flushed = flushed.len(),
                        lost = total - flushed.len(),
                        "queue overflow during readiness flush"
                    );
                    if !flushed.is_empty() {
                        self.push(Body::Calls { calls: flushed });
                    }
                    return Err(e.into());
                }
            }
        }
        if !flushed.is_empty() {
            self.push(Body::Calls { calls: flushed });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Outbox
    // -------------------------------------------------------------------------

    fn push(&mut self, body: Body) {
        self.outbox.push(Envelope::new(body).with_widget_id(self.id));
    }

    /// Take every queued outbound envelope, oldest first.
    pub fn drain_outbox(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.outbox)
    }

    /// Everything a newly attached peer needs: the full property snapshot
    /// followed by all unacknowledged calls. Redelivered calls keep their
    /// original sequence numbers, so a peer that already applied them skips
    /// them.
    #[must_use]
    pub fn attach_snapshot(&self) -> Vec<Envelope> {
        let mut envelopes: Vec<Envelope> = self
            .store
            .snapshot()
            .into_iter()
            .map(|(name, value)| Envelope::state(name, value).with_widget_id(self.id))
            .collect();
        let pending = self.queue.pending();
        if !pending.is_empty() {
            envelopes.push(Envelope::calls(pending).with_widget_id(self.id));
        }
        envelopes
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn queue_dropped(&self) -> u64 {
        self.queue.dropped()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "bridge_test.rs"]
mod tests;
