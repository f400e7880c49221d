//! Peer session — the drain side of the call-queue contract.
//!
//! DESIGN
//! ======
//! The renderer itself is an opaque collaborator behind the [`Renderer`]
//! trait. A session executes call batches in FIFO order, skips records it
//! has already applied (the host may redeliver unacknowledged calls after a
//! reconnect), and surfaces each rejected call as a named `call_error`
//! without aborting the rest of the batch. Every drain ends with one `ack`
//! so the host can trim its queue.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::envelope::{Body, Envelope, ErrorCode};
use crate::queue::QueuedCall;

// =============================================================================
// RENDERER SEAM
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("invalid arguments for {method}: {detail}")]
    InvalidArguments { method: String, detail: String },
    #[error("{0}")]
    Failed(String),
}

impl ErrorCode for RendererError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedMethod(_) => "E_RENDERER_UNSUPPORTED",
            Self::InvalidArguments { .. } => "E_RENDERER_ARGS",
            Self::Failed(_) => "E_RENDERER",
        }
    }
}

/// The live map renderer a session executes against.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn execute(
        &mut self,
        method: &str,
        args: &[Value],
        kwargs: &BTreeMap<String, Value>,
    ) -> Result<Value, RendererError>;
}

// =============================================================================
// SESSION
// =============================================================================

/// Per-peer drain state: the highest sequence number already applied.
pub struct PeerSession {
    widget_id: Uuid,
    last_applied: u64,
}

impl PeerSession {
    #[must_use]
    pub fn new(widget_id: Uuid) -> Self {
        Self { widget_id, last_applied: 0 }
    }

    #[must_use]
    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    /// Execute one batch against the renderer and return the envelopes to
    /// send back: zero or more `call_result`/`call_error` bodies, then one
    /// `ack` covering everything seen.
    pub async fn drain<R: Renderer>(&mut self, renderer: &mut R, calls: &[QueuedCall]) -> Vec<Envelope> {
        let mut replies = Vec::new();
        let mut highest = self.last_applied;

        for call in calls {
            if call.seq <= self.last_applied {
                debug!(widget_id = %self.widget_id, seq = call.seq, "skipping already applied call");
                highest = highest.max(call.seq);
                continue;
            }

            match renderer.execute(&call.method, &call.args, &call.kwargs).await {
                Ok(value) => {
                    if let Some(result_id) = call.result_id {
                        replies.push(
                            Envelope::new(Body::CallResult { seq: call.seq, value })
                                .with_widget_id(self.widget_id)
                                .with_parent_id(result_id),
                        );
                    }
                }
                Err(e) => {
                    // Surface the failure and keep draining the batch.
                    replies.push(
                        Envelope::new(Body::CallError {
                            seq: call.seq,
                            code: e.error_code().to_string(),
                            message: e.to_string(),
                            retryable: e.retryable(),
                        })
                        .with_widget_id(self.widget_id),
                    );
                }
            }

            // Applied or rejected, the call has been consumed.
            self.last_applied = call.seq;
            highest = highest.max(call.seq);
        }

        if highest > 0 {
            replies.push(Envelope::new(Body::Ack { seq: highest }).with_widget_id(self.widget_id));
        }
        replies
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "peer_test.rs"]
mod tests;
