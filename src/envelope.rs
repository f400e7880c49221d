//! Envelope — the universal message type between a widget host and its
//! paired renderer.
//!
//! ARCHITECTURE
//! ============
//! Every communication between the host process and the front-end renderer
//! is an Envelope. The host sends property updates and incremental call
//! batches; the renderer sends property updates, readiness, acknowledgments,
//! call results, and call errors. Responses correlate to requests via
//! `parent_id`.
//!
//! DESIGN
//! ======
//! - The body is internally tagged (`type`), so the wire shape is
//!   `{"type": "state", ...payload}` — one flat object per message.
//! - Batches are incremental: a `calls` body carries only newly appended
//!   records, never the accumulated history.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::queue::QueuedCall;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error bodies.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// Payload of an envelope, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Body {
    /// One synchronized property changed. Flows in both directions.
    State { name: String, value: serde_json::Value },
    /// Newly appended call records (host → peer).
    Calls { calls: Vec<QueuedCall> },
    /// The renderer finished initializing (peer → host).
    Ready,
    /// The peer has applied every call up to and including `seq`.
    Ack { seq: u64 },
    /// Result of a call that carried a result id (peer → host).
    CallResult { seq: u64, value: serde_json::Value },
    /// A call the renderer rejected. The rest of the batch still ran.
    CallError { seq: u64, code: String, message: String, retryable: bool },
    /// A message-level failure reported to the other side.
    Error { code: String, message: String, retryable: bool },
}

/// The universal message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Milliseconds since Unix epoch. Set automatically at construction.
    pub ts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<Uuid>,
    #[serde(flatten)]
    pub body: Body,
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Envelope {
    #[must_use]
    pub fn new(body: Body) -> Self {
        Self { id: Uuid::new_v4(), parent_id: None, ts: now_ms(), widget_id: None, body }
    }

    /// One property update.
    pub fn state(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(Body::State { name: name.into(), value })
    }

    /// An incremental batch of call records.
    #[must_use]
    pub fn calls(calls: Vec<QueuedCall>) -> Self {
        Self::new(Body::Calls { calls })
    }

    /// A structured error body from a typed error.
    #[must_use]
    pub fn error_from(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self::new(Body::Error {
            code: err.error_code().to_string(),
            message: err.to_string(),
            retryable: err.retryable(),
        })
    }

    /// Build a reply envelope. Inherits `widget_id` and correlates via
    /// `parent_id`.
    #[must_use]
    pub fn reply(&self, body: Body) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: Some(self.id),
            ts: now_ms(),
            widget_id: self.widget_id,
            body,
        }
    }

    #[must_use]
    pub fn with_widget_id(mut self, widget_id: Uuid) -> Self {
        self.widget_id = Some(widget_id);
        self
    }

    #[must_use]
    pub fn with_parent_id(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "envelope_test.rs"]
mod tests;
