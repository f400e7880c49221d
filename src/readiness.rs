//! Readiness gate — defer calls until the renderer reports it is live.
//!
//! DESIGN
//! ======
//! Certain calls (adding a draw control, setting a draw mode, adding a
//! legend) must not reach the renderer before it signals readiness. Until
//! then they are staged here. The machine is two-state and one-way:
//! `NotReady → Ready`, flushing the staged calls exactly once on the
//! transition. The gate stays `Ready` forever after; a repeated readiness
//! signal yields nothing.

use std::collections::BTreeMap;

use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    NotReady,
    Ready,
}

/// A call staged before readiness. Sequence numbers are assigned at flush
/// time so staged and direct calls share one ordered stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedCall {
    pub method: String,
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
    pub result_id: Option<Uuid>,
}

pub struct ReadinessGate {
    state: Readiness,
    staged: Vec<StagedCall>,
}

impl ReadinessGate {
    #[must_use]
    pub fn new() -> Self {
        Self { state: Readiness::NotReady, staged: Vec::new() }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == Readiness::Ready
    }

    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Buffer a call for the readiness flush. Callers must check
    /// [`is_ready`](Self::is_ready) first; staging after the transition is a
    /// host-side ordering bug, so staged calls would otherwise never flush.
    pub fn stage(&mut self, call: StagedCall) {
        self.staged.push(call);
    }

    /// Transition to `Ready` and hand back the staged calls, oldest first.
    /// Idempotent: only the first invocation returns anything.
    pub fn mark_ready(&mut self) -> Vec<StagedCall> {
        if self.state == Readiness::Ready {
            return Vec::new();
        }
        self.state = Readiness::Ready;
        std::mem::take(&mut self.staged)
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn staged(method: &str) -> StagedCall {
        StagedCall { method: method.into(), args: vec![json!(1)], kwargs: BTreeMap::new(), result_id: None }
    }

    #[test]
    fn starts_not_ready_with_nothing_staged() {
        let gate = ReadinessGate::new();
        assert!(!gate.is_ready());
        assert_eq!(gate.staged_len(), 0);
    }

    #[test]
    fn flush_is_exactly_once_and_ordered() {
        let mut gate = ReadinessGate::new();
        gate.stage(staged("addDrawControl"));
        gate.stage(staged("setDrawMode"));
        gate.stage(staged("addLegend"));

        let flushed = gate.mark_ready();
        assert_eq!(flushed.len(), 3);
        let methods: Vec<&str> = flushed.iter().map(|c| c.method.as_str()).collect();
        assert_eq!(methods, ["addDrawControl", "setDrawMode", "addLegend"]);
        assert!(gate.is_ready());

        // A second readiness signal delivers zero additional calls.
        assert!(gate.mark_ready().is_empty());
    }

    #[test]
    fn ready_with_nothing_staged_flushes_nothing() {
        let mut gate = ReadinessGate::new();
        assert!(gate.mark_ready().is_empty());
        assert!(gate.is_ready());
    }
}
