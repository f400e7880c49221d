use super::*;
use serde_json::json;

/// Records executed methods; rejects any method named "explode".
struct MockRenderer {
    executed: Vec<String>,
}

impl MockRenderer {
    fn new() -> Self {
        Self { executed: Vec::new() }
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn execute(
        &mut self,
        method: &str,
        _args: &[Value],
        _kwargs: &BTreeMap<String, Value>,
    ) -> Result<Value, RendererError> {
        if method == "explode" {
            return Err(RendererError::UnsupportedMethod(method.to_string()));
        }
        self.executed.push(method.to_string());
        Ok(Value::Null)
    }
}

fn call(seq: u64, method: &str) -> QueuedCall {
    QueuedCall { seq, method: method.into(), args: vec![], kwargs: BTreeMap::new(), result_id: None }
}

#[tokio::test]
async fn drain_executes_fifo_and_acks_highest_seq() {
    let mut renderer = MockRenderer::new();
    let mut session = PeerSession::new(Uuid::new_v4());
    let batch = vec![call(1, "addSource"), call(2, "addLayer"), call(3, "resize")];

    let replies = session.drain(&mut renderer, &batch).await;

    assert_eq!(renderer.executed, ["addSource", "addLayer", "resize"]);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].body, Body::Ack { seq: 3 });
    assert_eq!(session.last_applied(), 3);
}

#[tokio::test]
async fn redelivered_calls_are_not_reexecuted() {
    let mut renderer = MockRenderer::new();
    let mut session = PeerSession::new(Uuid::new_v4());

    session.drain(&mut renderer, &[call(1, "panTo"), call(2, "resize")]).await;
    // Full-queue redelivery after a reconnect: seqs 1-2 again plus a new 3.
    let replies = session
        .drain(&mut renderer, &[call(1, "panTo"), call(2, "resize"), call(3, "flyTo")])
        .await;

    assert_eq!(renderer.executed, ["panTo", "resize", "flyTo"]);
    assert_eq!(replies.last().map(|e| &e.body), Some(&Body::Ack { seq: 3 }));
}

#[tokio::test]
async fn rejected_call_surfaces_error_without_aborting_batch() {
    let mut renderer = MockRenderer::new();
    let mut session = PeerSession::new(Uuid::new_v4());
    let batch = vec![call(1, "addLayer"), call(2, "explode"), call(3, "resize")];

    let replies = session.drain(&mut renderer, &batch).await;

    // The failure did not stop seq 3 from running.
    assert_eq!(renderer.executed, ["addLayer", "resize"]);

    assert_eq!(replies.len(), 2);
    let Body::CallError { seq, code, retryable, .. } = &replies[0].body else {
        panic!("expected call_error");
    };
    assert_eq!(*seq, 2);
    assert_eq!(code, "E_RENDERER_UNSUPPORTED");
    assert!(!retryable);
    assert_eq!(replies[1].body, Body::Ack { seq: 3 });

    // The rejected call is consumed, not retried on redelivery.
    let replies = session.drain(&mut renderer, &batch).await;
    assert_eq!(renderer.executed, ["addLayer", "resize"]);
    assert_eq!(replies.len(), 1, "only the ack");
}

#[tokio::test]
async fn result_id_yields_a_correlated_call_result() {
    let mut renderer = MockRenderer::new();
    let widget_id = Uuid::new_v4();
    let mut session = PeerSession::new(widget_id);
    let result_id = Uuid::new_v4();
    let batch = vec![QueuedCall {
        seq: 1,
        method: "queryRenderedFeatures".into(),
        args: vec![json!([10, 20])],
        kwargs: BTreeMap::new(),
        result_id: Some(result_id),
    }];

    let replies = session.drain(&mut renderer, &batch).await;

    assert_eq!(replies.len(), 2);
    assert!(matches!(replies[0].body, Body::CallResult { seq: 1, .. }));
    assert_eq!(replies[0].parent_id, Some(result_id));
    assert_eq!(replies[0].widget_id, Some(widget_id));
    assert_eq!(replies[1].body, Body::Ack { seq: 1 });
}

#[tokio::test]
async fn empty_batch_produces_no_ack() {
    let mut renderer = MockRenderer::new();
    let mut session = PeerSession::new(Uuid::new_v4());
    assert!(session.drain(&mut renderer, &[]).await.is_empty());
}
