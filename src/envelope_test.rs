use super::*;
use serde_json::json;

use crate::queue::QueuedCall;

#[test]
fn state_sets_fields() {
    let env = Envelope::state("zoom", json!(4));
    assert!(env.parent_id.is_none());
    assert!(env.widget_id.is_none());
    assert!(env.ts > 0);
    assert_eq!(env.body, Body::State { name: "zoom".into(), value: json!(4) });
}

#[test]
fn reply_inherits_context() {
    let widget_id = Uuid::new_v4();
    let req = Envelope::state("loaded", json!(true)).with_widget_id(widget_id);
    let reply = req.reply(Body::Ack { seq: 3 });

    assert_eq!(reply.parent_id, Some(req.id));
    assert_eq!(reply.widget_id, Some(widget_id));
    assert_eq!(reply.body, Body::Ack { seq: 3 });
}

#[test]
fn wire_shape_is_flat_and_tagged() {
    let env = Envelope::state("center", json!([40.0, -100.0]));
    let value = serde_json::to_value(&env).expect("serialize");

    assert_eq!(value["type"], "state");
    assert_eq!(value["name"], "center");
    assert_eq!(value["value"], json!([40.0, -100.0]));
    // No nested "body" object on the wire.
    assert!(value.get("body").is_none());
}

#[test]
fn ready_round_trip() {
    let env = Envelope::new(Body::Ready).with_widget_id(Uuid::new_v4());
    let json = serde_json::to_string(&env).expect("serialize");
    assert!(json.contains("\"type\":\"ready\""));

    let restored: Envelope = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored.id, env.id);
    assert_eq!(restored.widget_id, env.widget_id);
    assert_eq!(restored.body, Body::Ready);
}

#[test]
fn calls_round_trip_preserves_records() {
    let call = QueuedCall {
        seq: 7,
        method: "flyTo".into(),
        args: vec![json!(51.5), json!(-0.09)],
        kwargs: [("zoom".to_string(), json!(10))].into_iter().collect(),
        result_id: None,
    };
    let env = Envelope::calls(vec![call.clone()]);
    let json = serde_json::to_string(&env).expect("serialize");
    let restored: Envelope = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(restored.body, Body::Calls { calls: vec![call] });
}

#[test]
fn error_from_typed() {
    #[derive(Debug, thiserror::Error)]
    #[error("style source unreachable")]
    struct Unreachable;

    impl ErrorCode for Unreachable {
        fn error_code(&self) -> &'static str {
            "E_FETCH"
        }

        fn retryable(&self) -> bool {
            true
        }
    }

    let env = Envelope::error_from(&Unreachable);
    let Body::Error { code, message, retryable } = env.body else {
        panic!("expected error body");
    };
    assert_eq!(code, "E_FETCH");
    assert_eq!(message, "style source unreachable");
    assert!(retryable);
}

#[test]
fn unknown_type_fails_parsing() {
    let text = r#"{"id":"6f9b6f9e-0000-0000-0000-000000000000","ts":1,"type":"telemetry"}"#;
    assert!(serde_json::from_str::<Envelope>(text).is_err());
}
