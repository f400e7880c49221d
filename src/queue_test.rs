use super::*;
use serde_json::json;

fn enqueue(queue: &mut CallQueue, method: &str) -> QueuedCall {
    queue
        .enqueue(method, vec![], BTreeMap::new(), None)
        .expect("enqueue should succeed")
}

#[test]
fn sequence_numbers_are_monotonic_from_one() {
    let mut queue = CallQueue::default();
    assert_eq!(enqueue(&mut queue, "panTo").seq, 1);
    assert_eq!(enqueue(&mut queue, "flyTo").seq, 2);
    assert_eq!(enqueue(&mut queue, "resize").seq, 3);
}

#[test]
fn pending_is_fifo_across_rapid_enqueues() {
    let mut queue = CallQueue::default();
    for method in ["addSource", "addLayer", "setFilter", "resize"] {
        enqueue(&mut queue, method);
    }

    let methods: Vec<String> = queue.pending().into_iter().map(|c| c.method).collect();
    assert_eq!(methods, ["addSource", "addLayer", "setFilter", "resize"]);
}

#[test]
fn ack_trims_up_to_and_including_seq() {
    let mut queue = CallQueue::default();
    for _ in 0..5 {
        enqueue(&mut queue, "panTo");
    }

    assert_eq!(queue.ack(3), 3);
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.pending()[0].seq, 4);
    assert_eq!(queue.acked(), 3);
}

#[test]
fn stale_ack_is_ignored() {
    let mut queue = CallQueue::default();
    for _ in 0..3 {
        enqueue(&mut queue, "panTo");
    }
    queue.ack(3);

    assert_eq!(queue.ack(1), 0);
    assert_eq!(queue.acked(), 3);
    assert!(queue.is_empty());
}

#[test]
fn reject_new_fails_the_overflowing_enqueue() {
    let mut queue = CallQueue::new(QueueConfig { capacity: 2, policy: OverflowPolicy::RejectNew });
    enqueue(&mut queue, "a");
    enqueue(&mut queue, "b");

    let err = queue
        .enqueue("c", vec![], BTreeMap::new(), None)
        .expect_err("third enqueue must overflow");
    assert!(matches!(err, QueueError::Overflow { capacity: 2 }));
    assert_eq!(queue.len(), 2);

    // Space frees up after an ack.
    queue.ack(1);
    enqueue(&mut queue, "c");
    assert_eq!(queue.len(), 2);
}

#[test]
fn drop_oldest_discards_and_counts() {
    let mut queue = CallQueue::new(QueueConfig { capacity: 2, policy: OverflowPolicy::DropOldest });
    enqueue(&mut queue, "a");
    enqueue(&mut queue, "b");
    enqueue(&mut queue, "c");

    assert_eq!(queue.dropped(), 1);
    let methods: Vec<String> = queue.pending().into_iter().map(|c| c.method).collect();
    assert_eq!(methods, ["b", "c"]);
}

#[test]
fn call_record_round_trip_preserves_order_and_kwargs() {
    let mut kwargs = BTreeMap::new();
    kwargs.insert("zoom".to_string(), json!(12));
    kwargs.insert("bearing".to_string(), json!(45.0));

    let mut queue = CallQueue::default();
    let call = queue
        .enqueue("flyTo", vec![json!(51.5), json!(-0.09), json!({"speed": 1.2})], kwargs.clone(), None)
        .expect("enqueue");

    let json = serde_json::to_string(&call).expect("serialize");
    let restored: QueuedCall = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(restored.method, "flyTo");
    assert_eq!(restored.args, vec![json!(51.5), json!(-0.09), json!({"speed": 1.2})]);
    assert_eq!(restored.kwargs, kwargs);
    assert_eq!(restored.seq, call.seq);
}

#[test]
fn empty_kwargs_are_omitted_from_the_wire() {
    let mut queue = CallQueue::default();
    let call = enqueue(&mut queue, "resize");
    let json = serde_json::to_string(&call).expect("serialize");
    assert!(!json.contains("kwargs"));
    assert!(!json.contains("result_id"));
}
