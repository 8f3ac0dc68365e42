//! Commit tests: put, insert, update, delete, batches and id allocation

use crate::common::*;
use grove::Mutation;

fn assigned(kind: &str, id: i64) -> JsonValue {
    json!({ "key": { "partitionId": { "projectId": PROJECT }, "path": [{ "kind": kind, "id": id.to_string() }] } })
}

// ============================================================================
// Single writes
// ============================================================================

#[test]
fn put_incomplete_key_returns_assigned_key() {
    let transport = FakeTransport::new();
    transport.respond(json!({ "mutationResults": [assigned("Task", 77)], "indexUpdates": 3 }));

    let client = client(&transport);
    let key = client
        .put(&Context::new(), &Key::incomplete("Task"), &Task::new("new", 1))
        .unwrap();

    assert_eq!(key.numeric_id(), Some(77));
    assert_eq!(key.kind(), "Task");
    assert!(!key.is_incomplete());

    let body = transport.last().body;
    assert_eq!(body["mode"], json!("NON_TRANSACTIONAL"));
    let upsert = &body["mutations"][0]["upsert"];
    assert_eq!(upsert["key"]["path"], json!([{ "kind": "Task" }]));
    assert_eq!(upsert["properties"]["Title"], json!({ "stringValue": "new" }));
    assert_eq!(upsert["properties"]["Priority"], json!({ "integerValue": "1" }));
}

#[test]
fn put_complete_key_returns_same_key() {
    let transport = FakeTransport::new();
    transport.respond(json!({ "mutationResults": [{ "version": "12" }] }));

    let client = client(&transport);
    let key = Key::name("Task", "fixed");
    let stored = client.put(&Context::new(), &key, &Task::new("x", 1)).unwrap();

    assert_eq!(stored, key);
}

#[test]
fn insert_and_update_use_their_operations() {
    let transport = FakeTransport::new();
    transport.respond_empty().respond_empty();

    let client = client(&transport);
    let key = Key::id("Task", 5);
    client.insert(&Context::new(), &key, &Task::new("a", 1)).unwrap();
    client.update(&Context::new(), &key, &Task::new("b", 2)).unwrap();

    let requests = transport.requests();
    assert!(requests[0].body["mutations"][0].get("insert").is_some());
    assert!(requests[1].body["mutations"][0].get("update").is_some());
}

#[test]
fn update_rejects_incomplete_key() {
    let transport = FakeTransport::new();
    let client = client(&transport);

    let err = client
        .update(&Context::new(), &Key::incomplete("Task"), &Task::default())
        .unwrap_err();

    assert!(matches!(err, Error::InvalidKey { .. }));
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn delete_sends_key_document() {
    let transport = FakeTransport::new();
    transport.respond(json!({ "mutationResults": [{}] }));

    let client = client(&transport);
    client.delete(&Context::new(), &Key::name("Task", "old")).unwrap();

    assert_eq!(
        transport.last().body["mutations"],
        json!([{ "delete": { "path": [{ "kind": "Task", "name": "old" }] } }])
    );
}

#[test]
fn mutations_pick_up_default_namespace() {
    let transport = FakeTransport::new();
    transport.respond_empty();

    let client = client_with(test_config().with_namespace("tenant"), &transport);
    let key = client
        .put(&Context::new(), &Key::name("Task", "a"), &Task::default())
        .unwrap();

    assert_eq!(key.namespace(), Some("tenant"));
    assert_eq!(
        transport.last().body["mutations"][0]["upsert"]["key"]["partitionId"]["namespaceId"],
        json!("tenant")
    );
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn put_multi_fills_assigned_keys_in_order() {
    let transport = FakeTransport::new();
    transport.respond(json!({
        "mutationResults": [assigned("Task", 10), { "version": "1" }, assigned("Task", 11)]
    }));

    let client = client(&transport);
    let keys = vec![Key::incomplete("Task"), Key::name("Task", "named"), Key::incomplete("Task")];
    let tasks = vec![Task::new("a", 1), Task::new("b", 2), Task::new("c", 3)];
    let stored = client.put_multi(&Context::new(), &keys, &tasks).unwrap();

    assert_eq!(stored[0].numeric_id(), Some(10));
    assert_eq!(stored[1], Key::name("Task", "named"));
    assert_eq!(stored[2].numeric_id(), Some(11));
    assert_eq!(transport.last().body["mutations"].as_array().unwrap().len(), 3);
}

#[test]
fn put_multi_length_mismatch_is_invalid_input() {
    let transport = FakeTransport::new();
    let client = client(&transport);

    let err = client
        .put_multi(&Context::new(), &task_keys(2), &[Task::default()])
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput { .. }));
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn put_multi_reports_every_invalid_key() {
    let transport = FakeTransport::new();
    let client = client(&transport);
    let bad = Key::incomplete("List").child_name("Task", "a");
    let keys = vec![Key::id("Task", 1), bad.clone(), bad];
    let tasks = vec![Task::default(), Task::default(), Task::default()];

    match client.put_multi(&Context::new(), &keys, &tasks) {
        Err(Error::Multi(multi)) => {
            assert_eq!(multi.failures(), 2);
            assert!(multi.0[0].is_none());
        }
        other => panic!("expected positional errors, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn delete_multi_rejects_incomplete_keys() {
    let transport = FakeTransport::new();
    let client = client(&transport);

    let err = client
        .delete_multi(&Context::new(), &[Key::id("Task", 1), Key::incomplete("Task")])
        .unwrap_err();

    assert!(matches!(err, Error::Multi(_)));
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn mutate_mixes_operations_in_one_commit() {
    let transport = FakeTransport::new();
    transport.respond(json!({ "mutationResults": [{}, {}] }));

    let client = client(&transport);
    let mutations = vec![
        Mutation::upsert(Key::id("Task", 1), &Task::new("keep", 1)).unwrap(),
        Mutation::delete(Key::id("Task", 2)).unwrap(),
    ];
    let keys = client.mutate(&Context::new(), mutations).unwrap();

    assert_eq!(keys, task_keys(2));
    let body = transport.last().body;
    assert!(body["mutations"][0].get("upsert").is_some());
    assert!(body["mutations"][1].get("delete").is_some());
}

#[test]
fn commit_failure_is_passed_through() {
    let transport = FakeTransport::new();
    transport.fail(TransportError::with_status(409, "entity already exists"));

    let client = client(&transport);
    let err = client
        .insert(&Context::new(), &Key::id("Task", 1), &Task::default())
        .unwrap_err();

    match err {
        Error::Transport(e) => {
            assert_eq!(e.status, Some(409));
            assert_eq!(e.message, "entity already exists");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

// ============================================================================
// Id allocation
// ============================================================================

#[test]
fn allocate_ids_completes_keys() {
    let transport = FakeTransport::new();
    transport.respond(json!({ "keys": [
        { "path": [{ "kind": "Task", "id": "100" }] },
        { "path": [{ "kind": "Task", "id": "101" }] },
    ]}));

    let client = client(&transport);
    let keys = client
        .allocate_ids(&Context::new(), &[Key::incomplete("Task"), Key::incomplete("Task")])
        .unwrap();

    assert_eq!(keys, vec![Key::id("Task", 100), Key::id("Task", 101)]);
    assert_eq!(transport.last().method(), "allocateIds");
}

#[test]
fn allocate_ids_rejects_complete_keys() {
    let transport = FakeTransport::new();
    let client = client(&transport);

    let err = client
        .allocate_ids(&Context::new(), &[Key::incomplete("Task"), Key::id("Task", 1)])
        .unwrap_err();

    match err {
        Error::Multi(multi) => assert!(multi.0[1].is_some() && multi.0[0].is_none()),
        other => panic!("expected positional errors, got {other:?}"),
    }
}

#[test]
fn allocate_ids_count_mismatch_is_wire_error() {
    let transport = FakeTransport::new();
    transport.respond(json!({ "keys": [] }));

    let client = client(&transport);
    let err = client
        .allocate_ids(&Context::new(), &[Key::incomplete("Task")])
        .unwrap_err();

    assert!(matches!(err, Error::Wire { .. }));
}
