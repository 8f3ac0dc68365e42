//! Lookup tests: get, get_multi, correlation and deferred keys

use crate::common::*;

// ============================================================================
// Single-key lookups
// ============================================================================

#[test]
fn get_decodes_found_entity() {
    let transport = FakeTransport::new();
    let key = Key::id("Task", 1);
    let task = Task::new("write docs", 3);
    transport.respond(json!({ "found": [{ "entity": task_json(&key, &task), "version": "4" }] }));

    let client = client(&transport);
    let got: Task = client.get(&Context::new(), &key).unwrap();

    assert_eq!(got, task);
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn get_missing_entity_is_not_found() {
    let transport = FakeTransport::new();
    let key = Key::name("Task", "gone");
    transport.respond(json!({ "missing": [{ "entity": { "key": wire::key_to_json(&key) } }] }));

    let client = client(&transport);
    let err = client.get::<Task>(&Context::new(), &key).unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err, Error::NoSuchEntity { key });
}

#[test]
fn get_rejects_incomplete_key_without_request() {
    let transport = FakeTransport::new();
    let client = client(&transport);

    let err = client
        .get::<Task>(&Context::new(), &Key::incomplete("Task"))
        .unwrap_err();

    assert!(matches!(err, Error::InvalidKey { .. }));
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn get_into_raw_entity() {
    let transport = FakeTransport::new();
    let key = Key::id("Task", 9);
    transport.respond(json!({ "found": [{ "entity": task_json(&key, &Task::new("raw", 1)) }] }));

    let client = client(&transport);
    let entity: Entity = client.get(&Context::new(), &key).unwrap();

    assert_eq!(entity.key, Some(key));
    assert_eq!(entity.get("Title"), Some(&Value::String("raw".into())));
    assert_eq!(entity.get("Priority"), Some(&Value::Integer(1)));
}

// ============================================================================
// Batch lookups
// ============================================================================

#[test]
fn get_multi_correlates_out_of_order_results() {
    let transport = FakeTransport::new();
    let keys = task_keys(3);
    let a = Task::new("a", 1);
    let c = Task::new("c", 3);
    transport.respond(json!({
        "found": [
            { "entity": task_json(&keys[2], &c) },
            { "entity": task_json(&keys[0], &a) },
        ],
        "missing": [{ "entity": { "key": wire::key_to_json(&keys[1]) } }],
    }));

    let client = client(&transport);
    let results = client.get_multi::<Task>(&Context::new(), &keys).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), &a);
    assert_eq!(
        results[1].as_ref().unwrap_err(),
        &Error::NoSuchEntity { key: keys[1].clone() }
    );
    assert_eq!(results[2].as_ref().unwrap(), &c);
}

#[test]
fn get_multi_decode_failure_affects_only_its_slot() {
    let transport = FakeTransport::new();
    let keys = task_keys(2);
    let mut broken = task_json(&keys[1], &Task::new("b", 2));
    broken["properties"]["Priority"] = json!({ "stringValue": "high" });
    transport.respond(json!({
        "found": [
            { "entity": task_json(&keys[0], &Task::new("a", 1)) },
            { "entity": broken },
        ],
    }));

    let client = client(&transport);
    let results = client.get_multi::<Task>(&Context::new(), &keys).unwrap();

    assert_eq!(results[0].as_ref().unwrap().title, "a");
    let err = results[1].as_ref().unwrap_err();
    assert!(matches!(err.root_cause(), Error::TypeMismatch { .. }));
}

#[test]
fn get_multi_malformed_entity_affects_only_its_slot() {
    let transport = FakeTransport::new();
    let keys = task_keys(2);
    let mut broken = task_json(&keys[1], &Task::new("b", 2));
    broken["properties"]["Priority"] = json!({ "integerValue": "12abc" });
    transport.respond(json!({
        "found": [
            { "entity": broken },
            { "entity": task_json(&keys[0], &Task::new("a", 1)) },
        ],
    }));

    let client = client(&transport);
    let results = client.get_multi::<Task>(&Context::new(), &keys).unwrap();

    assert_eq!(results[0].as_ref().unwrap().title, "a");
    let err = results[1].as_ref().unwrap_err();
    assert!(matches!(err.root_cause(), Error::Wire { .. }));
}

#[test]
fn get_multi_duplicate_keys_share_one_lookup() {
    let transport = FakeTransport::new();
    let key = Key::id("Task", 1);
    transport.respond(json!({ "found": [{ "entity": task_json(&key, &Task::new("dup", 1)) }] }));

    let client = client(&transport);
    let results = client
        .get_multi::<Task>(&Context::new(), &[key.clone(), key.clone()])
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.as_ref().unwrap().title == "dup"));
    assert_eq!(transport.last().body["keys"].as_array().unwrap().len(), 1);
}

#[test]
fn get_multi_reports_invalid_keys_positionally() {
    let transport = FakeTransport::new();
    let client = client(&transport);
    let keys = vec![Key::id("Task", 1), Key::incomplete("Task"), Key::name("Task", "x")];

    match client.get_multi::<Task>(&Context::new(), &keys) {
        Err(Error::Multi(multi)) => {
            assert_eq!(multi.0.len(), 3);
            assert_eq!(multi.failures(), 1);
            assert!(multi.0[1].is_some());
        }
        other => panic!("expected positional errors, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn get_multi_empty_sends_nothing() {
    let transport = FakeTransport::new();
    let client = client(&transport);

    let results = client.get_multi::<Task>(&Context::new(), &[]).unwrap();

    assert!(results.is_empty());
    assert_eq!(transport.request_count(), 0);
}

// ============================================================================
// Deferred keys
// ============================================================================

#[test]
fn deferred_keys_are_looked_up_again() {
    let transport = FakeTransport::new();
    let keys = task_keys(2);
    transport
        .respond(json!({
            "found": [{ "entity": task_json(&keys[0], &Task::new("first", 1)) }],
            "deferred": [wire::key_to_json(&keys[1])],
        }))
        .respond(json!({
            "found": [{ "entity": task_json(&keys[1], &Task::new("second", 2)) }],
        }));

    let client = client(&transport);
    let results = client.get_multi::<Task>(&Context::new(), &keys).unwrap();

    assert_eq!(results[0].as_ref().unwrap().title, "first");
    assert_eq!(results[1].as_ref().unwrap().title, "second");

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].body["keys"],
        json!([wire::key_to_json(&keys[1])])
    );
}

#[test]
fn deferred_keys_give_up_after_configured_rounds() {
    let transport = FakeTransport::new();
    let key = Key::id("Task", 1);
    let deferred = json!({ "deferred": [wire::key_to_json(&key)] });
    transport.respond(deferred.clone()).respond(deferred.clone());

    let mut config = test_config();
    config.lookup_rounds = 2;
    let client = client_with(config, &transport);
    let results = client.get_multi::<Task>(&Context::new(), &[key]).unwrap();

    assert!(matches!(results[0], Err(Error::Transport(_))));
    assert_eq!(transport.request_count(), 2);
}

// ============================================================================
// Namespaces
// ============================================================================

#[test]
fn default_namespace_applies_to_bare_keys() {
    let transport = FakeTransport::new();
    let key = Key::id("Task", 1);
    let stored = key.clone().with_namespace("tenant");
    transport.respond(json!({ "found": [{ "entity": task_json(&stored, &Task::new("ns", 1)) }] }));

    let client = client_with(test_config().with_namespace("tenant"), &transport);
    let got: Task = client.get(&Context::new(), &key).unwrap();

    assert_eq!(got.title, "ns");
    assert_eq!(
        transport.last().body["keys"][0]["partitionId"]["namespaceId"],
        json!("tenant")
    );
}

#[test]
fn explicit_namespace_wins_over_default() {
    let transport = FakeTransport::new();
    let key = Key::id("Task", 1).with_namespace("other");
    transport.respond(json!({ "missing": [{ "entity": { "key": wire::key_to_json(&key) } }] }));

    let client = client_with(test_config().with_namespace("tenant"), &transport);
    assert!(client.get::<Task>(&Context::new(), &key).unwrap_err().is_not_found());
    assert_eq!(
        transport.last().body["keys"][0]["partitionId"]["namespaceId"],
        json!("other")
    );
}
