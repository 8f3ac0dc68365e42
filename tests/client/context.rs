//! Cancellation, deadlines and token sources

use crate::common::*;
use std::time::Duration;

#[test]
fn cancelled_context_sends_nothing() {
    let transport = FakeTransport::new();
    let client = client(&transport);
    let ctx = Context::new();
    ctx.cancel();

    let err = client.get::<Task>(&ctx, &Key::id("Task", 1)).unwrap_err();

    assert_eq!(err, Error::Cancelled);
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn expired_deadline_is_cancelled() {
    let transport = FakeTransport::new();
    let client = client(&transport);
    let ctx = Context::with_timeout(Duration::ZERO);

    let err = client
        .put(&ctx, &Key::incomplete("Task"), &Task::default())
        .unwrap_err();

    assert_eq!(err, Error::Cancelled);
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn cancelling_a_clone_stops_the_iterator() {
    let transport = FakeTransport::new();
    let key = Key::id("Task", 1);
    transport.respond(batch_json(
        vec![result_json(&key, &Task::new("only", 1), None)],
        "NOT_FINISHED",
        Some("c1"),
    ));

    let client = client(&transport);
    let ctx = Context::new();
    let mut it = client.run::<Task>(&ctx, Query::new("Task"));

    assert!(it.advance().unwrap().is_some());
    ctx.clone().cancel();
    assert_eq!(it.advance().unwrap_err(), Error::Cancelled);
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn token_source_closure_supplies_bearer_token() {
    let transport = FakeTransport::new();
    transport.respond_empty();

    init_tracing();
    let tokens = |_: &Context| -> Result<String, TransportError> { Ok("from-closure".to_string()) };
    let client = Client::new(test_config(), transport.clone(), tokens).unwrap();
    client.delete(&Context::new(), &Key::id("Task", 1)).unwrap();

    assert_eq!(transport.last().token, "from-closure");
}

#[test]
fn token_failure_is_a_transport_error() {
    let transport = FakeTransport::new();
    let tokens = |_: &Context| -> Result<String, TransportError> {
        Err(TransportError::with_status(401, "expired credentials"))
    };
    let client = Client::new(test_config(), transport.clone(), tokens).unwrap();

    let err = client.get::<Task>(&Context::new(), &Key::id("Task", 1)).unwrap_err();

    assert!(matches!(err, Error::Transport(TransportError { status: Some(401), .. })));
    assert_eq!(transport.request_count(), 0);
}
