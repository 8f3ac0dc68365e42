//! Request documents: URLs, partitions, databases and aggregation

use crate::common::*;
use grove::COUNT_ALIAS;
use std::path::Path;

#[test]
fn requests_go_to_method_urls_with_token() {
    let transport = FakeTransport::new();
    transport.respond(json!({}));

    let client = client(&transport);
    let _ = client.get::<Task>(&Context::new(), &Key::id("Task", 1));

    let request = transport.last();
    assert_eq!(
        request.url,
        format!("https://datastore.googleapis.com/v1/projects/{PROJECT}:lookup")
    );
    assert_eq!(request.token, TOKEN);
}

#[test]
fn custom_endpoint_and_database() {
    let transport = FakeTransport::new();
    transport.respond_empty();

    let config = test_config()
        .with_endpoint("http://localhost:8081")
        .with_database("analytics");
    let client = client_with(config, &transport);
    client.delete(&Context::new(), &Key::id("Task", 1)).unwrap();

    let request = transport.last();
    assert_eq!(request.url, format!("http://localhost:8081/v1/projects/{PROJECT}:commit"));
    assert_eq!(request.body["databaseId"], json!("analytics"));
}

#[test]
fn invalid_config_is_rejected() {
    let err = Client::new(
        ClientConfig::new(""),
        FakeTransport::new(),
        StaticToken::default(),
    )
    .err()
    .unwrap();

    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn client_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(grove::CONFIG_FILE_NAME);
    std::fs::write(&path, "project_id = \"from-file\"\nnamespace = \"tenant\"\n").unwrap();

    let config = ClientConfig::from_file(Path::new(&path)).unwrap();
    let transport = FakeTransport::new();
    transport.respond_empty();
    let client = client_with(config, &transport);
    client.delete(&Context::new(), &Key::id("Task", 1)).unwrap();

    let request = transport.last();
    assert!(request.url.ends_with("/v1/projects/from-file:commit"));
    assert_eq!(
        request.body["mutations"][0]["delete"]["partitionId"]["namespaceId"],
        json!("tenant")
    );
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn run_query_document() {
    let transport = FakeTransport::new();
    transport.respond(batch_json(vec![], "NO_MORE_RESULTS", None));

    let client = client(&transport);
    let query = Query::new("Task")
        .filter("Done", "=", false)
        .filter("Priority", ">=", 4)
        .order("-Priority")
        .limit(10);
    let mut it = client.run::<Task>(&Context::new(), query);
    assert!(it.advance().unwrap().is_none());

    let request = transport.last();
    assert_eq!(request.method(), "runQuery");
    assert_eq!(request.body["partitionId"], json!({ "projectId": PROJECT }));
    assert_eq!(
        request.body["query"],
        json!({
            "kind": [{ "name": "Task" }],
            "filter": { "compositeFilter": { "op": "AND", "filters": [
                { "propertyFilter": { "property": { "name": "Done" }, "op": "EQUAL", "value": { "booleanValue": false } } },
                { "propertyFilter": { "property": { "name": "Priority" }, "op": "GREATER_THAN_OR_EQUAL", "value": { "integerValue": "4" } } },
            ]}},
            "order": [{ "property": { "name": "Priority" }, "direction": "DESCENDING" }],
            "limit": 10,
        })
    );
}

#[test]
fn query_namespace_overrides_default() {
    let transport = FakeTransport::new();
    transport.respond(batch_json(vec![], "NO_MORE_RESULTS", None));

    let client = client_with(test_config().with_namespace("tenant"), &transport);
    let mut it = client.run::<Task>(&Context::new(), Query::new("Task").namespace("archive"));
    it.advance().unwrap();

    assert_eq!(
        transport.last().body["partitionId"],
        json!({ "projectId": PROJECT, "namespaceId": "archive" })
    );
}

#[test]
fn query_operand_error_surfaces_on_first_fetch() {
    let transport = FakeTransport::new();
    let client = client(&transport);
    let operand: std::collections::HashMap<String, i64> = Default::default();

    let mut it = client.run::<Task>(&Context::new(), Query::new("Task").filter("Tags", "=", operand));

    assert!(matches!(it.advance().unwrap_err().root_cause(), Error::UnsupportedType { .. }));
    assert_eq!(transport.request_count(), 0);
}

// ============================================================================
// Count
// ============================================================================

#[test]
fn count_reads_aliased_aggregate() {
    let transport = FakeTransport::new();
    transport.respond(json!({ "batch": { "aggregationResults": [
        { "aggregateProperties": { "total": { "integerValue": "42" } } }
    ]}}));

    let client = client(&transport);
    let n = client
        .count(&Context::new(), &Query::new("Task").filter("Done", "=", true))
        .unwrap();

    assert_eq!(n, 42);
    let request = transport.last();
    assert_eq!(request.method(), "runAggregationQuery");
    let aggregation = &request.body["aggregationQuery"];
    assert_eq!(aggregation["aggregations"], json!([{ "alias": COUNT_ALIAS, "count": {} }]));
    assert_eq!(aggregation["nestedQuery"]["kind"], json!([{ "name": "Task" }]));
}

#[test]
fn count_without_result_is_wire_error() {
    let transport = FakeTransport::new();
    transport.respond(json!({ "batch": { "aggregationResults": [] } }));

    let client = client(&transport);
    let err = client.count(&Context::new(), &Query::new("Task")).unwrap_err();

    assert!(matches!(err, Error::Wire { .. }));
}
