//! Integration tests for the resource manager using wiremock
//!
//! These tests drive the real manager against mocked Corral endpoints,
//! verifying pagination semantics, local validation, request bodies, and
//! error mapping.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use corral::api::auth::Credentials;
use corral::api::client::Client;
use corral::commands::node::delete_many;
use corral::error::Error;
use corral::resource::{build_patch, ListOpts, PatchOp, ResourceManager, SortDir, UpdateMethod};

fn client_for(server: &MockServer) -> Client {
    Client::new(&server.uri(), Credentials::from_token("test-token")).unwrap()
}

fn node(uuid: &str, name: &str) -> serde_json::Value {
    json!({"uuid": uuid, "name": name, "code": "c1", "type": "sensor", "status": "online"})
}

/// A limit below the server's cap is satisfied by a single request
#[tokio::test]
async fn test_list_with_limit_below_cap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [node("u1", "n1"), node("u2", "n2")]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let opts = ListOpts {
        limit: Some(2),
        ..Default::default()
    };
    let nodes = manager.list(&opts).await.unwrap();

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].display("uuid"), "u1");
    assert_eq!(nodes[1].display("uuid"), "u2");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

/// limit == 0 walks the whole collection, following markers until an
/// empty page comes back
#[tokio::test]
async fn test_list_limit_zero_fetches_everything() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes"))
        .and(query_param_is_missing("marker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [node("u1", "n1"), node("u2", "n2")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes"))
        .and(query_param("marker", "u2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [node("u3", "n3")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes"))
        .and(query_param("marker", "u3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nodes": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let opts = ListOpts {
        limit: Some(0),
        ..Default::default()
    };
    let nodes = manager.list(&opts).await.unwrap();

    let uuids: Vec<String> = nodes.iter().map(|n| n.display("uuid")).collect();
    assert_eq!(uuids, vec!["u1", "u2", "u3"]);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

/// A limit above the server's per-request cap paginates transparently
/// and never exceeds the requested total
#[tokio::test]
async fn test_list_limit_spans_pages_exactly() {
    let server = MockServer::start().await;

    // Server caps pages at 2 items
    Mock::given(method("GET"))
        .and(path("/v1/nodes"))
        .and(query_param("limit", "3"))
        .and(query_param_is_missing("marker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [node("u1", "n1"), node("u2", "n2")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes"))
        .and(query_param("limit", "1"))
        .and(query_param("marker", "u2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [node("u3", "n3")]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let opts = ListOpts {
        limit: Some(3),
        ..Default::default()
    };
    let nodes = manager.list(&opts).await.unwrap();

    let uuids: Vec<String> = nodes.iter().map(|n| n.display("uuid")).collect();
    assert_eq!(uuids, vec!["u1", "u2", "u3"]);
}

/// No limit means one request at the server's default cap, even when the
/// page is full
#[tokio::test]
async fn test_list_without_limit_is_single_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes"))
        .and(query_param_is_missing("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [node("u1", "n1"), node("u2", "n2")]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let nodes = manager.list(&ListOpts::default()).await.unwrap();

    assert_eq!(nodes.len(), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

/// Sort and project filters land in the query string
#[tokio::test]
async fn test_list_filters_reach_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes"))
        .and(query_param("sort_key", "created_at"))
        .and(query_param("sort_dir", "desc"))
        .and(query_param("project_id", "greenhouse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nodes": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let opts = ListOpts {
        sort_key: Some("created_at".to_string()),
        sort_dir: Some(SortDir::Desc),
        project: Some("greenhouse".to_string()),
        ..Default::default()
    };
    let nodes = manager.list(&opts).await.unwrap();
    assert!(nodes.is_empty());
}

/// The detail representation uses a path segment, not a query flag
#[tokio::test]
async fn test_list_detail_uses_detail_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [node("u1", "n1")]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let opts = ListOpts {
        detail: true,
        ..Default::default()
    };
    let nodes = manager.list(&opts).await.unwrap();
    assert_eq!(nodes.len(), 1);
}

/// detail and fields together are rejected before any request is sent
#[tokio::test]
async fn test_list_detail_with_fields_rejected_locally() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let opts = ListOpts {
        detail: true,
        fields: Some(vec!["uuid".to_string()]),
        ..Default::default()
    };
    let err = manager.list(&opts).await.unwrap_err();

    assert!(matches!(err, Error::InvalidAttribute(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// Unknown requested fields are rejected before any request is sent
#[tokio::test]
async fn test_get_with_bogus_field_rejected_locally() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let fields = vec!["bogus_field".to_string()];
    let err = manager.get("n1", Some(&fields)).await.unwrap_err();

    assert!(matches!(err, Error::InvalidAttribute(_)));
    assert!(err.to_string().contains("bogus_field"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// A field subset is passed as a comma-joined query value
#[tokio::test]
async fn test_get_with_fields_builds_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes/n1"))
        .and(query_param("fields", "uuid,name"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"uuid": "u1", "name": "n1"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let fields = vec!["uuid".to_string(), "name".to_string()];
    let found = manager.get("n1", Some(&fields)).await.unwrap();
    assert_eq!(found.display("name"), "n1");
}

/// 404 from the server surfaces as NotFound naming the identifier
#[tokio::test]
async fn test_get_missing_node_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "no such node"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let err = manager.get("ghost", None).await.unwrap_err();
    assert_eq!(err.to_string(), "node not found: ghost");
}

/// Keys outside the creation allow-list are dropped from the request body
#[tokio::test]
async fn test_create_narrows_to_allow_list() {
    let server = MockServer::start().await;

    // Exact body match: a request still carrying "bogus" will not match
    // and the test fails with an unmatched request
    Mock::given(method("POST"))
        .and(path("/v1/nodes"))
        .and(body_json(json!({
            "name": "n1",
            "code": "c1",
            "type": "sensor"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "uuid": "u-created",
            "name": "n1",
            "code": "c1",
            "type": "sensor"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let mut fields = serde_json::Map::new();
    fields.insert("name".to_string(), json!("n1"));
    fields.insert("code".to_string(), json!("c1"));
    fields.insert("type".to_string(), json!("sensor"));
    fields.insert("bogus".to_string(), json!("x"));

    let created = manager.create(fields).await.unwrap();
    assert_eq!(created.display("uuid"), "u-created");
}

/// An update sends the patch document verbatim as a JSON array
#[tokio::test]
async fn test_update_sends_patch_document() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/nodes/n1"))
        .and(body_json(json!([
            {"op": "replace", "path": "/extra/foo", "value": "bar"}
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "u1",
            "name": "n1",
            "extra": {"foo": "bar"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let tokens = vec!["extra/foo=bar".to_string()];
    let patch = build_patch(PatchOp::Replace, &tokens, manager.def()).unwrap();
    let updated = manager.update("n1", &patch, UpdateMethod::Patch).await.unwrap();

    assert_eq!(updated.display("extra.foo"), "bar");
}

/// Remove entries must reach the wire without a value key
#[tokio::test]
async fn test_update_remove_has_no_value_on_wire() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/nodes/n1"))
        .and(body_json(json!([
            {"op": "remove", "path": "/extra/foo"}
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "u1",
            "name": "n1",
            "extra": {}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let tokens = vec!["extra/foo".to_string()];
    let patch = build_patch(PatchOp::Remove, &tokens, manager.def()).unwrap();
    let updated = manager.update("n1", &patch, UpdateMethod::Patch).await.unwrap();

    assert_eq!(updated.display("extra"), "{}");
}

/// An empty patch never leaves the client
#[tokio::test]
async fn test_update_empty_patch_rejected_locally() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let err = manager.update("n1", &[], UpdateMethod::Patch).await.unwrap_err();
    assert!(matches!(err, Error::InvalidAttribute(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// Update followed by get reflects the patched value (passthrough server)
#[tokio::test]
async fn test_update_then_get_roundtrip() {
    let server = MockServer::start().await;

    let patched = json!({"uuid": "u1", "name": "n1", "extra": {"foo": "bar"}});

    Mock::given(method("PATCH"))
        .and(path("/v1/nodes/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&patched))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/nodes/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&patched))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let tokens = vec!["extra/foo=bar".to_string()];
    let patch = build_patch(PatchOp::Add, &tokens, manager.def()).unwrap();
    let updated = manager.update("u1", &patch, UpdateMethod::Patch).await.unwrap();
    let fetched = manager.get("u1", None).await.unwrap();

    assert_eq!(updated.display("extra.foo"), fetched.display("extra.foo"));
}

/// Deleting a second time fails; batch delete reports exactly one
/// failure naming the missing node
#[tokio::test]
async fn test_batch_delete_aggregates_failures() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/nodes/n1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/nodes/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let ids = vec!["n1".to_string(), "ghost".to_string()];
    let (deleted, failures) = delete_many(&manager, &ids).await;

    assert_eq!(deleted, vec!["n1"]);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("ghost"));
}

/// A marker that does not advance aborts the listing instead of looping
#[tokio::test]
async fn test_non_advancing_marker_is_protocol_error() {
    let server = MockServer::start().await;

    // The server keeps returning the same page regardless of marker
    Mock::given(method("GET"))
        .and(path("/v1/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [node("u1", "n1")]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    let opts = ListOpts {
        limit: Some(0),
        ..Default::default()
    };
    let err = manager.list(&opts).await.unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
    assert!(err.to_string().contains("did not advance"));
}

/// Power-state changes go to the state sub-resource with the wire label
#[tokio::test]
async fn test_set_power_state_target_body() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/nodes/n1/state/power"))
        .and(body_json(json!({"target": "rebooting"})))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "nodes").unwrap();

    manager
        .set_state("n1", "state/power", json!({"target": "rebooting"}))
        .await
        .unwrap();
}

/// The chassis collection shares the same manager machinery
#[tokio::test]
async fn test_chassis_manager_lists() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/chassis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chassis": [{"uuid": "c1", "description": "rack 7"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let manager = ResourceManager::new(&client, "chassis").unwrap();

    let chassis = manager.list(&ListOpts::default()).await.unwrap();
    assert_eq!(chassis[0].display("description"), "rack 7");
}
