//! Drives `HttpStateClient` against a mocked Konnect-style REST endpoint,
//! the same level the teacher's own HTTP clients stop short of unit-testing.

use kongctl::config::KongctlConfig;
use kongctl::state::{Create, Delete, Fetch, HttpStateClient, List, Update};
use kongctl_definitions::ResourceType;

fn client(addr: &str) -> HttpStateClient {
    let config = KongctlConfig {
        profile: "default".to_string(),
        addr: addr.to_string(),
        token: "test-token".to_string(),
        preview: Vec::new(),
        max_concurrency: 8,
        page_size: 2,
    };
    HttpStateClient::new(&config).unwrap()
}

#[test]
fn lists_a_single_page_of_portals() {
    let mut server = mockito::Server::new();
    let body = serde_json::json!({
        "data": [{"id": "1", "labels": {"ref": "main"}, "name": "Main"}],
        "meta": {"page": {"total": 1}}
    });
    let _m = server
        .mock("GET", "/v2/portals")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create();

    let state = client(&server.url());
    let items = state.list(ResourceType::Portal, None).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "1");
    assert_eq!(items[0].ref_.as_deref(), Some("main"));
}

#[test]
fn lists_across_two_pages_until_total_is_reached() {
    let mut server = mockito::Server::new();
    let page1 = serde_json::json!({
        "data": [
            {"id": "1", "labels": {"ref": "a"}},
            {"id": "2", "labels": {"ref": "b"}}
        ],
        "meta": {"page": {"total": 3}}
    });
    let page2 = serde_json::json!({
        "data": [{"id": "3", "labels": {"ref": "c"}}],
        "meta": {"page": {"total": 3}}
    });
    let _m1 = server
        .mock("GET", "/v2/portals")
        .match_query(mockito::Matcher::UrlEncoded("offset".into(), "0".into()))
        .with_status(200)
        .with_body(page1.to_string())
        .create();
    let _m2 = server
        .mock("GET", "/v2/portals")
        .match_query(mockito::Matcher::UrlEncoded("offset".into(), "2".into()))
        .with_status(200)
        .with_body(page2.to_string())
        .create();

    let state = client(&server.url());
    let items = state.list(ResourceType::Portal, None).unwrap();
    assert_eq!(items.len(), 3);
}

#[test]
fn scopes_gateway_services_under_their_control_plane() {
    let mut server = mockito::Server::new();
    let body = serde_json::json!({"data": [], "meta": {"page": {"total": 0}}});
    let _m = server
        .mock("GET", "/v2/control-planes/cp1/core-entities/services")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(body.to_string())
        .create();

    let state = client(&server.url());
    let items = state.list(ResourceType::GatewayService, Some("cp1")).unwrap();
    assert!(items.is_empty());
}

#[test]
fn creates_a_portal_and_returns_its_remote_id() {
    let mut server = mockito::Server::new();
    let response = serde_json::json!({"id": "new-1", "labels": {"ref": "main"}, "name": "Main"});
    let _m = server
        .mock("POST", "/v2/portals")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(response.to_string())
        .create();

    let state = client(&server.url());
    let mut fields = serde_json::Map::new();
    fields.insert("name".to_string(), serde_json::Value::String("Main".to_string()));
    let created = state.create(ResourceType::Portal, None, fields).unwrap();
    assert_eq!(created.id, "new-1");
}

#[test]
fn updates_and_deletes_by_id() {
    let mut server = mockito::Server::new();
    let response = serde_json::json!({"id": "1", "labels": {"ref": "main"}, "name": "Renamed"});
    let _update = server
        .mock("PATCH", "/v2/portals/1")
        .with_status(200)
        .with_body(response.to_string())
        .create();
    let _delete = server.mock("DELETE", "/v2/portals/1").with_status(204).create();

    let state = client(&server.url());
    let mut fields = serde_json::Map::new();
    fields.insert("name".to_string(), serde_json::Value::String("Renamed".to_string()));
    let updated = state.update(ResourceType::Portal, "1", fields).unwrap();
    assert_eq!(updated.fields.get("name").unwrap(), "Renamed");
    state.delete(ResourceType::Portal, "1").unwrap();
}

#[test]
fn fetch_returns_none_for_an_empty_body() {
    let mut server = mockito::Server::new();
    let _m = server.mock("GET", "/v2/portals/missing").with_status(200).with_body("").create();

    let state = client(&server.url());
    assert!(state.fetch(ResourceType::Portal, "missing").unwrap().is_none());
}

#[test]
fn classifies_401_as_an_auth_error() {
    let mut server = mockito::Server::new();
    let _m = server.mock("GET", "/v2/portals/1").with_status(401).with_body("denied").create();

    let state = client(&server.url());
    let err = state.fetch(ResourceType::Portal, "1").unwrap_err();
    assert!(err.to_string().contains("authentication failed"));
}

#[test]
fn classifies_429_as_rate_limited() {
    let mut server = mockito::Server::new();
    let _m = server.mock("GET", "/v2/portals/1").with_status(429).with_body("slow down").create();

    let state = client(&server.url());
    let err = state.fetch(ResourceType::Portal, "1").unwrap_err();
    assert!(err.to_string().contains("rate limited"));
}

#[test]
fn classifies_409_as_a_conflict() {
    let mut server = mockito::Server::new();
    let _m = server.mock("POST", "/v2/portals").with_status(409).with_body("name already exists").create();

    let state = client(&server.url());
    let mut fields = serde_json::Map::new();
    fields.insert("name".to_string(), serde_json::Value::String("Main".to_string()));
    let err = state.create(ResourceType::Portal, None, fields).unwrap_err();
    assert!(err.to_string().contains("409"));
}

#[test]
fn classifies_5xx_as_a_server_error() {
    let mut server = mockito::Server::new();
    let _m = server.mock("GET", "/v2/portals/1").with_status(503).with_body("down").create();

    let state = client(&server.url());
    let err = state.fetch(ResourceType::Portal, "1").unwrap_err();
    assert!(err.to_string().contains("server error"));
}
