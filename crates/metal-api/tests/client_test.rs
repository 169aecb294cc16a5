// Integration tests for `MetalClient` and `V2Client` using wiremock.
#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metal_api::models::{IpAllocateRequest, MachineFindRequest, ProjectCreateRequest};
use metal_api::{Credentials, Error, MetalClient, PowerAction, V2Client};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(credentials: Credentials) -> (MockServer, MetalClient) {
    let server = MockServer::start().await;
    let client =
        MetalClient::with_client(&server.uri(), reqwest::Client::new(), credentials).unwrap();
    (server, client)
}

fn bearer(token: &str) -> Credentials {
    Credentials::resolve(Some(token.to_string().into()), None, None)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_projects() {
    let (server, client) = setup(bearer("tok")).await;

    Mock::given(method("GET"))
        .and(path("/v1/project"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "name": "project-1", "tenant_id": "t1", "meta": { "id": "1" } },
            { "id": "2", "name": "project-2", "tenant_id": "t1" }
        ])))
        .mount(&server)
        .await;

    let projects = client.list_projects().await.unwrap();

    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].id, "1");
    assert_eq!(projects[0].name, "project-1");
    assert_eq!(projects[1].tenant_id, "t1");
}

#[tokio::test]
async fn test_find_machines_posts_filter() {
    let (server, client) = setup(Credentials::Anonymous).await;

    Mock::given(method("POST"))
        .and(path("/v1/machine/find"))
        .and(body_json(json!({ "partition_id": "fra-equ01" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "m1", "state": { "value": "", "description": "" } }
        ])))
        .mount(&server)
        .await;

    let find = MachineFindRequest {
        partition_id: Some("fra-equ01".into()),
        ..MachineFindRequest::default()
    };
    let machines = client.find_machines(&find).await.unwrap();

    assert_eq!(machines.len(), 1);
    assert_eq!(machines[0].id, "m1");
}

#[tokio::test]
async fn test_machine_power_path() {
    let (server, client) = setup(Credentials::Anonymous).await;

    Mock::given(method("POST"))
        .and(path("/v1/machine/m1/power/cycle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1" })))
        .expect(1)
        .mount(&server)
        .await;

    let machine = client.machine_power("m1", PowerAction::Cycle).await.unwrap();
    assert_eq!(machine.id, "m1");
}

#[tokio::test]
async fn test_allocate_specific_ip() {
    let (server, client) = setup(Credentials::Anonymous).await;

    Mock::given(method("POST"))
        .and(path("/v1/ip/allocate/10.0.0.1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "ipaddress": "10.0.0.1",
            "networkid": "internet",
            "projectid": "p1",
            "type": "static"
        })))
        .mount(&server)
        .await;

    let req = IpAllocateRequest {
        ipaddress: Some("10.0.0.1".into()),
        networkid: "internet".into(),
        projectid: "p1".into(),
        kind: "static".into(),
        ..IpAllocateRequest::default()
    };
    let ip = client.allocate_ip(&req).await.unwrap();

    assert_eq!(ip.ipaddress, "10.0.0.1");
    assert_eq!(ip.kind, "static");
}

#[tokio::test]
async fn test_list_images_with_usage() {
    let (server, client) = setup(Credentials::Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/image"))
        .and(query_param("show-usage", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "ubuntu-24.04", "url": "http://img", "features": ["machine"], "usedby": ["m1"] }
        ])))
        .mount(&server)
        .await;

    let images = client.list_images(true).await.unwrap();
    assert_eq!(images[0].usedby, vec!["m1".to_string()]);
}

// ── Auth tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_hmac_headers_are_sent() {
    let creds = Credentials::resolve(None, Some("secret".to_string().into()), None);
    let (server, client) = setup(creds).await;

    Mock::given(method("GET"))
        .and(path("/v1/version"))
        .and(header_exists("x-date"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "metal-api",
            "version": "v0.40.0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let version = client.version().await.unwrap();
    assert_eq!(version.version, "v0.40.0");
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_conflict_maps_to_typed_error() {
    let (server, client) = setup(Credentials::Anonymous).await;

    Mock::given(method("PUT"))
        .and(path("/v1/project"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "statuscode": 409, "message": "project already exists" })),
        )
        .mount(&server)
        .await;

    let req = ProjectCreateRequest {
        id: "1".into(),
        ..ProjectCreateRequest::default()
    };
    let err = client.create_project(&req).await.unwrap_err();

    assert!(err.is_conflict(), "expected conflict, got {err:?}");
    assert_eq!(err.status(), Some(409));
    assert!(err.to_string().contains("project already exists"));
}

#[tokio::test]
async fn test_not_found_maps_to_typed_error() {
    let (server, client) = setup(Credentials::Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/machine/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such machine"))
        .mount(&server)
        .await;

    let err = client.get_machine("missing").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, Error::NotFound { ref message } if message == "no such machine"));
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup(Credentials::Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.health().await.unwrap_err();

    assert!(matches!(err, Error::Api { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unauthorized() {
    let (server, client) = setup(bearer("expired")).await;

    Mock::given(method("GET"))
        .and(path("/v1/partition"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "token expired" })))
        .mount(&server)
        .await;

    let err = client.list_partitions().await.unwrap_err();
    assert!(matches!(err, Error::Authentication { status: 401, .. }));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup(Credentials::Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/size"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.list_sizes().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { ref body, .. } if body == "not json"));
}

// ── v2 ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_v2_version_uses_connect_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/metalstack.api.v2.VersionService/Get"))
        .and(header("authorization", "Bearer v2tok"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": { "version": "v0.1.0", "gitSha1": "abc" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = V2Client::with_client(
        &server.uri(),
        reqwest::Client::new(),
        Some("v2tok".to_string().into()),
    )
    .unwrap();
    let version = client.version().await.unwrap();

    assert_eq!(version.version, "v0.1.0");
    assert_eq!(version.git_sha1, "abc");
}
