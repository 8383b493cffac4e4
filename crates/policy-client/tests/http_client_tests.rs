//! Integration tests for the HTTP policy client.
//!
//! A wiremock server stands in for the policy service so that pagination,
//! authentication headers, action flattening and status mapping can be
//! checked against real HTTP round trips.

use policy_client::{
    ClientError, HttpPolicyClient, PolicyClient, ServiceConfig, ServiceEndpoint,
};
use policy_schema::EntityKind;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test fixture providing a mock policy service.
struct TestFixture {
    /// Mock policy service.
    server: MockServer,
    /// Configuration pointing at the mock server.
    config: ServiceConfig,
}

impl TestFixture {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let config = ServiceConfig {
            endpoint: ServiceEndpoint {
                base_url: server.uri(),
                api_key: Some("permit_key_test".to_string()),
            },
            project: "acme".to_string(),
            environment: "staging".to_string(),
            default_timeout_secs: 5,
            max_retries: 0,
            page_size: 2,
        };
        Self { server, config }
    }

    fn client(&self) -> HttpPolicyClient {
        HttpPolicyClient::new(self.config.clone()).expect("client should build")
    }
}

#[tokio::test]
async fn test_roles_are_paginated_until_short_page() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v2/schema/acme/staging/roles"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .and(header("Authorization", "Bearer permit_key_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "key": "admin", "name": "Admin" },
            { "key": "editor", "name": "Editor" }
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/schema/acme/staging/roles"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "key": "viewer", "name": "Viewer" }
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let roles = fixture
        .client()
        .list(EntityKind::Role)
        .await
        .expect("should list roles");

    let keys: Vec<&str> = roles.iter().filter_map(|r| r["key"].as_str()).collect();
    assert_eq!(keys, ["admin", "editor", "viewer"]);
}

#[tokio::test]
async fn test_wrapped_pages_are_unwrapped() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v2/schema/acme/staging/relations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "key": "parent", "name": "Parent", "subject_resource": "folder", "object_resource": "document" }
            ],
            "total_count": 1,
            "page_count": 1
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let relations = fixture.client().list(EntityKind::Relation).await.unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0]["subject_resource"], "folder");
}

#[tokio::test]
async fn test_actions_are_flattened_from_resources() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v2/schema/acme/staging/resources"))
        .and(query_param("include_built_in", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "key": "document",
                "name": "Document",
                "actions": { "read": { "name": "Read" } }
            }
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let actions = fixture.client().list(EntityKind::Action).await.unwrap();
    assert_eq!(
        actions,
        vec![json!({ "key": "read", "name": "Read", "resource": "document" })]
    );
}

#[tokio::test]
async fn test_condition_sets_are_filtered_by_type() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v2/schema/acme/staging/condition_sets"))
        .and(query_param("type", "userset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "key": "us_employees", "name": "Employees", "conditions": {} }
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/schema/acme/staging/condition_sets"))
        .and(query_param("type", "resourceset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let client = fixture.client();
    assert_eq!(client.list(EntityKind::UserSet).await.unwrap().len(), 1);
    assert!(client.list(EntityKind::ResourceSet).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_rules_come_from_facts_api() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v2/facts/acme/staging/set_rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "user_set": "__autogen_us_employees",
                "resource_set": "document_set",
                "permission": "document:read"
            }
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let rules = fixture
        .client()
        .list(EntityKind::ConditionSetRule)
        .await
        .unwrap();
    assert_eq!(rules[0]["permission"], "document:read");
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_failed() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v2/schema/acme/staging/roles"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let result = fixture.client().list(EntityKind::Role).await;
    assert!(matches!(result, Err(ClientError::AuthenticationFailed)));
}

#[tokio::test]
async fn test_server_error_is_transient_api_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v2/schema/acme/staging/resources/__user/attributes"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let err = fixture
        .client()
        .list(EntityKind::UserAttribute)
        .await
        .unwrap_err();
    match &err {
        ClientError::ApiError { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_non_array_body_is_invalid_response() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/v2/schema/acme/staging/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "roles": [] })))
        .mount(&fixture.server)
        .await;

    let result = fixture.client().list(EntityKind::Role).await;
    assert!(matches!(result, Err(ClientError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_ensure_ready_requires_api_key() {
    let fixture = TestFixture::new().await;
    assert!(fixture.client().ensure_ready().await.is_ok());

    let mut config = fixture.config.clone();
    config.endpoint.api_key = None;
    let client = HttpPolicyClient::new(config).unwrap();
    assert!(matches!(
        client.ensure_ready().await,
        Err(ClientError::NotConfigured(_))
    ));
}

#[tokio::test]
async fn test_unreachable_service_is_connection_failure() {
    let fixture = TestFixture::new().await;
    let mut config = fixture.config.clone();
    // Nothing listens on port 9 (discard) in the test environment.
    config.endpoint.base_url = "http://127.0.0.1:9".to_string();
    let client = HttpPolicyClient::new(config).unwrap();

    let err = client.list(EntityKind::Role).await.unwrap_err();
    assert!(err.is_connection_failure(), "unexpected error: {:?}", err);
}
