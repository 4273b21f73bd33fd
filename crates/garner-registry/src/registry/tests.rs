//! Unit tests for the repository registry

use super::*;

use std::str::FromStr;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::layout::LayoutKind;

const WIDGET_DESCRIPTOR: &str = r#"{"group":"org.example","name":"widget","version":"1.0"}"#;
const WIDGET_DESCRIPTOR_PATH: &str = "/org/example/widget/1.0/widget-1.0.json";
const WIDGET_ARTIFACT_PATH: &str = "/org/example/widget/1.0/widget-1.0.jar";

fn coordinate() -> Coordinate {
    Coordinate::from_str("org.example:widget:1.0").unwrap()
}

fn repository(id: &str, base: &str) -> Repository {
    Repository::builder()
        .id(id)
        .url(base)
        .layout(LayoutKind::Maven2)
        .build()
        .unwrap()
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 1,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        multiplier: 2.0,
    }
}

async fn registry_over(servers: &[(&str, &MockServer)]) -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::with_retry_config(fast_retry());
    for (id, server) in servers {
        registry.register(repository(id, &server.uri())).unwrap();
    }
    registry
}

#[test]
fn test_duplicate_id_is_rejected() {
    let mut registry = RepositoryRegistry::new();
    registry
        .register(repository("central", "https://a.example"))
        .unwrap();
    let err = registry
        .register(repository("central", "https://b.example"))
        .unwrap_err();
    assert!(matches!(err, GarnerError::ConfigValidation { .. }));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_registration_order_is_priority_order() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(WIDGET_DESCRIPTOR_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(WIDGET_DESCRIPTOR, "application/json"),
        )
        .expect(1)
        .mount(&first)
        .await;
    // The lower-priority repository must never be consulted
    Mock::given(method("GET"))
        .and(path(WIDGET_DESCRIPTOR_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(WIDGET_DESCRIPTOR, "application/json"),
        )
        .expect(0)
        .mount(&second)
        .await;

    let registry = registry_over(&[("first", &first), ("second", &second)]).await;
    let coordinate = coordinate();
    let (supplier, _) = registry.locate(&coordinate).await.unwrap();
    assert_eq!(supplier.id(), "first");
}

#[tokio::test]
async fn test_fallthrough_to_next_repository() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    // Missing from the first repository: one attempt, no retry
    Mock::given(method("GET"))
        .and(path(WIDGET_ARTIFACT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&first)
        .await;
    Mock::given(method("GET"))
        .and(path(WIDGET_ARTIFACT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"artifact bytes".to_vec()))
        .expect(1)
        .mount(&second)
        .await;

    let registry = registry_over(&[("first", &first), ("second", &second)]).await;
    let bytes = registry.fetch_artifact(&coordinate()).await.unwrap();
    assert_eq!(bytes, b"artifact bytes");
}

#[tokio::test]
async fn test_transport_failure_retried_within_bound_then_falls_through() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    // One initial attempt plus exactly one retry, never more
    Mock::given(method("GET"))
        .and(path(WIDGET_ARTIFACT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&first)
        .await;
    Mock::given(method("GET"))
        .and(path(WIDGET_ARTIFACT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"from-second".to_vec()))
        .expect(1)
        .mount(&second)
        .await;

    let registry = registry_over(&[("first", &first), ("second", &second)]).await;
    let bytes = registry.fetch_artifact(&coordinate()).await.unwrap();
    assert_eq!(bytes, b"from-second");
}

#[tokio::test]
async fn test_not_found_lists_all_attempted_repositories() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    for server in [&first, &second] {
        Mock::given(method("GET"))
            .and(path(WIDGET_DESCRIPTOR_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(server)
            .await;
    }

    let registry = registry_over(&[("first", &first), ("second", &second)]).await;
    let err = registry.locate(&coordinate()).await.unwrap_err();
    match err {
        GarnerError::NotFound { attempted, .. } => {
            assert_eq!(attempted, vec!["first".to_string(), "second".to_string()]);
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_descriptor_is_fatal_without_fallthrough() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(WIDGET_DESCRIPTOR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{ not json", "application/json"))
        .mount(&first)
        .await;
    // A data-correctness failure must not consult the next repository
    Mock::given(method("GET"))
        .and(path(WIDGET_DESCRIPTOR_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(WIDGET_DESCRIPTOR, "application/json"),
        )
        .expect(0)
        .mount(&second)
        .await;

    let registry = registry_over(&[("first", &first), ("second", &second)]).await;
    let err = registry.fetch_descriptor(&coordinate()).await.unwrap_err();
    assert!(matches!(err, GarnerError::DescriptorParse { .. }));
}

#[tokio::test]
async fn test_versions_unions_across_repositories() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/org/example/widget/versions.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"group":"org.example","name":"widget","versions":["1.0","1.5"]}"#,
            "application/json",
        ))
        .mount(&first)
        .await;
    Mock::given(method("GET"))
        .and(path("/org/example/widget/versions.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"group":"org.example","name":"widget","versions":["1.5","2.0"]}"#,
            "application/json",
        ))
        .mount(&second)
        .await;

    let registry = registry_over(&[("first", &first), ("second", &second)]).await;
    let versions = registry.versions("org.example", "widget").await.unwrap();
    let rendered: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, vec!["1.0", "1.5", "2.0"]);
}

#[tokio::test]
async fn test_versions_tolerates_missing_index() {
    let first = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/org/example/widget/versions.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&first)
        .await;

    let registry = registry_over(&[("first", &first)]).await;
    let versions = registry.versions("org.example", "widget").await.unwrap();
    assert!(versions.is_empty());
}
