mod fixtures;

use license_agent::{Outcome, Transport};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn register_success_returns_node_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/node/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "message": "ok",
            "data": "abc123",
        })))
        .mount(&server)
        .await;

    let transport = Transport::new(server.uri()).unwrap();
    let machine_info = license_types::MachineInfo {
        hostname: Some("test-host".to_string()),
        ..Default::default()
    };

    match transport.register("some-code", &machine_info).await {
        Outcome::Success(node_id) => assert_eq!(node_id, "abc123"),
        _ => panic!("expected Success"),
    }
}

#[tokio::test]
async fn heartbeat_404_is_reported_as_rejected_with_that_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/node/heartbeat"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "not found: unknown node",
            "data": null,
        })))
        .mount(&server)
        .await;

    let transport = Transport::new(server.uri()).unwrap();
    match transport.heartbeat("unknown-node").await {
        Outcome::Rejected { code, .. } => assert_eq!(code, 404),
        _ => panic!("expected Rejected"),
    }
}

#[tokio::test]
async fn unreachable_server_is_reported_as_transport_failure() {
    let transport = Transport::new("http://127.0.0.1:1".to_string()).unwrap();
    match transport.heartbeat("whatever").await {
        Outcome::Transport(_) => {}
        _ => panic!("expected Transport"),
    }
}
