use std::time::Duration;

use homeauth_core::sync::{
    HttpPasswordSync, PasswordSyncSink, SyncError, SyncPayload,
};
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload() -> SyncPayload {
    SyncPayload {
        email: "bob".to_string(),
        current_password: "oldpw1".to_string(),
        new_password: "c2VhbGVkLXBhc3N3b3Jk".to_string(),
    }
}

fn sink(server: &MockServer, timeout: Duration) -> HttpPasswordSync {
    let endpoint = Url::parse(&format!("{}/sync", server.uri())).unwrap();
    HttpPasswordSync::new(endpoint, timeout).unwrap()
}

#[tokio::test]
async fn posts_camel_case_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "email": "bob",
            "currentPassword": "oldpw1",
            "newPassword": "c2VhbGVkLXBhc3N3b3Jk",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    sink(&server, Duration::from_secs(5))
        .push(&payload())
        .await
        .unwrap();
}

#[tokio::test]
async fn non_success_status_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(ResponseTemplate::new(403).set_body_string("nope"))
        .mount(&server)
        .await;

    let err = sink(&server, Duration::from_secs(5))
        .push(&payload())
        .await
        .unwrap_err();

    match err {
        SyncError::Rejected { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "nope");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn only_200_counts_as_delivered() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let err = sink(&server, Duration::from_secs(5))
        .push(&payload())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Rejected { status: 204, .. }));
}

#[tokio::test]
async fn slow_endpoint_hits_client_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let err = sink(&server, Duration::from_millis(100))
        .push(&payload())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Transport(ref inner) if inner.is_timeout()));
}
