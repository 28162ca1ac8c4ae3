mod common;

use common::{client_with_timeout, spawn_gateway, spawn_slow_stub, spawn_stub};
use contact_relay::models::RejectionCause;
use contact_relay::{TokenVerifier, TurnstileVerifier};
use serde_json::{json, Value};
use std::time::Duration;

async fn post_contact(gateway: &str, body: &Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{gateway}/api/contact"))
        .json(body)
        .send()
        .await
        .expect("gateway reachable");
    let status = response.status().as_u16();
    (status, response.json().await.expect("gateway replies with json"))
}

#[tokio::test]
async fn accepted_token_yields_success() {
    let siteverify = spawn_stub(200, r#"{"success":true}"#).await;
    let gateway = spawn_gateway(&siteverify, Duration::from_secs(5)).await;

    let (status, body) = post_contact(&gateway, &json!({"name": "A", "message": "hi", "token": "tok-1"})).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"success": true}));

    let hits = siteverify.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "/siteverify");
    assert!(hits[0].body.contains("secret=s3cret"));
    assert!(hits[0].body.contains("response=tok-1"));
    assert_eq!(
        hits[0].header("content-type").as_deref(),
        Some("application/x-www-form-urlencoded")
    );
}

#[tokio::test]
async fn missing_fields_are_rejected_without_calling_siteverify() {
    let siteverify = spawn_stub(200, r#"{"success":true}"#).await;
    let gateway = spawn_gateway(&siteverify, Duration::from_secs(5)).await;

    for body in [
        json!({"name": "A", "message": "hi"}),
        json!({"name": "A", "message": "hi", "token": ""}),
        json!({"name": "A", "message": "   ", "token": "tok"}),
        json!({"token": "tok"}),
    ] {
        let (status, reply) = post_contact(&gateway, &body).await;
        assert_eq!(status, 400, "body {body}");
        assert_eq!(reply, json!({"success": false}));
    }
    assert!(siteverify.hits().is_empty());
}

#[tokio::test]
async fn declined_token_is_forbidden() {
    let siteverify = spawn_stub(200, r#"{"success":false,"error-codes":["invalid-input-response"]}"#).await;
    let gateway = spawn_gateway(&siteverify, Duration::from_secs(5)).await;

    let (status, reply) = post_contact(&gateway, &json!({"message": "hi", "token": "forged"})).await;
    assert_eq!(status, 403);
    assert_eq!(reply, json!({"success": false}));
}

#[tokio::test]
async fn unreadable_siteverify_reply_fails_closed() {
    let siteverify = spawn_stub(502, "<html>bad gateway</html>").await;
    let gateway = spawn_gateway(&siteverify, Duration::from_secs(5)).await;

    let (status, reply) = post_contact(&gateway, &json!({"message": "hi", "token": "tok"})).await;
    assert_eq!(status, 500);
    assert_eq!(reply, json!({"success": false}));
}

#[tokio::test]
async fn siteverify_timeout_fails_closed() {
    let siteverify = spawn_slow_stub(200, r#"{"success":true}"#, Duration::from_secs(2)).await;
    let gateway = spawn_gateway(&siteverify, Duration::from_millis(200)).await;

    let (status, reply) = post_contact(&gateway, &json!({"message": "hi", "token": "tok"})).await;
    assert_eq!(status, 500);
    assert_eq!(reply, json!({"success": false}));
}

#[tokio::test]
async fn malformed_request_body_is_an_internal_error() {
    let siteverify = spawn_stub(200, r#"{"success":true}"#).await;
    let gateway = spawn_gateway(&siteverify, Duration::from_secs(5)).await;

    let response = reqwest::Client::new()
        .post(format!("{gateway}/api/contact"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("gateway reachable");
    assert_eq!(response.status().as_u16(), 500);
    assert!(siteverify.hits().is_empty());
}

#[tokio::test]
async fn verifier_reports_rejection_cause() {
    let declined = spawn_stub(200, r#"{"success":false}"#).await;
    let verifier = TurnstileVerifier::new(client_with_timeout(Duration::from_secs(5)), declined.url("/siteverify"), "s3cret");
    let result = verifier.verify("tok", Some("203.0.113.7")).await;
    assert!(!result.accepted);
    assert_eq!(result.rejection, Some(RejectionCause::DECLINED));
    assert!(declined.hits()[0].body.contains("remoteip=203.0.113.7"));

    let unreachable = TurnstileVerifier::new(
        client_with_timeout(Duration::from_secs(2)),
        "http://127.0.0.1:9/siteverify",
        "s3cret",
    );
    let result = unreachable.verify("tok", None).await;
    assert!(!result.accepted);
    assert_eq!(result.rejection, Some(RejectionCause::TRANSPORT_ERROR));
}

#[tokio::test]
async fn health_endpoint_answers() {
    let siteverify = spawn_stub(200, r#"{"success":true}"#).await;
    let gateway = spawn_gateway(&siteverify, Duration::from_secs(5)).await;
    let body = reqwest::get(format!("{gateway}/healthz"))
        .await
        .expect("reachable")
        .text()
        .await
        .expect("text");
    assert_eq!(body, "ok");
}
