//! HTTP front of the verification gateway.
//!
//! `POST /api/contact` takes `{ name?, message, token }` and answers
//! `{ "success": bool }`: 200 when the token verifies, 400 when a required
//! field is missing, 403 when the verification service declines, 500 for
//! anything else.

use crate::models::{RejectionCause, SubmissionPayload};
use crate::verifier::TokenVerifier;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const CONTACT_ROUTE: &str = "/api/contact";

#[derive(Clone)]
pub struct GatewayState {
    verifier: Arc<dyn TokenVerifier>,
}

impl GatewayState {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }
}

#[derive(Debug, Deserialize)]
struct ContactRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route(CONTACT_ROUTE, post(contact))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

async fn contact(State(state): State<GatewayState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let status = decide(&state, &headers, &body).await;
    let success = status == StatusCode::OK;
    (status, Json(serde_json::json!({ "success": success })))
}

async fn decide(state: &GatewayState, headers: &HeaderMap, body: &[u8]) -> StatusCode {
    let request: ContactRequest = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(err) => {
            warn!(target: "gateway", "unreadable request body: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    let payload = SubmissionPayload::from_form(
        request.name.as_deref().unwrap_or(""),
        request.message.as_deref().unwrap_or(""),
    );
    let token = request.token.unwrap_or_default();
    if payload.message.is_empty() || token.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }

    let remote_ip = headers
        .get("cf-connecting-ip")
        .and_then(|v| v.to_str().ok());
    let result = state.verifier.verify(&token, remote_ip).await;
    if result.accepted {
        info!(
            target: "gateway",
            fingerprint = %payload.fingerprint(),
            has_name = payload.name.is_some(),
            "contact message accepted"
        );
        return StatusCode::OK;
    }

    match result.rejection {
        Some(RejectionCause::MISSING_INPUT) => StatusCode::BAD_REQUEST,
        Some(RejectionCause::DECLINED) => StatusCode::FORBIDDEN,
        Some(RejectionCause::TRANSPORT_ERROR) | None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
