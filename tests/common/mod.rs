#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Router,
};
use contact_relay::config::OAuthConfig;
use contact_relay::gateway::{build_router, GatewayState};
use contact_relay::TurnstileVerifier;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("recorded body is json")
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

#[derive(Clone)]
struct StubConfig {
    status: StatusCode,
    body: &'static str,
    delay: Duration,
    hits: Arc<Mutex<Vec<Recorded>>>,
}

/// A stand-in for an external HTTP service that answers every request the
/// same way and records what it saw.
pub struct Stub {
    pub base: String,
    hits: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
    pub fn hits(&self) -> Vec<Recorded> {
        self.hits.lock().expect("hits lock").clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

async fn record(State(stub): State<StubConfig>, uri: Uri, headers: HeaderMap, body: Bytes) -> (StatusCode, &'static str) {
    stub.hits.lock().expect("hits lock").push(Recorded {
        path: uri.path().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    (stub.status, stub.body)
}

pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

pub async fn spawn_stub(status: u16, body: &'static str) -> Stub {
    spawn_slow_stub(status, body, Duration::ZERO).await
}

pub async fn spawn_slow_stub(status: u16, body: &'static str, delay: Duration) -> Stub {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let config = StubConfig {
        status: StatusCode::from_u16(status).expect("status code"),
        body,
        delay,
        hits: Arc::clone(&hits),
    };
    let app = Router::new().fallback(record).with_state(config);
    let addr = serve(app).await;
    Stub {
        base: format!("http://{addr}"),
        hits,
    }
}

pub fn client_with_timeout(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("http client")
}

/// Runs the verification gateway against `siteverify`, returning its base URL.
pub async fn spawn_gateway(siteverify: &Stub, timeout: Duration) -> String {
    let verifier = TurnstileVerifier::new(client_with_timeout(timeout), siteverify.url("/siteverify"), "s3cret");
    let addr = serve(build_router(GatewayState::new(Arc::new(verifier)))).await;
    format!("http://{addr}")
}

pub fn oauth() -> OAuthConfig {
    OAuthConfig {
        client_id: "client-1".to_string(),
        redirect_uri: "https://example.dev/contact".to_string(),
        ..OAuthConfig::default()
    }
}
