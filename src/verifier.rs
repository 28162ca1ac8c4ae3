use crate::models::{RejectionCause, VerificationResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

/// Decides whether a CAPTCHA proof token belongs to a human.
///
/// Implementations fail closed: anything other than an explicit yes from the
/// verification service is a rejection.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> VerificationResult;
}

/// Cloudflare Turnstile `siteverify` client.
#[derive(Clone)]
pub struct TurnstileVerifier {
    http: reqwest::Client,
    verify_url: String,
    secret: String,
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl TurnstileVerifier {
    pub fn new(http: reqwest::Client, verify_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            http,
            verify_url: verify_url.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for TurnstileVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnstileVerifier")
            .field("verify_url", &self.verify_url)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> VerificationResult {
        if token.trim().is_empty() {
            return VerificationResult::rejected(RejectionCause::MISSING_INPUT);
        }

        let mut form = vec![("secret", self.secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = match self.http.post(&self.verify_url).form(&form).send().await {
            Ok(v) => v,
            Err(err) => {
                warn!(target: "gateway", "siteverify request failed: {err}");
                return VerificationResult::rejected(RejectionCause::TRANSPORT_ERROR);
            }
        };

        let status = response.status();
        let body: SiteverifyResponse = match response.json().await {
            Ok(v) => v,
            Err(err) => {
                warn!(target: "gateway", %status, "siteverify returned an unreadable body: {err}");
                return VerificationResult::rejected(RejectionCause::TRANSPORT_ERROR);
            }
        };

        if body.success {
            debug!(target: "gateway", "token accepted");
            VerificationResult::accepted()
        } else {
            debug!(target: "gateway", error_codes = ?body.error_codes, "token declined");
            VerificationResult::rejected(RejectionCause::DECLINED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_token_is_rejected_without_a_request() {
        // Nothing listens on this address; reaching the network would yield
        // TRANSPORT_ERROR instead of MISSING_INPUT.
        let verifier = TurnstileVerifier::new(reqwest::Client::new(), "http://127.0.0.1:9/siteverify", "s3cret");
        for token in ["", "   "] {
            let result = verifier.verify(token, None).await;
            assert!(!result.accepted);
            assert_eq!(result.rejection, Some(RejectionCause::MISSING_INPUT));
        }
    }

    #[test]
    fn debug_output_hides_secret() {
        let verifier = TurnstileVerifier::new(reqwest::Client::new(), "http://localhost/", "s3cret");
        let rendered = format!("{verifier:?}");
        assert!(!rendered.contains("s3cret"));
    }
}
