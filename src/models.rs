use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(default)]
    pub name: Option<String>,
    pub message: String,
}

impl SubmissionPayload {
    pub fn from_form(name: &str, message: &str) -> Self {
        let name = name.trim();
        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            message: message.trim().to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn fingerprint(&self) -> String {
        hash_json(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum RejectionCause {
    MISSING_INPUT,
    DECLINED,
    TRANSPORT_ERROR,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectionCause>,
}

impl VerificationResult {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            rejection: None,
        }
    }

    pub fn rejected(cause: RejectionCause) -> Self {
        Self {
            accepted: false,
            rejection: Some(cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    None,
    CaptchaToken(String),
    AuthorizationCode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum SubmissionStatus {
    IDLE,
    AWAITING_EXTERNAL_PROOF,
    DELIVERING,
    DELIVERED,
    FAILED,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSubmission {
    pub id: String,
    pub payload: SubmissionPayload,
    pub stored_at: String,
}

impl PendingSubmission {
    pub fn new(payload: SubmissionPayload) -> Self {
        Self {
            id: new_submission_id(),
            payload,
            stored_at: now_iso(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn new_submission_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash_str(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

pub fn hash_json(value: &impl Serialize) -> String {
    let serialized = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    hash_str(&serialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_input_is_trimmed_and_blank_name_dropped() {
        let payload = SubmissionPayload::from_form("   ", "  hi there \n");
        assert_eq!(payload.name, None);
        assert_eq!(payload.message, "hi there");
        assert_eq!(payload.display_name(), "");
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = SubmissionPayload::from_form("A", "hi");
        let b = SubmissionPayload::from_form("A", "hi!");
        assert_eq!(a.fingerprint(), SubmissionPayload::from_form(" A ", "hi").fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert!(a.fingerprint().starts_with("0x"));
        assert_eq!(a.fingerprint().len(), 66);
    }
}
