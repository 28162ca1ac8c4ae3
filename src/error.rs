use thiserror::Error;

use crate::models::Notice;

pub const GENERIC_FAILURE: &str = "Failed to send message. Please try again.";
pub const SESSION_EXPIRED: &str = "Session expired. Please submit the form again.";

/// Local input problems. None of these ever reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("verification token is missing")]
    MissingProofToken,

    #[error("authorization code is missing")]
    MissingAuthorizationCode,
}

impl ValidationError {
    pub fn corrective_text(&self) -> &'static str {
        match self {
            ValidationError::EmptyMessage => "Please enter a message.",
            ValidationError::MissingProofToken => "Please complete verification.",
            ValidationError::MissingAuthorizationCode => SESSION_EXPIRED,
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error("delivery rejected (HTTP {status})")]
    Rejected { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    pub fn notice(&self) -> Notice {
        match self {
            DeliveryError::Invalid(reason) => Notice::error(reason.corrective_text()),
            DeliveryError::Rejected { .. } | DeliveryError::Transport(_) => {
                Notice::error(GENERIC_FAILURE)
            }
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DeliveryError::Transport(format!("request timed out: {e}"))
        } else if e.is_connect() {
            DeliveryError::Transport(format!("connection failed: {e}"))
        } else {
            DeliveryError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingSecret(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoticeKind;

    #[test]
    fn only_validation_failures_are_specific() {
        let empty = DeliveryError::from(ValidationError::EmptyMessage).notice();
        assert_eq!(empty.kind, NoticeKind::Error);
        assert_eq!(empty.text, "Please enter a message.");

        let rejected = DeliveryError::Rejected { status: 403 }.notice();
        let transport = DeliveryError::Transport("boom".into()).notice();
        assert_eq!(rejected.text, GENERIC_FAILURE);
        assert_eq!(transport, rejected);
    }
}
