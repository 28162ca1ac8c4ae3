use crate::error::{DeliveryError, ValidationError};
use crate::models::{Proof, SubmissionPayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    RepositoryDispatch,
    WorkflowDispatch,
    DirectRelay,
    Mailto,
}

/// What the user has to prove before a channel will deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofGate {
    Identity,
    Captcha,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: ChannelKind,
    pub compose_uri: Option<String>,
}

impl Delivery {
    pub fn sent(channel: ChannelKind) -> Self {
        Self {
            channel,
            compose_uri: None,
        }
    }
}

#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    fn gate(&self) -> ProofGate {
        match self.kind() {
            ChannelKind::RepositoryDispatch | ChannelKind::WorkflowDispatch => ProofGate::Identity,
            ChannelKind::DirectRelay => ProofGate::Captcha,
            ChannelKind::Mailto => ProofGate::Open,
        }
    }

    fn success_notice(&self) -> &'static str {
        match self.gate() {
            ProofGate::Identity => "Message sent! You'll receive a confirmation issue shortly.",
            ProofGate::Captcha => "Message sent!",
            ProofGate::Open => "Opening your mail client…",
        }
    }

    /// Makes exactly one delivery attempt. Input problems are reported before
    /// anything leaves the process.
    async fn deliver(&self, payload: &SubmissionPayload, proof: &Proof) -> Result<Delivery, DeliveryError>;
}

pub fn require_message(payload: &SubmissionPayload) -> Result<(), ValidationError> {
    if payload.message.trim().is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    Ok(())
}

pub fn require_authorization_code(proof: &Proof) -> Result<&str, ValidationError> {
    match proof {
        Proof::AuthorizationCode(code) if !code.trim().is_empty() => Ok(code.as_str()),
        _ => Err(ValidationError::MissingAuthorizationCode),
    }
}

pub fn require_captcha_token(proof: &Proof) -> Result<&str, ValidationError> {
    match proof {
        Proof::CaptchaToken(token) if !token.trim().is_empty() => Ok(token.as_str()),
        _ => Err(ValidationError::MissingProofToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proof_requirements() {
        assert_eq!(
            require_authorization_code(&Proof::AuthorizationCode("abc".into())),
            Ok("abc")
        );
        assert_eq!(
            require_authorization_code(&Proof::CaptchaToken("abc".into())),
            Err(ValidationError::MissingAuthorizationCode)
        );
        assert_eq!(
            require_captcha_token(&Proof::CaptchaToken(" ".into())),
            Err(ValidationError::MissingProofToken)
        );
        assert_eq!(
            require_message(&SubmissionPayload::from_form("A", "")),
            Err(ValidationError::EmptyMessage)
        );
    }
}
