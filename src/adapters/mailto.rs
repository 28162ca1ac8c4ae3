use crate::adapters::base::{require_message, ChannelKind, Delivery, DeliveryChannel};
use crate::error::DeliveryError;
use crate::models::{Proof, SubmissionPayload};
use async_trait::async_trait;
use std::fmt::Write;

/// Hands the message to the local mail client. Never touches the network.
#[derive(Debug, Clone)]
pub struct MailtoChannel {
    address: String,
    subject: String,
}

impl MailtoChannel {
    pub fn new(address: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            subject: subject.into(),
        }
    }

    pub fn compose_uri(&self, payload: &SubmissionPayload) -> String {
        let body = match &payload.name {
            Some(name) => format!("From: {name}\n\n{}", payload.message),
            None => payload.message.clone(),
        };
        format!(
            "mailto:{}?subject={}&body={}",
            self.address,
            encode_component(&self.subject),
            encode_component(&body)
        )
    }
}

#[async_trait]
impl DeliveryChannel for MailtoChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Mailto
    }

    async fn deliver(&self, payload: &SubmissionPayload, _proof: &Proof) -> Result<Delivery, DeliveryError> {
        require_message(payload)?;
        Ok(Delivery {
            channel: self.kind(),
            compose_uri: Some(self.compose_uri(payload)),
        })
    }
}

/// Percent-encodes everything except the RFC 3986 unreserved set and the
/// sub-delims mail clients leave alone (`!*'()`). Spaces become `%20`.
fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'!' | b'*' | b'\'' | b'(' | b')' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}
