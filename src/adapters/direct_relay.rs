use crate::adapters::base::{require_captcha_token, require_message, ChannelKind, Delivery, DeliveryChannel};
use crate::error::DeliveryError;
use crate::models::{Proof, SubmissionPayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DirectRelayChannel {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct RelayBody<'a> {
    name: &'a str,
    message: &'a str,
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RelayReply {
    success: bool,
}

impl DirectRelayChannel {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl DeliveryChannel for DirectRelayChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::DirectRelay
    }

    async fn deliver(&self, payload: &SubmissionPayload, proof: &Proof) -> Result<Delivery, DeliveryError> {
        require_message(payload)?;
        let token = require_captcha_token(proof)?;
        let body = RelayBody {
            name: payload.display_name(),
            message: &payload.message,
            token,
        };

        info!(target: "dispatch", endpoint = %self.endpoint, "posting to relay endpoint");
        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(target: "dispatch", %status, "relay endpoint refused the message");
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }

        let reply: RelayReply = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(format!("invalid relay response: {e}")))?;
        if !reply.success {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(Delivery::sent(self.kind()))
    }
}
