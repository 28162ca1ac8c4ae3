use crate::adapters::base::{require_authorization_code, require_message, ChannelKind, Delivery, DeliveryChannel};
use crate::adapters::github::GithubRepo;
use crate::error::DeliveryError;
use crate::models::{Proof, SubmissionPayload};
use async_trait::async_trait;
use serde::Serialize;

/// Fires a `repository_dispatch` event. The workflow on the other end trades
/// the authorization code for an identity and files the issue.
#[derive(Debug, Clone)]
pub struct RepositoryDispatchChannel {
    repo: GithubRepo,
    event_type: String,
}

#[derive(Debug, Serialize)]
struct DispatchBody<'a> {
    event_type: &'a str,
    client_payload: ClientPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ClientPayload<'a> {
    code: &'a str,
    name: &'a str,
    message: &'a str,
}

impl RepositoryDispatchChannel {
    pub fn new(repo: GithubRepo, event_type: impl Into<String>) -> Self {
        Self {
            repo,
            event_type: event_type.into(),
        }
    }
}

#[async_trait]
impl DeliveryChannel for RepositoryDispatchChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::RepositoryDispatch
    }

    async fn deliver(&self, payload: &SubmissionPayload, proof: &Proof) -> Result<Delivery, DeliveryError> {
        require_message(payload)?;
        let code = require_authorization_code(proof)?;
        let body = DispatchBody {
            event_type: &self.event_type,
            client_payload: ClientPayload {
                code,
                name: payload.display_name(),
                message: &payload.message,
            },
        };
        self.repo.dispatch("dispatches", &body).await?;
        Ok(Delivery::sent(self.kind()))
    }
}
