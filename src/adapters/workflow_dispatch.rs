use crate::adapters::base::{require_authorization_code, require_message, ChannelKind, Delivery, DeliveryChannel};
use crate::adapters::github::GithubRepo;
use crate::error::DeliveryError;
use crate::models::{Proof, SubmissionPayload};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct WorkflowDispatchChannel {
    repo: GithubRepo,
    workflow: String,
    git_ref: String,
}

#[derive(Debug, Serialize)]
struct WorkflowBody<'a> {
    #[serde(rename = "ref")]
    git_ref: &'a str,
    inputs: WorkflowInputs<'a>,
}

#[derive(Debug, Serialize)]
struct WorkflowInputs<'a> {
    name: &'a str,
    message: &'a str,
    code: &'a str,
}

impl WorkflowDispatchChannel {
    pub fn new(repo: GithubRepo, workflow: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            repo,
            workflow: workflow.into(),
            git_ref: git_ref.into(),
        }
    }
}

#[async_trait]
impl DeliveryChannel for WorkflowDispatchChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WorkflowDispatch
    }

    async fn deliver(&self, payload: &SubmissionPayload, proof: &Proof) -> Result<Delivery, DeliveryError> {
        require_message(payload)?;
        let code = require_authorization_code(proof)?;
        let body = WorkflowBody {
            git_ref: &self.git_ref,
            inputs: WorkflowInputs {
                name: payload.display_name(),
                message: &payload.message,
                code,
            },
        };
        let path = format!("actions/workflows/{}/dispatches", self.workflow);
        self.repo.dispatch(&path, &body).await?;
        Ok(Delivery::sent(self.kind()))
    }
}
