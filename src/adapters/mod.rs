pub mod base;
pub mod direct_relay;
pub mod github;
pub mod mailto;
pub mod repository_dispatch;
pub mod workflow_dispatch;

pub use base::{ChannelKind, Delivery, DeliveryChannel, ProofGate};
pub use direct_relay::DirectRelayChannel;
pub use github::GithubRepo;
pub use mailto::MailtoChannel;
pub use repository_dispatch::RepositoryDispatchChannel;
pub use workflow_dispatch::WorkflowDispatchChannel;

use crate::config::{resolve_secret, ChannelConfig};
use crate::error::ConfigError;
use std::sync::Arc;

pub fn build_channel(config: &ChannelConfig, http: reqwest::Client) -> Result<Arc<dyn DeliveryChannel>, ConfigError> {
    let channel: Arc<dyn DeliveryChannel> = match config {
        ChannelConfig::RepositoryDispatch(c) => {
            let token = resolve_secret(&c.token_env)?;
            let repo = GithubRepo::new(http, &c.api_base, &c.owner, &c.repo, token);
            Arc::new(RepositoryDispatchChannel::new(repo, &c.event_type))
        }
        ChannelConfig::WorkflowDispatch(c) => {
            let token = resolve_secret(&c.token_env)?;
            let repo = GithubRepo::new(http, &c.api_base, &c.owner, &c.repo, token);
            Arc::new(WorkflowDispatchChannel::new(repo, &c.workflow, &c.git_ref))
        }
        ChannelConfig::DirectRelay { endpoint } => Arc::new(DirectRelayChannel::new(http, endpoint)),
        ChannelConfig::Mailto { address, subject } => Arc::new(MailtoChannel::new(address, subject)),
    };
    Ok(channel)
}
