//! TOML configuration for the gateway and the relay front end.
//!
//! Secrets never live in the file. The file names the environment variable
//! that carries each one (`secret_env`, `token_env`).

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";
pub const GITHUB_API: &str = "https://api.github.com";
pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub channel: Option<ChannelConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub verify_url: String,
    pub secret_env: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8788".to_string(),
            verify_url: TURNSTILE_VERIFY_URL.to_string(),
            secret_env: "TURNSTILE_SECRET".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub authorize_url: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorize_url: GITHUB_AUTHORIZE_URL.to_string(),
            client_id: String::new(),
            redirect_uri: String::new(),
            scope: "read:user".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 5,
            user_agent: concat!("contact-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Shared client for every outbound call. The transport timeout is the
    /// only timeout in the system.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .connect_timeout(self.connect_timeout())
            .user_agent(self.user_agent.clone())
            .build()
            .context("failed to create HTTP client")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelConfig {
    RepositoryDispatch(RepositoryDispatchConfig),
    WorkflowDispatch(WorkflowDispatchConfig),
    DirectRelay { endpoint: String },
    Mailto {
        address: String,
        #[serde(default = "default_mail_subject")]
        subject: String,
    },
}

impl ChannelConfig {
    pub fn is_identity_gated(&self) -> bool {
        matches!(
            self,
            ChannelConfig::RepositoryDispatch(_) | ChannelConfig::WorkflowDispatch(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryDispatchConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_event_type")]
    pub event_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowDispatchConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    pub workflow: String,
    #[serde(default = "default_git_ref", rename = "ref")]
    pub git_ref: String,
}

fn default_api_base() -> String {
    GITHUB_API.to_string()
}

fn default_token_env() -> String {
    "CONTACT_RELAY_TOKEN".to_string()
}

fn default_event_type() -> String {
    "contact_message".to_string()
}

fn default_git_ref() -> String {
    "main".to_string()
}

fn default_mail_subject() -> String {
    "Portfolio contact".to_string()
}

impl RelayConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("failed to load config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: RelayConfig = toml::from_str(text).context("failed to parse toml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(channel) = &self.channel else {
            return Ok(());
        };
        if channel.is_identity_gated() {
            if self.oauth.client_id.trim().is_empty() {
                return Err(ConfigError::Invalid("oauth.client_id is required".into()));
            }
            if self.oauth.redirect_uri.trim().is_empty() {
                return Err(ConfigError::Invalid("oauth.redirect_uri is required".into()));
            }
        }
        match channel {
            ChannelConfig::RepositoryDispatch(RepositoryDispatchConfig { owner, repo, .. })
            | ChannelConfig::WorkflowDispatch(WorkflowDispatchConfig { owner, repo, .. }) => {
                if owner.is_empty() || repo.is_empty() {
                    return Err(ConfigError::Invalid("channel owner and repo are required".into()));
                }
            }
            ChannelConfig::DirectRelay { endpoint } => {
                reqwest::Url::parse(endpoint)
                    .map_err(|e| ConfigError::Invalid(format!("channel.endpoint: {e}")))?;
            }
            ChannelConfig::Mailto { address, .. } => {
                if !address.contains('@') {
                    return Err(ConfigError::Invalid(format!(
                        "channel.address is not an email address: {address:?}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn channel(&self) -> Result<&ChannelConfig, ConfigError> {
        self.channel
            .as_ref()
            .ok_or_else(|| ConfigError::Invalid("no [channel] table configured".into()))
    }
}

pub fn resolve_secret(env_name: &str) -> Result<String, ConfigError> {
    match std::env::var(env_name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingSecret(env_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_dispatch_config_fills_defaults() {
        let config = RelayConfig::from_toml(
            r#"
            [oauth]
            client_id = "Ov23liExample"
            redirect_uri = "https://example.dev/contact"

            [channel]
            kind = "repository_dispatch"
            owner = "someone"
            repo = "portfolio-contact-relay"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.oauth.scope, "read:user");
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
        match config.channel().expect("channel") {
            ChannelConfig::RepositoryDispatch(c) => {
                assert_eq!(c.api_base, GITHUB_API);
                assert_eq!(c.event_type, "contact_message");
                assert_eq!(c.token_env, "CONTACT_RELAY_TOKEN");
            }
            other => panic!("unexpected channel {other:?}"),
        }
    }

    #[test]
    fn workflow_dispatch_reads_ref() {
        let config = RelayConfig::from_toml(
            r#"
            [oauth]
            client_id = "id"
            redirect_uri = "https://example.dev/"

            [channel]
            kind = "workflow_dispatch"
            owner = "someone"
            repo = "relay"
            workflow = "contact.yml"
            ref = "release"
            "#,
        )
        .expect("config should parse");
        let Some(ChannelConfig::WorkflowDispatch(c)) = config.channel else {
            panic!("expected workflow dispatch");
        };
        assert_eq!(c.git_ref, "release");
    }

    #[test]
    fn identity_gated_channel_requires_oauth_client() {
        let err = RelayConfig::from_toml(
            r#"
            [channel]
            kind = "repository_dispatch"
            owner = "someone"
            repo = "relay"
            "#,
        )
        .expect_err("missing client id must fail");
        assert!(format!("{err:#}").contains("oauth.client_id"));
    }

    #[test]
    fn gateway_only_config_needs_no_channel() {
        let config = RelayConfig::from_toml("[gateway]\nbind = \"0.0.0.0:9000\"\n").expect("parse");
        assert_eq!(config.gateway.bind, "0.0.0.0:9000");
        assert_eq!(config.gateway.verify_url, TURNSTILE_VERIFY_URL);
        assert!(config.channel().is_err());
    }

    #[test]
    fn mailto_rejects_bad_address() {
        assert!(RelayConfig::from_toml(
            "[channel]\nkind = \"mailto\"\naddress = \"nobody\"\n"
        )
        .is_err());
    }

    #[test]
    fn missing_secret_is_reported_by_name() {
        let err = resolve_secret("CONTACT_RELAY_TEST_UNSET_SECRET").expect_err("unset");
        assert_eq!(
            err.to_string(),
            "environment variable CONTACT_RELAY_TEST_UNSET_SECRET is not set"
        );
    }
}
