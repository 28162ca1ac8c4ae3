//! Shared plumbing for the GitHub dispatch channels.

use crate::error::DeliveryError;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// A repository plus the narrowly scoped token allowed to trigger it.
#[derive(Clone)]
pub struct GithubRepo {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubRepo {
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_base, self.owner, self.repo, path)
    }

    /// POSTs a dispatch body. Any 2xx counts as accepted; GitHub answers
    /// 204 No Content.
    pub async fn dispatch(&self, path: &str, body: &impl Serialize) -> Result<u16, DeliveryError> {
        let url = self.url(path);
        info!(target: "dispatch", %url, "sending dispatch");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(target: "dispatch", %status, %detail, "dispatch failed");
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }

        info!(target: "dispatch", %status, "dispatch triggered");
        Ok(status.as_u16())
    }
}

impl fmt::Debug for GithubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubRepo")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}
