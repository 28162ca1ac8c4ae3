//! GitHub OAuth redirect helpers. The code exchange itself happens in the
//! remote workflow, never here.

use crate::config::OAuthConfig;
use crate::error::ConfigError;
use reqwest::Url;

pub fn authorize_url(config: &OAuthConfig) -> Result<String, ConfigError> {
    let url = Url::parse_with_params(
        &config.authorize_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("scope", config.scope.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ],
    )
    .map_err(|e| ConfigError::Invalid(format!("oauth.authorize_url: {e}")))?;
    Ok(url.into())
}

/// Pulls a non-empty `code` out of the URL the provider redirected back to.
/// Accepts a full URL, one pasted without its scheme, or a bare `?query`.
pub fn callback_code(return_url: &str) -> Option<String> {
    let query = match Url::parse(return_url) {
        Ok(url) => url.query().map(str::to_string)?,
        Err(_) => {
            let (_, rest) = return_url.trim().split_once('?')?;
            rest.split('#').next().unwrap_or_default().to_string()
        }
    };
    Url::parse(&format!("http://callback/?{query}"))
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .filter(|code| !code.is_empty())
}

/// The return URL with query and fragment removed, as shown after the
/// callback is consumed.
pub fn clean_return_url(return_url: &str) -> String {
    match Url::parse(return_url) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.into()
        }
        Err(_) => return_url.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_client_scope_and_redirect() {
        let config = OAuthConfig {
            client_id: "Ov23liExample".to_string(),
            redirect_uri: "https://example.dev/contact/".to_string(),
            ..OAuthConfig::default()
        };
        let url = Url::parse(&authorize_url(&config).expect("url")).expect("parse");
        assert_eq!(url.host_str(), Some("github.com"));
        assert_eq!(url.path(), "/login/oauth/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("client_id".to_string(), "Ov23liExample".to_string()),
                ("scope".to_string(), "read:user".to_string()),
                ("redirect_uri".to_string(), "https://example.dev/contact/".to_string()),
            ]
        );
    }

    #[test]
    fn callback_code_extraction() {
        assert_eq!(
            callback_code("https://example.dev/contact?code=abc123&state=x").as_deref(),
            Some("abc123")
        );
        assert_eq!(callback_code("?code=xyz").as_deref(), Some("xyz"));
        assert_eq!(callback_code("example.dev/contact?code=abc#top").as_deref(), Some("abc"));
        assert_eq!(callback_code("https://example.dev/contact"), None);
        assert_eq!(callback_code("https://example.dev/contact?code="), None);
        assert_eq!(callback_code("not a url"), None);
    }

    #[test]
    fn return_url_is_cleaned() {
        assert_eq!(
            clean_return_url("https://example.dev/contact?code=abc#top"),
            "https://example.dev/contact"
        );
    }
}
