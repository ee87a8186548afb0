//! Connection configuration.
//!
//! A [`ConnectionConfig`] captures everything needed to open a session
//! against one organization: the base URL, the credentials to apply, the
//! user agent, and the version negotiation policy.

use url::Url;

use crate::auth::Credentials;
use crate::error::{ClientError, Result};
use crate::version::VersionPolicy;

/// Default user agent, overridable per config.
const DEFAULT_USER_AGENT: &str = concat!("azdo-client/", env!("CARGO_PKG_VERSION"));

/// Configuration for a [`ClientSession`](crate::ClientSession).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Organization base URL, e.g. `https://dev.azure.com/fabrikam/`.
    /// Always normalized to end with a slash.
    pub base_url: Url,
    /// Credentials applied to every request, discovery included.
    pub credentials: Credentials,
    /// User agent sent by the built-in transport.
    pub user_agent: String,
    /// Version negotiation behavior.
    pub version_policy: VersionPolicy,
}

impl ConnectionConfig {
    /// Create a configuration for the given organization URL with anonymous
    /// credentials.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url: Url = base_url
            .parse()
            .map_err(|err| ClientError::Config(format!("invalid base URL: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base URL '{base_url}' cannot carry paths"
            )));
        }
        // Route templates join relative to the base; a missing trailing
        // slash would silently drop the last path segment.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            base_url,
            credentials: Credentials::Anonymous,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            version_policy: VersionPolicy::default(),
        })
    }

    /// Set the credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the user agent.
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Set the version negotiation policy.
    pub fn version_policy(mut self, policy: VersionPolicy) -> Self {
        self.version_policy = policy;
        self
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AZDO_ORG_URL`: organization base URL (required)
    /// - `AZDO_PAT`: personal access token
    /// - `AZDO_BEARER`: bearer token (used when no PAT is set)
    /// - `AZDO_USER_AGENT`: user agent override
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("AZDO_ORG_URL")
            .map_err(|_| ClientError::Config("AZDO_ORG_URL is not set".into()))?;
        let mut config = Self::new(&base_url)?;

        if let Ok(pat) = std::env::var("AZDO_PAT") {
            config.credentials = Credentials::Pat(pat);
        } else if let Ok(token) = std::env::var("AZDO_BEARER") {
            config.credentials = Credentials::Bearer(token);
        }

        if let Ok(user_agent) = std::env::var("AZDO_USER_AGENT") {
            config.user_agent = user_agent;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = ConnectionConfig::new("https://dev.azure.com/fabrikam").unwrap();
        assert_eq!(config.base_url.as_str(), "https://dev.azure.com/fabrikam/");
    }

    #[test]
    fn trailing_slash_is_kept() {
        let config = ConnectionConfig::new("https://dev.azure.com/fabrikam/").unwrap();
        assert_eq!(config.base_url.as_str(), "https://dev.azure.com/fabrikam/");
    }

    #[test]
    fn garbage_urls_are_rejected() {
        assert!(ConnectionConfig::new("not a url").is_err());
        assert!(ConnectionConfig::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn builder_methods_chain() {
        let config = ConnectionConfig::new("https://dev.azure.com/fabrikam")
            .unwrap()
            .credentials(Credentials::Pat("t".into()))
            .user_agent("tests/1.0");
        assert_eq!(config.user_agent, "tests/1.0");
        assert!(matches!(config.credentials, Credentials::Pat(_)));
    }
}
