//! Credential application for outgoing requests.
//!
//! The runtime never acquires credentials; it applies whatever it was
//! constructed with. The seam is [`AuthHandler`] so callers can plug in
//! token brokers of their own; [`Credentials`] covers the schemes the
//! service accepts out of the box.

use std::fmt;

use async_trait::async_trait;
use base64::prelude::{Engine, BASE64_STANDARD};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::{ClientError, Result};

/// Augments request headers with credentials before each send.
#[async_trait]
pub trait AuthHandler: Send + Sync {
    /// Mutate the headers for one outgoing request. Called once per request,
    /// including discovery calls.
    async fn apply(&self, headers: &mut HeaderMap) -> Result<()>;
}

/// Built-in credential schemes.
#[derive(Clone)]
pub enum Credentials {
    /// No `Authorization` header; for anonymous/public access.
    Anonymous,
    /// Personal access token, sent as HTTP basic with an empty user name.
    Pat(String),
    /// OAuth bearer token.
    Bearer(String),
}

impl Credentials {
    fn header_value(&self) -> Result<Option<HeaderValue>> {
        let raw = match self {
            Credentials::Anonymous => return Ok(None),
            Credentials::Pat(token) => {
                format!("Basic {}", BASE64_STANDARD.encode(format!(":{token}")))
            }
            Credentials::Bearer(token) => format!("Bearer {token}"),
        };
        let mut value = HeaderValue::from_str(&raw)
            .map_err(|_| ClientError::Auth("credential contains invalid header bytes".into()))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

#[async_trait]
impl AuthHandler for Credentials {
    async fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        if let Some(value) = self.header_value()? {
            headers.insert(AUTHORIZATION, value);
        }
        Ok(())
    }
}

// Security: never print token material, even at trace level.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => write!(f, "Credentials::Anonymous"),
            Credentials::Pat(_) => write!(f, "Credentials::Pat(***)"),
            Credentials::Bearer(_) => write!(f, "Credentials::Bearer(***)"),
        }
    }
}
