//! Error types for the client runtime.
//!
//! Every failure a call-site can observe is one variant of [`ClientError`].
//! Variants keep enough structure (status code, requested vs. supported
//! version, offending placeholder) for callers to branch programmatically
//! instead of matching on message strings.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Result type using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors produced by the client runtime.
///
/// None of these are retried internally; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Credentials could not be turned into request headers.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The discovery call for an area failed or returned malformed data.
    ///
    /// Not cached: the next call touching the area retries discovery.
    #[error("location discovery failed for area '{area}': {reason}")]
    AreaDiscovery { area: String, reason: String },

    /// The area was discovered but carries no resource with this id.
    #[error("resource '{resource}' is not registered in area '{area}'")]
    UnknownResource { area: String, resource: String },

    /// Version negotiation failed: the requested api-version cannot be
    /// satisfied by the resolved resource.
    #[error("api-version '{requested}' is not supported here (resource supports {min} through {max})")]
    UnsupportedApiVersion {
        requested: String,
        min: String,
        max: String,
    },

    /// A route template placeholder had no supplied value. Raised before any
    /// network I/O happens.
    #[error("no route value supplied for '{{{placeholder}}}' in template '{template}'")]
    IncompleteRoute {
        placeholder: String,
        template: String,
    },

    /// The server answered the call with a non-success status code.
    ///
    /// The body is decoded as JSON when possible so callers can inspect the
    /// service's error contract without re-parsing.
    #[error("server returned {status}")]
    Http { status: StatusCode, body: Value },

    /// The transport failed before a response was produced (connect failure,
    /// TLS, timeout). Treated exactly like an HTTP failure for propagation.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response payload did not have the promised top-level shape.
    #[error("malformed response payload: {0}")]
    Format(String),
}

impl ClientError {
    /// Status code of the failed call, if the server produced a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Server-provided error message, if the response body carried one.
    ///
    /// The service reports failures as `{"message": "...", "typeKey": ...}`.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Http { body, .. } => body.get("message").and_then(Value::as_str),
            _ => None,
        }
    }

    /// True for failures where the resource simply was not there.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
