//! Client session facade.
//!
//! [`ClientSession`] is the per-connection entry point the generated
//! call-sites talk to. One call flows registry lookup → version negotiation
//! → request building → invocation → response formatting; the session owns
//! the only shared state (the location registry) and is safe to share across
//! tasks by reference or `Arc`. Construct once per server connection, drop
//! to tear down; a fresh session is the way to pick up server-side route
//! changes.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::AuthHandler;
use crate::config::ConnectionConfig;
use crate::error::{ClientError, Result};
use crate::format;
use crate::http::{HttpInvoker, RawResponse, ReqwestTransport, Transport};
use crate::locations::LocationRegistry;
use crate::request::{self, CallSpec};
use crate::version::{negotiate, ApiVersion};

/// Continuation-token header used by the service's paged list endpoints.
const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";
const CONTINUATION_PARAM: &str = "continuationToken";

/// A long-lived session against one organization.
pub struct ClientSession {
    config: ConnectionConfig,
    invoker: HttpInvoker,
    registry: LocationRegistry,
}

impl ClientSession {
    /// Open a session using the built-in reqwest transport.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.user_agent)?);
        Self::with_transport(config, transport)
    }

    /// Open a session over a custom transport (tests, instrumentation,
    /// recording proxies).
    pub fn with_transport(config: ConnectionConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let auth: Arc<dyn AuthHandler> = Arc::new(config.credentials.clone());
        let invoker = HttpInvoker::new(transport, auth);
        let registry = LocationRegistry::new(config.base_url.clone(), invoker.clone());
        Ok(Self {
            config,
            invoker,
            registry,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Correlation id stamped on every request of this session.
    pub fn session_id(&self) -> &str {
        self.invoker.session_id()
    }

    /// Issue one call and return the formatted payload.
    ///
    /// This is the full pipeline: resolve the location, negotiate the
    /// api-version, build the request, invoke it, decode the body, and walk
    /// it against the call's TypeInfo (pass-through when none was given).
    /// Empty and `204 No Content` responses decode to `Value::Null`.
    pub async fn call(&self, spec: CallSpec<'_>) -> Result<Value> {
        let response = self.dispatch(&spec).await?;
        let value = decode_json(&response)?;
        format::format(value, spec.type_info, spec.is_collection)
    }

    /// [`call`](Self::call) followed by deserialization into a contract
    /// type. The typed path used by generated call-sites.
    pub async fn call_for<T: DeserializeOwned>(&self, spec: CallSpec<'_>) -> Result<T> {
        let value = self.call(spec).await?;
        serde_json::from_value(value)
            .map_err(|err| ClientError::Format(format!("contract mismatch: {err}")))
    }

    /// Issue one call and return the raw response without decoding or
    /// formatting. The download path; with a raw body it is also the upload
    /// path.
    pub async fn call_raw(&self, spec: CallSpec<'_>) -> Result<RawResponse> {
        self.dispatch(&spec).await
    }

    /// Issue a collection call repeatedly, following the service's
    /// continuation-token header until it disappears, and concatenate the
    /// pages in order.
    pub async fn call_paged(&self, spec: CallSpec<'_>) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut page_spec = spec.clone();
            if let Some(token) = &continuation {
                page_spec = page_spec.query(CONTINUATION_PARAM, token);
            }

            let response = self.dispatch(&page_spec).await?;
            continuation = response
                .headers
                .get(CONTINUATION_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            let value = decode_json(&response)?;
            let page = match format::format(value, spec.type_info, true)? {
                Value::Array(page) => page,
                // No TypeInfo means pass-through; unwrap the container here.
                other => format::collection_items(other)?,
            };
            items.extend(page);

            if continuation.is_none() {
                return Ok(items);
            }
        }
    }

    /// Shared pipeline front half: resolve, negotiate, build, invoke.
    async fn dispatch(&self, spec: &CallSpec<'_>) -> Result<RawResponse> {
        if spec.version.is_empty() {
            return Err(ClientError::Config(
                "call spec is missing an api-version".into(),
            ));
        }
        let requested: ApiVersion = spec.version.parse()?;

        let location = self.registry.resolve(spec.area, spec.resource).await?;
        let negotiated = negotiate(&requested, &location, &self.config.version_policy)?;
        let request = request::build(&location, &negotiated, spec)?;
        self.invoker.invoke(request).await
    }
}

/// Decode a response body as JSON; empty bodies become `Value::Null`.
fn decode_json(response: &RawResponse) -> Result<Value> {
    if response.body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body)
        .map_err(|err| ClientError::Format(format!("response was not valid JSON: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_decodes_to_null() {
        let response = RawResponse {
            status: reqwest::StatusCode::NO_CONTENT,
            headers: reqwest::header::HeaderMap::new(),
            body: Vec::new(),
        };
        assert_eq!(decode_json(&response).unwrap(), Value::Null);
    }

    #[test]
    fn non_json_body_is_a_format_error() {
        let response = RawResponse {
            status: reqwest::StatusCode::OK,
            headers: reqwest::header::HeaderMap::new(),
            body: b"<html>".to_vec(),
        };
        assert!(matches!(
            decode_json(&response),
            Err(ClientError::Format(_))
        ));
    }
}
