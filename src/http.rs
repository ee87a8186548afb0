//! HTTP invocation over an injected transport.
//!
//! [`Transport`] is the seam between the runtime and the actual network:
//! production uses [`ReqwestTransport`], tests substitute fakes. The
//! crate-internal [`HttpInvoker`] sits on top, applying credentials,
//! stamping the session correlation header, and turning non-success status
//! codes into structured errors. Calls never block a worker thread; dropping
//! the future cancels the underlying request on a best-effort basis.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;

use crate::auth::AuthHandler;
use crate::error::{ClientError, Result};
use crate::request::{RequestBody, RequestDescriptor};

/// Correlation header the service threads through its telemetry.
pub(crate) const SESSION_HEADER: HeaderName = HeaderName::from_static("x-tfs-session");

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Undecoded response as produced by the transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Response body as UTF-8 text, lossily converted.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Performs one HTTP exchange. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse>;
}

/// Production transport backed by reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        builder = match request.body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Raw(bytes)) => builder.body(bytes),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Sanitize response body for logging
/// Truncates long responses and masks potentially sensitive patterns
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Sends assembled requests with credentials applied and maps failure
/// statuses into the error taxonomy.
#[derive(Clone)]
pub(crate) struct HttpInvoker {
    transport: Arc<dyn Transport>,
    auth: Arc<dyn AuthHandler>,
    /// Correlation id shared by every request of this session.
    session_id: String,
}

impl HttpInvoker {
    pub fn new(transport: Arc<dyn Transport>, auth: Arc<dyn AuthHandler>) -> Self {
        Self {
            transport,
            auth,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Issue one request. Status codes >= 400 come back as
    /// [`ClientError::Http`] with the decoded body attached.
    pub async fn invoke(&self, mut request: RequestDescriptor) -> Result<RawResponse> {
        self.auth.apply(&mut request.headers).await?;
        if let Ok(value) = HeaderValue::from_str(&self.session_id) {
            request.headers.insert(SESSION_HEADER, value);
        }

        tracing::debug!("{} {}", request.method, request.url);

        let response = self.transport.send(request).await?;
        if response.status.is_client_error() || response.status.is_server_error() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "API error: {} - {}",
                response.status,
                sanitize_for_log(&response.text())
            );
            return Err(ClientError::Http {
                status: response.status,
                body: decode_error_body(&response.body),
            });
        }

        Ok(response)
    }
}

/// Decode a failure body as JSON when possible, falling back to raw text so
/// callers always get something inspectable.
fn decode_error_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticTransport {
        status: StatusCode,
        body: Vec<u8>,
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn send(&self, request: RequestDescriptor) -> Result<RawResponse> {
            // The invoker must have applied credentials and correlation id
            // before the transport ever sees the request.
            assert!(request.headers.contains_key(reqwest::header::AUTHORIZATION));
            assert!(request.headers.contains_key(SESSION_HEADER));
            Ok(RawResponse {
                status: self.status,
                headers: HeaderMap::new(),
                body: self.body.clone(),
            })
        }
    }

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor {
            method: reqwest::Method::GET,
            url: url::Url::parse("https://dev.azure.com/fabrikam/_apis/projects").unwrap(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    fn invoker(status: StatusCode, body: Vec<u8>) -> HttpInvoker {
        HttpInvoker::new(
            Arc::new(StaticTransport { status, body }),
            Arc::new(crate::auth::Credentials::Pat("token".into())),
        )
    }

    #[tokio::test]
    async fn success_passes_through() {
        let invoker = invoker(StatusCode::OK, b"{}".to_vec());
        let response = invoker.invoke(descriptor()).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn failure_status_becomes_structured_error() {
        let invoker = invoker(
            StatusCode::CONFLICT,
            serde_json::to_vec(&json!({"message": "stale ref"})).unwrap(),
        );
        let err = invoker.invoke(descriptor()).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.server_message(), Some("stale ref"));
    }

    #[tokio::test]
    async fn non_json_failure_body_kept_as_text() {
        let invoker = invoker(StatusCode::BAD_GATEWAY, b"upstream gone".to_vec());
        let err = invoker.invoke(descriptor()).await.unwrap_err();
        match err {
            ClientError::Http { body, .. } => assert_eq!(body, json!("upstream gone")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sanitize_truncates_long_bodies() {
        let long = "x".repeat(500);
        let sanitized = sanitize_for_log(&long);
        assert!(sanitized.contains("truncated"));
        assert!(sanitized.len() < long.len());
    }
}
