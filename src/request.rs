//! Request assembly: call specs, route templates, query strings, bodies.
//!
//! A [`CallSpec`] is everything a call-site supplies for one remote
//! operation. The builder here turns it, together with the resolved
//! [`ResourceLocation`](crate::locations::ResourceLocation) and the
//! negotiated api-version, into a fully qualified [`RequestDescriptor`]
//! ready for the transport. Route expansion fails fast on missing
//! placeholders so a malformed URL is never sent over the wire.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::error::{ClientError, Result};
use crate::format::TypeInfo;
use crate::locations::ResourceLocation;
use crate::version::ApiVersion;

pub const JSON_MEDIA_TYPE: &str = "application/json";
pub const OCTET_STREAM_MEDIA_TYPE: &str = "application/octet-stream";

/// Delimiter for multi-valued query parameters. The service expects one
/// joined parameter, not repeated keys.
const QUERY_LIST_DELIMITER: &str = ",";

/// Request body payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Structured payload, serialized as JSON.
    Json(Value),
    /// Raw byte passthrough for uploads.
    Raw(Vec<u8>),
}

/// One fully assembled request, ready for the transport collaborator.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

/// What a call-site supplies for one remote operation: the desired contract
/// version, the `(area, resource)` address, route and query values, and how
/// to interpret the response.
#[derive(Debug, Clone)]
pub struct CallSpec<'a> {
    pub(crate) method: Method,
    pub(crate) area: &'a str,
    pub(crate) resource: &'a str,
    pub(crate) version: String,
    pub(crate) route_values: HashMap<String, String>,
    pub(crate) queries: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) content_type: String,
    pub(crate) accept: String,
    pub(crate) type_info: Option<&'static TypeInfo>,
    pub(crate) is_collection: bool,
}

impl<'a> CallSpec<'a> {
    /// Start a spec for the resource identified by `(area, resource)`, where
    /// `resource` is the location id from the area's discovery document.
    pub fn new(method: Method, area: &'a str, resource: &'a str) -> Self {
        Self {
            method,
            area,
            resource,
            version: String::new(),
            route_values: HashMap::new(),
            queries: Vec::new(),
            body: None,
            content_type: JSON_MEDIA_TYPE.to_string(),
            accept: JSON_MEDIA_TYPE.to_string(),
            type_info: None,
            is_collection: false,
        }
    }

    /// Contract version the call-site was written against, e.g. `"7.1"` or
    /// `"4.1-preview.1"`. Required.
    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Supply a value for one route template placeholder.
    pub fn route(mut self, name: &str, value: impl ToString) -> Self {
        self.route_values.insert(name.to_string(), value.to_string());
        self
    }

    /// Append a query parameter. An empty value is sent as an empty
    /// parameter, not dropped.
    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.queries.push((name.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter only when a value is present. Absent values
    /// are omitted from the URL entirely.
    pub fn query_opt(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    /// Append a multi-valued query parameter, joined into a single key.
    /// An empty slice is omitted like an absent value.
    pub fn query_list(self, name: &str, values: &[impl ToString]) -> Self {
        if values.is_empty() {
            return self;
        }
        let joined = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(QUERY_LIST_DELIMITER);
        self.query(name, joined)
    }

    /// Attach a JSON body.
    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a raw byte body with its media type (upload path).
    pub fn raw_body(mut self, body: Vec<u8>, content_type: &str) -> Self {
        self.body = Some(RequestBody::Raw(body));
        self.content_type = content_type.to_string();
        self
    }

    /// Media type to request in `Accept` (downloads; defaults to JSON).
    pub fn accept(mut self, media_type: &str) -> Self {
        self.accept = media_type.to_string();
        self
    }

    /// Descriptor used to reinterpret the decoded response.
    pub fn type_info(mut self, info: &'static TypeInfo) -> Self {
        self.type_info = Some(info);
        self
    }

    /// Whether the response is a collection (array / `{count, value}`)
    /// rather than a single object. Resolved by the call-site, which knows
    /// its own cardinality.
    pub fn collection(mut self, is_collection: bool) -> Self {
        self.is_collection = is_collection;
        self
    }
}

/// Expand `{name}` placeholders from the route values, percent-encoding each
/// value as a path segment. A `{name}` placeholder with no supplied value
/// fails fast; a `{*name}` catch-all is optional and spans path segments
/// (slashes in its value survive). Empty segments left behind by omitted
/// catch-alls are collapsed away.
pub fn expand_route(template: &str, values: &HashMap<String, String>) -> Result<String> {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let Some(close) = tail.find('}') else {
            return Err(ClientError::IncompleteRoute {
                placeholder: tail.to_string(),
                template: template.to_string(),
            });
        };
        let raw = &tail[..close];
        let (name, catch_all) = match raw.strip_prefix('*') {
            Some(name) => (name, true),
            None => (raw, false),
        };
        match (values.get(name), catch_all) {
            (Some(value), false) => expanded.push_str(&urlencoding::encode(value)),
            (Some(value), true) => {
                let encoded = value
                    .split('/')
                    .map(|segment| urlencoding::encode(segment).into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                expanded.push_str(&encoded);
            }
            (None, true) => {}
            (None, false) => {
                return Err(ClientError::IncompleteRoute {
                    placeholder: name.to_string(),
                    template: template.to_string(),
                })
            }
        }
        rest = &tail[close + 1..];
    }
    expanded.push_str(rest);

    while expanded.contains("//") {
        expanded = expanded.replace("//", "/");
    }
    Ok(expanded.trim_end_matches('/').to_string())
}

/// Assemble the request for a resolved location and negotiated version.
pub fn build(
    location: &ResourceLocation,
    version: &ApiVersion,
    spec: &CallSpec<'_>,
) -> Result<RequestDescriptor> {
    let path = expand_route(&location.route_template, &spec.route_values)?;

    let mut url = location
        .base_url
        .join(path.trim_start_matches('/'))
        .map_err(|err| ClientError::Config(format!("route produced an invalid URL: {err}")))?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("api-version", &version.to_string());
        for (name, value) in &spec.queries {
            pairs.append_pair(name, value);
        }
    }

    let mut headers = HeaderMap::new();
    let accept = format!("{};api-version={}", spec.accept, version);
    headers.insert(
        ACCEPT,
        HeaderValue::from_str(&accept)
            .map_err(|err| ClientError::Config(format!("invalid accept media type: {err}")))?,
    );
    if spec.body.is_some() {
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&spec.content_type)
                .map_err(|err| ClientError::Config(format!("invalid media type: {err}")))?,
        );
    }

    Ok(RequestDescriptor {
        method: spec.method.clone(),
        url,
        headers,
        body: spec.body.clone(),
    })
}
