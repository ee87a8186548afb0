//! Resource location discovery and caching.
//!
//! Every resource area publishes a `locations` document describing the
//! resources it exposes: id, route template, supported version range. The
//! [`LocationRegistry`] fetches that document once per area (one round trip
//! covers the whole area, not one per resource), caches it for the lifetime
//! of the session, and answers `(area, resource id)` lookups from the cache.
//! Server-side route changes are only picked up by a fresh session.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell};
use url::Url;

use crate::error::{ClientError, Result};
use crate::http::HttpInvoker;
use crate::request::{RequestDescriptor, JSON_MEDIA_TYPE};
use crate::version::ApiVersion;

/// Route and version metadata for one resource, as resolved from discovery.
/// Immutable once fetched.
#[derive(Debug, Clone)]
pub struct ResourceLocation {
    /// Opaque location id (the service uses GUID strings).
    pub id: String,
    pub area: String,
    pub resource_name: String,
    /// URL path pattern with `{name}` placeholders, relative to `base_url`.
    pub route_template: String,
    pub min_version: ApiVersion,
    pub max_version: ApiVersion,
    /// Highest released (non-preview) contract, when one exists.
    pub released_version: Option<ApiVersion>,
    /// Base URL resolved for this location's area.
    pub base_url: Url,
}

/// Wire form of one entry in an area's locations document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResourceLocation {
    id: String,
    #[serde(default)]
    area: Option<String>,
    #[serde(default)]
    resource_name: Option<String>,
    route_template: String,
    min_version: String,
    max_version: String,
    #[serde(default)]
    released_version: Option<String>,
    /// Per-area base override; absent when the area lives on the org host.
    #[serde(default)]
    location_url: Option<String>,
}

/// The locations document itself: either a bare array or the service's
/// `{count, value}` list wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LocationsDocument {
    Wrapped { value: Vec<ApiResourceLocation> },
    Bare(Vec<ApiResourceLocation>),
}

impl LocationsDocument {
    fn into_entries(self) -> Vec<ApiResourceLocation> {
        match self {
            LocationsDocument::Wrapped { value } => value,
            LocationsDocument::Bare(entries) => entries,
        }
    }
}

/// All resolved locations of one area, keyed by lowercased location id.
#[derive(Debug)]
struct AreaLocations {
    resources: HashMap<String, ResourceLocation>,
}

/// Per-session cache of resource locations, populated lazily one area at a
/// time. The only mutable shared state in the runtime.
pub struct LocationRegistry {
    base_url: Url,
    invoker: HttpInvoker,
    /// Single-flight cells per area: concurrent first-use of an area waits
    /// on one in-flight discovery instead of duplicating it. A failed
    /// discovery leaves the cell empty, so the next caller retries.
    areas: Mutex<HashMap<String, Arc<OnceCell<Arc<AreaLocations>>>>>,
}

impl LocationRegistry {
    pub(crate) fn new(base_url: Url, invoker: HttpInvoker) -> Self {
        Self {
            base_url,
            invoker,
            areas: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the location for `(area, resource id)`, running the area's
    /// discovery call first if this session has not seen the area yet.
    pub async fn resolve(&self, area: &str, resource: &str) -> Result<ResourceLocation> {
        let area_key = area.to_ascii_lowercase();

        let cell = {
            let mut areas = self.areas.lock().await;
            Arc::clone(areas.entry(area_key).or_default())
        };

        let locations = cell
            .get_or_try_init(|| self.discover(area))
            .await?;

        locations
            .resources
            .get(&resource.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| ClientError::UnknownResource {
                area: area.to_string(),
                resource: resource.to_string(),
            })
    }

    /// Fetch and parse one area's locations document.
    async fn discover(&self, area: &str) -> Result<Arc<AreaLocations>> {
        let discovery_error = |reason: String| ClientError::AreaDiscovery {
            area: area.to_string(),
            reason,
        };

        let url = self
            .base_url
            .join(&format!("_apis/{}/locations", urlencoding::encode(area)))
            .map_err(|err| discovery_error(err.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));

        tracing::debug!("discovering resource area '{}'", area);
        let response = self
            .invoker
            .invoke(RequestDescriptor {
                method: Method::GET,
                url,
                headers,
                body: None,
            })
            .await
            .map_err(|err| discovery_error(err.to_string()))?;

        let document: LocationsDocument = serde_json::from_slice(&response.body)
            .map_err(|err| discovery_error(format!("malformed locations document: {err}")))?;

        let locations = parse_area(area, &self.base_url, document.into_entries())?;
        tracing::debug!(
            "area '{}' resolved with {} resources",
            area,
            locations.resources.len()
        );
        Ok(Arc::new(locations))
    }
}

fn parse_area(
    area: &str,
    session_base: &Url,
    entries: Vec<ApiResourceLocation>,
) -> Result<AreaLocations> {
    let discovery_error = |reason: String| ClientError::AreaDiscovery {
        area: area.to_string(),
        reason,
    };

    let mut resources = HashMap::with_capacity(entries.len());
    for entry in entries {
        let parse_version = |raw: &str| -> Result<ApiVersion> {
            raw.parse().map_err(|_| {
                discovery_error(format!(
                    "location '{}' carries invalid version '{}'",
                    entry.id, raw
                ))
            })
        };

        let min_version = parse_version(&entry.min_version)?;
        let max_version = parse_version(&entry.max_version)?;
        // The service reports "0.0" for contracts that never shipped.
        let released_version = match entry.released_version.as_deref() {
            None | Some("0.0") => None,
            Some(raw) => Some(parse_version(raw)?),
        };

        let base_url = match &entry.location_url {
            Some(raw) => Url::parse(raw).map_err(|err| {
                discovery_error(format!("location '{}' has invalid base URL: {err}", entry.id))
            })?,
            None => session_base.clone(),
        };

        let location = ResourceLocation {
            id: entry.id.clone(),
            area: entry.area.unwrap_or_else(|| area.to_string()),
            resource_name: entry.resource_name.unwrap_or_default(),
            route_template: entry.route_template,
            min_version,
            max_version,
            released_version,
            base_url,
        };
        resources.insert(entry.id.to_ascii_lowercase(), location);
    }

    Ok(AreaLocations { resources })
}
