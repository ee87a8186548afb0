//! Call-sites for the `core` resource area: projects and teams.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;

use crate::error::Result;
use crate::format::TypeInfo;
use crate::request::CallSpec;
use crate::ClientSession;

pub const AREA: &str = "core";

/// Contract version these call-sites were generated against.
const API_VERSION: &str = "7.1";

/// Location ids of the resources this module addresses.
pub mod resources {
    pub const PROJECTS: &str = "603fe2ac-9723-48b9-88ad-09305aa6c6e1";
    pub const TEAMS: &str = "d30a3dd1-f8ba-442a-b86a-bd0c0c383e59";
}

/// Numeric codes for the `state` field of [`TeamProject`].
pub mod project_state {
    pub const NEW: i64 = 0;
    pub const WELL_FORMED: i64 = 1;
    pub const DELETING: i64 = 2;
    pub const CREATE_PENDING: i64 = 3;
    pub const DELETED: i64 = 4;
}

/// Numeric codes for the `visibility` field of [`TeamProject`].
pub mod project_visibility {
    pub const PRIVATE: i64 = 0;
    pub const ORGANIZATION: i64 = 1;
    pub const PUBLIC: i64 = 2;
}

/// Shallow project reference embedded in other areas' contracts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProjectReference {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<i64>,
    #[serde(default)]
    pub visibility: Option<i64>,
    #[serde(default)]
    pub last_update_time: Option<DateTime<Utc>>,
}

/// A team project as returned by the projects resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<i64>,
    #[serde(default)]
    pub revision: Option<i64>,
    #[serde(default)]
    pub visibility: Option<i64>,
    #[serde(default)]
    pub last_update_time: Option<DateTime<Utc>>,
}

/// A team within a project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebApiTeam {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

const PROJECT_STATE_VALUES: &[(&str, i64)] = &[
    ("new", project_state::NEW),
    ("wellFormed", project_state::WELL_FORMED),
    ("deleting", project_state::DELETING),
    ("createPending", project_state::CREATE_PENDING),
    ("deleted", project_state::DELETED),
];

const PROJECT_VISIBILITY_VALUES: &[(&str, i64)] = &[
    ("private", project_visibility::PRIVATE),
    ("organization", project_visibility::ORGANIZATION),
    ("public", project_visibility::PUBLIC),
];

/// Field descriptors for project reference payloads. Shared with the other
/// areas, which embed project references in their own contracts.
pub fn team_project_type_info() -> &'static TypeInfo {
    static INFO: OnceLock<TypeInfo> = OnceLock::new();
    INFO.get_or_init(|| {
        TypeInfo::builder()
            .date("lastUpdateTime")
            .enumeration("state", PROJECT_STATE_VALUES)
            .enumeration("visibility", PROJECT_VISIBILITY_VALUES)
            .build()
    })
}

/// Call-sites for the `core` resource area.
pub struct CoreClient<'a> {
    session: &'a ClientSession,
}

impl ClientSession {
    pub fn core(&self) -> CoreClient<'_> {
        CoreClient { session: self }
    }
}

impl CoreClient<'_> {
    /// List the organization's projects, following continuation tokens.
    pub async fn projects(&self, state_filter: Option<&str>) -> Result<Vec<TeamProject>> {
        let items = self
            .session
            .call_paged(
                CallSpec::new(Method::GET, AREA, resources::PROJECTS)
                    .version(API_VERSION)
                    .query_opt("stateFilter", state_filter)
                    .type_info(team_project_type_info())
                    .collection(true),
            )
            .await?;
        items.into_iter().map(super::from_value).collect()
    }

    /// Fetch a single project by id or name.
    pub async fn project(&self, project_id: &str) -> Result<TeamProject> {
        self.session
            .call_for(
                CallSpec::new(Method::GET, AREA, resources::PROJECTS)
                    .version(API_VERSION)
                    .route("projectId", project_id)
                    .type_info(team_project_type_info()),
            )
            .await
    }

    /// List the teams of a project.
    pub async fn teams(&self, project_id: &str) -> Result<Vec<WebApiTeam>> {
        self.session
            .call_for(
                CallSpec::new(Method::GET, AREA, resources::TEAMS)
                    .version(API_VERSION)
                    .route("projectId", project_id)
                    .type_info(super::plain_collection())
                    .collection(true),
            )
            .await
    }
}
