//! Call-sites for the `build` resource area: definitions and builds.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::format::TypeInfo;
use crate::request::CallSpec;
use crate::ClientSession;

use super::core::{team_project_type_info, TeamProjectReference};

pub const AREA: &str = "build";

/// Contract version these call-sites were generated against.
const API_VERSION: &str = "7.1";

/// Location ids of the resources this module addresses.
pub mod resources {
    pub const BUILDS: &str = "0cd358e1-9217-4d94-8269-1c1ee6f93dcf";
    pub const DEFINITIONS: &str = "dbeaf647-6167-421a-bda9-c9327b25e2e6";
}

/// Numeric codes for the `status` field of [`Build`].
pub mod build_status {
    pub const NONE: i64 = 0;
    pub const IN_PROGRESS: i64 = 1;
    pub const COMPLETED: i64 = 2;
    pub const CANCELLING: i64 = 4;
    pub const POSTPONED: i64 = 8;
    pub const NOT_STARTED: i64 = 32;
}

/// Numeric codes for the `result` field of [`Build`].
pub mod build_result {
    pub const NONE: i64 = 0;
    pub const SUCCEEDED: i64 = 2;
    pub const PARTIALLY_SUCCEEDED: i64 = 4;
    pub const FAILED: i64 = 8;
    pub const CANCELED: i64 = 32;
}

/// Shallow reference to a build definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDefinitionReference {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub revision: Option<i64>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
}

/// A queued, running, or finished build.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: i64,
    #[serde(default)]
    pub build_number: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub result: Option<i64>,
    #[serde(default)]
    pub source_branch: Option<String>,
    #[serde(default)]
    pub source_version: Option<String>,
    #[serde(default)]
    pub queue_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finish_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub definition: Option<BuildDefinitionReference>,
    #[serde(default)]
    pub project: Option<TeamProjectReference>,
}

const BUILD_STATUS_VALUES: &[(&str, i64)] = &[
    ("none", build_status::NONE),
    ("inProgress", build_status::IN_PROGRESS),
    ("completed", build_status::COMPLETED),
    ("cancelling", build_status::CANCELLING),
    ("postponed", build_status::POSTPONED),
    ("notStarted", build_status::NOT_STARTED),
];

const BUILD_RESULT_VALUES: &[(&str, i64)] = &[
    ("none", build_result::NONE),
    ("succeeded", build_result::SUCCEEDED),
    ("partiallySucceeded", build_result::PARTIALLY_SUCCEEDED),
    ("failed", build_result::FAILED),
    ("canceled", build_result::CANCELED),
];

/// Field descriptors for [`BuildDefinitionReference`] payloads.
pub fn definition_reference_type_info() -> &'static TypeInfo {
    static INFO: OnceLock<TypeInfo> = OnceLock::new();
    INFO.get_or_init(|| TypeInfo::builder().date("createdDate").build())
}

/// Field descriptors for [`Build`] payloads.
pub fn build_type_info() -> &'static TypeInfo {
    static INFO: OnceLock<TypeInfo> = OnceLock::new();
    INFO.get_or_init(|| {
        TypeInfo::builder()
            .date("queueTime")
            .date("startTime")
            .date("finishTime")
            .enumeration("status", BUILD_STATUS_VALUES)
            .enumeration("result", BUILD_RESULT_VALUES)
            .object("definition", definition_reference_type_info())
            .object("project", team_project_type_info())
            .build()
    })
}

/// Call-sites for the `build` resource area.
pub struct BuildClient<'a> {
    session: &'a ClientSession,
}

impl ClientSession {
    pub fn build(&self) -> BuildClient<'_> {
        BuildClient { session: self }
    }
}

impl BuildClient<'_> {
    /// List a project's build definitions, optionally filtered by name.
    pub async fn definitions(
        &self,
        project: &str,
        name: Option<&str>,
    ) -> Result<Vec<BuildDefinitionReference>> {
        self.session
            .call_for(
                CallSpec::new(Method::GET, AREA, resources::DEFINITIONS)
                    .version(API_VERSION)
                    .route("project", project)
                    .query_opt("name", name)
                    .type_info(definition_reference_type_info())
                    .collection(true),
            )
            .await
    }

    /// List builds, optionally restricted to a set of definitions.
    pub async fn builds(
        &self,
        project: &str,
        definitions: &[i64],
        status_filter: Option<&str>,
    ) -> Result<Vec<Build>> {
        self.session
            .call_for(
                CallSpec::new(Method::GET, AREA, resources::BUILDS)
                    .version(API_VERSION)
                    .route("project", project)
                    .query_list("definitions", definitions)
                    .query_opt("statusFilter", status_filter)
                    .type_info(build_type_info())
                    .collection(true),
            )
            .await
    }

    /// Fetch a single build.
    pub async fn get(&self, project: &str, build_id: i64) -> Result<Build> {
        self.session
            .call_for(
                CallSpec::new(Method::GET, AREA, resources::BUILDS)
                    .version(API_VERSION)
                    .route("project", project)
                    .route("buildId", build_id)
                    .type_info(build_type_info()),
            )
            .await
    }

    /// Queue a new build of a definition.
    pub async fn queue(&self, project: &str, definition_id: i64) -> Result<Build> {
        self.session
            .call_for(
                CallSpec::new(Method::POST, AREA, resources::BUILDS)
                    .version(API_VERSION)
                    .route("project", project)
                    .json_body(json!({"definition": {"id": definition_id}}))
                    .type_info(build_type_info()),
            )
            .await
    }
}
