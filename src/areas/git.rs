//! Call-sites for the `git` resource area: repositories, refs, items, pushes.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::format::TypeInfo;
use crate::http::RawResponse;
use crate::request::{CallSpec, OCTET_STREAM_MEDIA_TYPE};
use crate::ClientSession;

use super::core::{team_project_type_info, TeamProjectReference};

pub const AREA: &str = "git";

/// Contract version these call-sites were generated against.
const API_VERSION: &str = "7.1";

/// Location ids of the resources this module addresses.
pub mod resources {
    pub const REPOSITORIES: &str = "225f7195-f9c7-4d14-ab28-a83f7ff77e1f";
    pub const REFS: &str = "2d874a60-a811-4f62-9c9f-963a6ea0a55b";
    pub const ITEMS: &str = "fb93c0db-47ed-4a31-8c20-47552878fb44";
    pub const PUSHES: &str = "ea98d07b-3c87-4971-8ede-a613694ffb55";
}

/// A git repository.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRepository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub is_disabled: Option<bool>,
    #[serde(default)]
    pub project: Option<TeamProjectReference>,
}

/// One ref (branch, tag) of a repository.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitRef {
    pub name: String,
    pub object_id: String,
    #[serde(default)]
    pub peeled_object_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A push recorded against a repository.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPush {
    pub push_id: i64,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Field descriptors for [`GitRepository`] payloads.
pub fn git_repository_type_info() -> &'static TypeInfo {
    static INFO: OnceLock<TypeInfo> = OnceLock::new();
    INFO.get_or_init(|| {
        TypeInfo::builder()
            .object("project", team_project_type_info())
            .build()
    })
}

/// Field descriptors for [`GitPush`] payloads.
pub fn git_push_type_info() -> &'static TypeInfo {
    static INFO: OnceLock<TypeInfo> = OnceLock::new();
    INFO.get_or_init(|| TypeInfo::builder().date("date").build())
}

/// Call-sites for the `git` resource area.
pub struct GitClient<'a> {
    session: &'a ClientSession,
}

impl ClientSession {
    pub fn git(&self) -> GitClient<'_> {
        GitClient { session: self }
    }
}

impl GitClient<'_> {
    /// List the repositories of a project.
    pub async fn repositories(&self, project: &str) -> Result<Vec<GitRepository>> {
        self.session
            .call_for(
                CallSpec::new(Method::GET, AREA, resources::REPOSITORIES)
                    .version(API_VERSION)
                    .route("project", project)
                    .type_info(git_repository_type_info())
                    .collection(true),
            )
            .await
    }

    /// Fetch a single repository by id or name.
    pub async fn repository(&self, project: &str, repository_id: &str) -> Result<GitRepository> {
        self.session
            .call_for(
                CallSpec::new(Method::GET, AREA, resources::REPOSITORIES)
                    .version(API_VERSION)
                    .route("project", project)
                    .route("repositoryId", repository_id)
                    .type_info(git_repository_type_info()),
            )
            .await
    }

    /// List refs of a repository, optionally filtered by prefix
    /// (e.g. `heads/` for branches only).
    pub async fn refs(
        &self,
        project: &str,
        repository_id: &str,
        filter: Option<&str>,
    ) -> Result<Vec<GitRef>> {
        self.session
            .call_for(
                CallSpec::new(Method::GET, AREA, resources::REFS)
                    .version(API_VERSION)
                    .route("project", project)
                    .route("repositoryId", repository_id)
                    .query_opt("filter", filter)
                    .type_info(super::plain_collection())
                    .collection(true),
            )
            .await
    }

    /// List pushes against a repository, most recent first.
    pub async fn pushes(
        &self,
        project: &str,
        repository_id: &str,
        top: Option<u32>,
    ) -> Result<Vec<GitPush>> {
        self.session
            .call_for(
                CallSpec::new(Method::GET, AREA, resources::PUSHES)
                    .version(API_VERSION)
                    .route("project", project)
                    .route("repositoryId", repository_id)
                    .query_opt("$top", top)
                    .type_info(git_push_type_info())
                    .collection(true),
            )
            .await
    }

    /// Record a push (ref updates plus commits) against a repository.
    pub async fn create_push(
        &self,
        project: &str,
        repository_id: &str,
        push: Value,
    ) -> Result<GitPush> {
        self.session
            .call_for(
                CallSpec::new(Method::POST, AREA, resources::PUSHES)
                    .version(API_VERSION)
                    .route("project", project)
                    .route("repositoryId", repository_id)
                    .json_body(push)
                    .type_info(git_push_type_info()),
            )
            .await
    }

    /// Download a file's content at `path`, undecoded. The raw-byte variant:
    /// no JSON decoding, no formatting.
    pub async fn item_content(
        &self,
        project: &str,
        repository_id: &str,
        path: &str,
    ) -> Result<RawResponse> {
        self.session
            .call_raw(
                CallSpec::new(Method::GET, AREA, resources::ITEMS)
                    .version(API_VERSION)
                    .route("project", project)
                    .route("repositoryId", repository_id)
                    .query("path", path)
                    .query("download", "true")
                    .accept(OCTET_STREAM_MEDIA_TYPE),
            )
            .await
    }
}
