//! Client runtime for Azure DevOps-style "resource area" REST services.
//!
//! The service splits one logical server into independently versioned
//! areas (source control, build, core, ...), each exposing many resources
//! that are only reachable after the client resolves which route template
//! and which protocol version to use. This crate is the runtime behind
//! that dance:
//!
//! - [`locations`]: per-area discovery of resource locations, cached for
//!   the session with single-flight de-duplication;
//! - [`version`]: api-version parsing and negotiation against a resource's
//!   supported range;
//! - [`request`]: route template expansion, query assembly, body encoding;
//! - [`http`]: the transport seam and the non-blocking invoker;
//! - [`format`]: TypeInfo-driven reinterpretation of decoded payloads
//!   (dates, enum codes, nested shapes);
//! - [`client`]: the [`ClientSession`] facade tying the pipeline together;
//! - [`areas`]: generated-style call-site modules for the `core`, `git`,
//!   and `build` areas.
//!
//! ```no_run
//! use azdo_client::{ClientSession, ConnectionConfig, Credentials};
//!
//! # async fn run() -> azdo_client::Result<()> {
//! let config = ConnectionConfig::new("https://dev.azure.com/fabrikam")?
//!     .credentials(Credentials::Pat(std::env::var("AZDO_PAT").unwrap()));
//! let session = ClientSession::new(config)?;
//!
//! for repo in session.git().repositories("Fabrikam-Fiber").await? {
//!     println!("{} ({:?})", repo.name, repo.default_branch);
//! }
//! # Ok(())
//! # }
//! ```

pub mod areas;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod locations;
pub mod request;
pub mod version;

pub use auth::{AuthHandler, Credentials};
pub use client::ClientSession;
pub use config::ConnectionConfig;
pub use error::{ClientError, Result};
pub use format::{FieldKind, TypeInfo};
pub use http::{RawResponse, Transport};
pub use locations::ResourceLocation;
pub use request::{CallSpec, RequestBody, RequestDescriptor};
pub use version::{ApiVersion, VersionPolicy};
