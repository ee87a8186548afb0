//! Per-area call-site modules.
//!
//! Each module carries the area name, the location ids of the resources it
//! addresses, the contract structs and TypeInfo descriptors for its response
//! shapes, and one method per remote operation. The method bodies are
//! mechanical by design (route values in, typed result out); everything
//! interesting happens in the session runtime they delegate to.

use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::format::TypeInfo;

pub mod build;
pub mod core;
pub mod git;

/// Empty descriptor for collection contracts whose fields need no
/// reinterpretation; it still makes the formatter unwrap the service's
/// `{count, value}` list container.
pub(crate) fn plain_collection() -> &'static TypeInfo {
    static INFO: OnceLock<TypeInfo> = OnceLock::new();
    INFO.get_or_init(|| TypeInfo::builder().build())
}

/// Deserialize one formatted payload into its contract type.
pub(crate) fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|err| ClientError::Format(format!("contract mismatch: {err}")))
}
