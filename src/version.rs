//! Api-version parsing and negotiation.
//!
//! The service versions every resource independently as
//! `major.minor[-preview[.N]]`, e.g. `"7.1"` or `"4.1-preview.2"`. Range
//! checks only ever look at the `major.minor` release line; the preview
//! marker describes contract stability, not ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{ClientError, Result};
use crate::locations::ResourceLocation;

/// A protocol version in the service's `major.minor[-preview[.N]]` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion {
    major: u32,
    minor: u32,
    preview: bool,
    /// The `.N` revision of a preview contract (`-preview.2`).
    resource_version: Option<u32>,
}

impl ApiVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            preview: false,
            resource_version: None,
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// The same version with the preview marker stripped.
    pub fn to_released(&self) -> Self {
        Self {
            major: self.major,
            minor: self.minor,
            preview: false,
            resource_version: None,
        }
    }

    /// Compare release lines (`major.minor` only). Preview markers do not
    /// participate, so this is deliberately not an `Ord` impl: two versions
    /// can compare `Equal` here without being `==`.
    pub fn cmp_release(&self, other: &ApiVersion) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }

    /// True when this version's release line lies within `[min, max]`.
    pub fn in_range(&self, min: &ApiVersion, max: &ApiVersion) -> bool {
        self.cmp_release(min) != Ordering::Less && self.cmp_release(max) != Ordering::Greater
    }
}

impl FromStr for ApiVersion {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ClientError::Config(format!("invalid api-version '{}'", s));

        let (release, preview_part) = match s.split_once('-') {
            Some((release, rest)) => (release, Some(rest)),
            None => (s, None),
        };

        let (major, minor) = match release.split_once('.') {
            Some((major, minor)) => (
                major.parse().map_err(|_| invalid())?,
                minor.parse().map_err(|_| invalid())?,
            ),
            None => (release.parse().map_err(|_| invalid())?, 0),
        };

        let (preview, resource_version) = match preview_part {
            None => (false, None),
            Some("preview") => (true, None),
            Some(rest) => {
                let revision = rest.strip_prefix("preview.").ok_or_else(invalid)?;
                (true, Some(revision.parse().map_err(|_| invalid())?))
            }
        };

        Ok(Self {
            major,
            minor,
            preview,
            resource_version,
        })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.preview {
            write!(f, "-preview")?;
            if let Some(revision) = self.resource_version {
                write!(f, ".{}", revision)?;
            }
        }
        Ok(())
    }
}

/// Knobs for the downgrade behavior of [`negotiate`].
///
/// The service's own clients silently promote a preview request to the
/// released contract once the server has shipped it; some callers prefer to
/// keep the preview wire format they were written against.
#[derive(Debug, Clone)]
pub struct VersionPolicy {
    /// Send the released form of a preview request once the resource reports
    /// that release line as released.
    pub prefer_released: bool,
}

impl Default for VersionPolicy {
    fn default() -> Self {
        Self {
            prefer_released: true,
        }
    }
}

/// Compute the concrete api-version to send for a resolved location.
///
/// Never returns a version outside the location's `[min, max]` range: when
/// the requested version cannot be satisfied and `releasedVersion` does not
/// offer an in-range fallback on the same major line, negotiation fails.
pub fn negotiate(
    requested: &ApiVersion,
    location: &ResourceLocation,
    policy: &VersionPolicy,
) -> Result<ApiVersion> {
    let min = &location.min_version;
    let max = &location.max_version;

    if requested.in_range(min, max) {
        // A preview request against an already-released contract is sent in
        // its released form so the server answers with the stable shape.
        if requested.is_preview() && policy.prefer_released {
            if let Some(released) = &location.released_version {
                if released.cmp_release(requested) != Ordering::Less {
                    let negotiated = requested.to_released();
                    tracing::debug!(
                        "api-version {} negotiated to released {} for {}",
                        requested,
                        negotiated,
                        location.id
                    );
                    return Ok(negotiated);
                }
            }
        }
        return Ok(requested.clone());
    }

    // Out of range: fall back to the released version when it stays on the
    // caller's major line, so newer clients keep working against older
    // servers that expose a compatible resource.
    if let Some(released) = &location.released_version {
        if released.major() == requested.major() && released.in_range(min, max) {
            tracing::debug!(
                "api-version {} downgraded to {} for {}",
                requested,
                released,
                location.id
            );
            return Ok(released.clone());
        }
    }

    Err(ClientError::UnsupportedApiVersion {
        requested: requested.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn location(min: &str, max: &str, released: Option<&str>) -> ResourceLocation {
        ResourceLocation {
            id: "225f7195-f9c7-4d14-ab28-a83f7ff77e1f".into(),
            area: "git".into(),
            resource_name: "repositories".into(),
            route_template: "{project}/_apis/git/repositories/{repositoryId}".into(),
            min_version: min.parse().unwrap(),
            max_version: max.parse().unwrap(),
            released_version: released.map(|v| v.parse().unwrap()),
            base_url: Url::parse("https://dev.azure.com/fabrikam/").unwrap(),
        }
    }

    #[test]
    fn parses_release_and_preview_forms() {
        let v: ApiVersion = "7.1".parse().unwrap();
        assert_eq!((v.major(), v.minor()), (7, 1));
        assert!(!v.is_preview());

        let v: ApiVersion = "4.1-preview.2".parse().unwrap();
        assert!(v.is_preview());
        assert_eq!(v.to_string(), "4.1-preview.2");

        let v: ApiVersion = "5.0-preview".parse().unwrap();
        assert!(v.is_preview());
        assert_eq!(v.to_string(), "5.0-preview");

        let v: ApiVersion = "3".parse().unwrap();
        assert_eq!(v.to_string(), "3.0");
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<ApiVersion>().is_err());
        assert!("x.y".parse::<ApiVersion>().is_err());
        assert!("7.1-beta".parse::<ApiVersion>().is_err());
        assert!("7.1-preview.x".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn preview_marker_does_not_order() {
        let released: ApiVersion = "4.1".parse().unwrap();
        let preview: ApiVersion = "4.1-preview.1".parse().unwrap();
        assert_eq!(released.cmp_release(&preview), Ordering::Equal);
        assert_ne!(released, preview);
    }

    #[test]
    fn in_range_request_is_echoed() {
        let loc = location("4.0", "7.2", Some("7.2"));
        let requested: ApiVersion = "6.0".parse().unwrap();
        let negotiated = negotiate(&requested, &loc, &VersionPolicy::default()).unwrap();
        assert_eq!(negotiated, requested);
    }

    #[test]
    fn preview_request_promotes_to_released_contract() {
        // git area, resource supports [4.0, 4.1] with releasedVersion 4.1:
        // a 4.1-preview.1 request goes out as plain 4.1.
        let loc = location("4.0", "4.1", Some("4.1"));
        let requested: ApiVersion = "4.1-preview.1".parse().unwrap();
        let negotiated = negotiate(&requested, &loc, &VersionPolicy::default()).unwrap();
        assert_eq!(negotiated.to_string(), "4.1");
    }

    #[test]
    fn preview_request_kept_verbatim_when_policy_disabled() {
        let loc = location("4.0", "4.1", Some("4.1"));
        let requested: ApiVersion = "4.1-preview.1".parse().unwrap();
        let policy = VersionPolicy {
            prefer_released: false,
        };
        let negotiated = negotiate(&requested, &loc, &policy).unwrap();
        assert_eq!(negotiated.to_string(), "4.1-preview.1");
    }

    #[test]
    fn unreleased_preview_stays_preview() {
        // Resource max is 5.0-preview territory: released version lags behind
        // the requested line, so the preview marker survives.
        let loc = location("4.0", "5.0", Some("4.1"));
        let requested: ApiVersion = "5.0-preview.1".parse().unwrap();
        let negotiated = negotiate(&requested, &loc, &VersionPolicy::default()).unwrap();
        assert_eq!(negotiated.to_string(), "5.0-preview.1");
    }

    #[test]
    fn out_of_range_downgrades_to_released_same_major() {
        let loc = location("4.0", "4.1", Some("4.1"));
        let requested: ApiVersion = "4.2".parse().unwrap();
        let negotiated = negotiate(&requested, &loc, &VersionPolicy::default()).unwrap();
        assert_eq!(negotiated.to_string(), "4.1");
    }

    #[test]
    fn cross_major_downgrade_is_refused() {
        let loc = location("4.0", "4.1", Some("4.1"));
        let requested: ApiVersion = "5.0".parse().unwrap();
        let err = negotiate(&requested, &loc, &VersionPolicy::default()).unwrap_err();
        match err {
            ClientError::UnsupportedApiVersion {
                requested, min, max, ..
            } => {
                assert_eq!(requested, "5.0");
                assert_eq!(min, "4.0");
                assert_eq!(max, "4.1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn no_released_version_means_no_fallback() {
        let loc = location("1.0", "2.0", None);
        let requested: ApiVersion = "3.0".parse().unwrap();
        assert!(negotiate(&requested, &loc, &VersionPolicy::default()).is_err());
    }

    #[test]
    fn negotiated_version_always_within_range() {
        let loc = location("4.0", "7.2", Some("7.0"));
        for requested in ["4.0", "5.1-preview", "7.2", "8.0", "7.3-preview.1"] {
            let requested: ApiVersion = requested.parse().unwrap();
            if let Ok(v) = negotiate(&requested, &loc, &VersionPolicy::default()) {
                assert!(v.in_range(&loc.min_version, &loc.max_version), "{v}");
            }
        }
    }
}
