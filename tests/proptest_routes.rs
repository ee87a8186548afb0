//! Property-based tests using proptest
//!
//! These tests verify route expansion totality, query omission rules,
//! version negotiation bounds, and formatter idempotence using randomized
//! inputs.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use proptest::prelude::*;
use reqwest::Method;
use serde_json::{json, Value};
use url::Url;

use azdo_client::format::{format, TypeInfo};
use azdo_client::request::{build, expand_route, CallSpec};
use azdo_client::version::{negotiate, ApiVersion, VersionPolicy};
use azdo_client::{ClientError, ResourceLocation};

/// Generate a placeholder identifier
fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,10}"
}

/// Generate a set of distinct placeholder names
fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(arb_name(), 1..5).prop_map(|set| set.into_iter().collect())
}

/// Generate a route value (may contain characters that need escaping)
fn arb_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ._-]{0,12}"
}

/// Build a template interleaving literal segments with the placeholders
fn template_for(names: &[String]) -> String {
    let mut template = String::from("_apis/svc");
    for name in names {
        template.push_str(&format!("/{{{}}}", name));
    }
    template
}

fn location_with(min: &str, max: &str, released: Option<&str>) -> ResourceLocation {
    ResourceLocation {
        id: "probe".into(),
        area: "probe".into(),
        resource_name: "probe".into(),
        route_template: "_apis/probe".into(),
        min_version: min.parse().unwrap(),
        max_version: max.parse().unwrap(),
        released_version: released.map(|v| v.parse().unwrap()),
        base_url: Url::parse("https://dev.azure.com/fabrikam/").unwrap(),
    }
}

fn date_and_enum_info() -> &'static TypeInfo {
    static INFO: OnceLock<TypeInfo> = OnceLock::new();
    INFO.get_or_init(|| {
        TypeInfo::builder()
            .date("createdDate")
            .enumeration("status", &[("active", 1), ("abandoned", 2), ("closed", 3)])
            .build()
    })
}

/// Generate a date-ish string: valid timestamps and garbage alike
fn arb_date_string() -> impl Strategy<Value = String> {
    prop_oneof![
        (2000u32..2100, 1u32..13, 1u32..28, 0u32..24, 0u32..60, 0u32..60).prop_map(
            |(y, mo, d, h, mi, s)| format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}Z")
        ),
        "[a-z ]{0,16}",
    ]
}

fn arb_status_string() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("active".to_string()),
        Just("Abandoned".to_string()),
        Just("closed".to_string()),
        "[a-z]{0,8}",
    ]
}

proptest! {
    /// Route expansion is total: all placeholders supplied means no braces
    /// survive into the expanded path
    #[test]
    fn route_expansion_is_total(
        names in arb_names(),
        values in prop::collection::vec(arb_value(), 5),
    ) {
        let template = template_for(&names);
        let route_values: HashMap<String, String> = names
            .iter()
            .cloned()
            .zip(values.into_iter().cycle())
            .collect();

        let expanded = expand_route(&template, &route_values).unwrap();
        prop_assert!(!expanded.contains('{'), "unexpanded placeholder in {expanded}");
        prop_assert!(!expanded.contains('}'), "unexpanded placeholder in {expanded}");
    }

    /// Any placeholder without a value fails fast with the placeholder name
    #[test]
    fn missing_route_value_is_reported(
        names in arb_names(),
        value in arb_value(),
    ) {
        let template = template_for(&names);
        let mut route_values: HashMap<String, String> =
            names.iter().map(|n| (n.clone(), value.clone())).collect();
        let dropped = names[0].clone();
        route_values.remove(&dropped);

        match expand_route(&template, &route_values) {
            Err(ClientError::IncompleteRoute { placeholder, .. }) => {
                prop_assert_eq!(placeholder, dropped);
            }
            other => prop_assert!(false, "expected IncompleteRoute, got {:?}", other.map(|_| ())),
        }
    }

    /// Absent query values never reach the URL; present-but-empty ones do
    #[test]
    fn absent_query_values_are_omitted(
        entries in prop::collection::hash_map("[a-z]{1,8}", prop::option::of(arb_value()), 0..6),
    ) {
        let mut spec = CallSpec::new(Method::GET, "probe", "probe").version("7.1");
        for (key, value) in &entries {
            spec = spec.query_opt(key, value.as_deref());
        }

        let version: ApiVersion = "7.1".parse().unwrap();
        let request = build(&location_with("1.0", "7.2", None), &version, &spec).unwrap();
        let url = request.url;
        let present: HashSet<String> = url
            .query_pairs()
            .map(|(k, _)| k.into_owned())
            .collect();

        for (key, value) in &entries {
            match value {
                Some(_) => prop_assert!(present.contains(key), "{key} missing from {url}"),
                None => prop_assert!(!present.contains(key), "{key} leaked into {url}"),
            }
        }
    }

    /// Negotiation never yields a version outside the resource's range
    #[test]
    fn negotiation_stays_in_range(
        req_major in 0u32..8, req_minor in 0u32..5, preview in any::<bool>(),
        min_major in 0u32..8, min_minor in 0u32..5,
        span_major in 0u32..3, span_minor in 0u32..5,
        released_major in 0u32..8, released_minor in 0u32..5,
        has_released in any::<bool>(),
    ) {
        let requested = {
            let raw = if preview {
                format!("{req_major}.{req_minor}-preview.1")
            } else {
                format!("{req_major}.{req_minor}")
            };
            raw.parse::<ApiVersion>().unwrap()
        };
        let min = format!("{min_major}.{min_minor}");
        let max = format!("{}.{}", min_major + span_major, min_minor + span_minor);
        let released = has_released.then(|| format!("{released_major}.{released_minor}"));

        let location = location_with(&min, &max, released.as_deref());
        if let Ok(negotiated) = negotiate(&requested, &location, &VersionPolicy::default()) {
            prop_assert!(
                negotiated.in_range(&location.min_version, &location.max_version),
                "negotiated {negotiated} outside [{min}, {max}]"
            );
        }
    }

    /// Formatting twice with the same descriptor changes nothing
    #[test]
    fn formatting_is_idempotent(
        date in arb_date_string(),
        status in arb_status_string(),
        extra in arb_value(),
    ) {
        let raw = json!({
            "createdDate": date,
            "status": status,
            "untouched": extra,
        });

        let once = format(raw, Some(date_and_enum_info()), false).unwrap();
        let twice = format(once.clone(), Some(date_and_enum_info()), false).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Collections of formatted objects preserve length and order
    #[test]
    fn collection_formatting_preserves_order(
        dates in prop::collection::vec(arb_date_string(), 0..8),
    ) {
        let raw = Value::Array(
            dates
                .iter()
                .map(|d| json!({"createdDate": d, "marker": d}))
                .collect(),
        );

        let formatted = format(raw, Some(date_and_enum_info()), true).unwrap();
        let items = formatted.as_array().unwrap();
        prop_assert_eq!(items.len(), dates.len());
        for (item, original) in items.iter().zip(&dates) {
            prop_assert_eq!(item["marker"].as_str().unwrap(), original.as_str());
        }
    }

    /// An empty collection is never an error, wrapped or bare
    #[test]
    fn empty_collections_format_cleanly(wrapped in any::<bool>()) {
        let raw = if wrapped {
            json!({"count": 0, "value": []})
        } else {
            json!([])
        };
        let formatted = format(raw, Some(date_and_enum_info()), true).unwrap();
        prop_assert_eq!(formatted, json!([]));
    }
}
