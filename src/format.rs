//! TypeInfo-driven response formatting.
//!
//! The service sends loosely-typed JSON; contract metadata that matters to
//! clients (timestamps, enum codes, nested shapes) is described out-of-band
//! by a [`TypeInfo`] per response contract. A single recursive walk
//! reinterprets a decoded `serde_json::Value` against that descriptor:
//! date strings are normalized to RFC 3339 UTC, enum names become their
//! numeric codes, nested objects recurse, and everything the descriptor does
//! not mention is copied through untouched so server-side additions never
//! break the client.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};

/// How one field of a response object is reinterpreted.
#[derive(Debug)]
pub enum FieldKind {
    /// ISO-ish timestamp string, normalized to canonical RFC 3339 UTC.
    Date,
    /// Wire string name mapped to its numeric code. Unknown names pass
    /// through unmapped; server-side enum sets evolve independently.
    Enum(HashMap<&'static str, i64>),
    /// Nested object (or array of objects) described by its own descriptor.
    Object(&'static TypeInfo),
}

/// Field descriptors for one response contract.
///
/// Defined statically per shape, shared read-only across calls. Fields absent
/// from the descriptor are plain and copied verbatim.
#[derive(Debug, Default)]
pub struct TypeInfo {
    fields: HashMap<&'static str, FieldKind>,
}

impl TypeInfo {
    pub fn builder() -> TypeInfoBuilder {
        TypeInfoBuilder {
            fields: HashMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldKind> {
        self.fields.get(name)
    }
}

/// Builder for [`TypeInfo`] descriptors.
pub struct TypeInfoBuilder {
    fields: HashMap<&'static str, FieldKind>,
}

impl TypeInfoBuilder {
    /// Declare a timestamp field.
    pub fn date(mut self, field: &'static str) -> Self {
        self.fields.insert(field, FieldKind::Date);
        self
    }

    /// Declare an enum field with its name-to-code map. Names are matched
    /// case-insensitively against the wire value.
    pub fn enumeration(mut self, field: &'static str, values: &[(&'static str, i64)]) -> Self {
        let map = values.iter().copied().collect();
        self.fields.insert(field, FieldKind::Enum(map));
        self
    }

    /// Declare a nested object field described by another descriptor.
    pub fn object(mut self, field: &'static str, nested: &'static TypeInfo) -> Self {
        self.fields.insert(field, FieldKind::Object(nested));
        self
    }

    pub fn build(self) -> TypeInfo {
        TypeInfo {
            fields: self.fields,
        }
    }
}

/// Reinterpret a decoded payload against a descriptor.
///
/// With no descriptor the value passes through unchanged. With
/// `is_collection` the payload must be an array or the service's
/// `{count, value}` wrapper; each element is formatted independently in
/// input order. Otherwise the payload must be a single object (or null).
pub fn format(value: Value, type_info: Option<&TypeInfo>, is_collection: bool) -> Result<Value> {
    let Some(info) = type_info else {
        return Ok(value);
    };

    if is_collection {
        let items = collection_items(value)?;
        return Ok(Value::Array(
            items.into_iter().map(|item| format_object(item, info)).collect(),
        ));
    }

    match value {
        Value::Null => Ok(Value::Null),
        value @ Value::Object(_) => Ok(format_object(value, info)),
        other => Err(ClientError::Format(format!(
            "expected an object, got {}",
            kind_name(&other)
        ))),
    }
}

/// Pull the element list out of a collection payload: either a bare array or
/// the `{count, value}` wrapper every list endpoint of the service uses.
pub(crate) fn collection_items(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("value") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ClientError::Format(
                "expected an array or a {count, value} wrapper".into(),
            )),
        },
        other => Err(ClientError::Format(format!(
            "expected an array, got {}",
            kind_name(&other)
        ))),
    }
}

fn format_object(value: Value, info: &TypeInfo) -> Value {
    let Value::Object(map) = value else {
        // Degrade per element rather than failing the whole result; partial
        // metadata is still useful to the caller.
        tracing::warn!("expected an object while formatting, got {}", kind_name(&value));
        return value;
    };

    let mut formatted = Map::with_capacity(map.len());
    for (key, field_value) in map {
        let field_value = match info.field(&key) {
            Some(FieldKind::Date) => format_date(&key, field_value),
            Some(FieldKind::Enum(values)) => format_enum(field_value, values),
            Some(FieldKind::Object(nested)) => match field_value {
                Value::Array(items) => Value::Array(
                    items.into_iter().map(|item| format_object(item, nested)).collect(),
                ),
                other => format_object(other, nested),
            },
            None => field_value,
        };
        formatted.insert(key, field_value);
    }
    Value::Object(formatted)
}

fn format_date(field: &str, value: Value) -> Value {
    match value {
        Value::String(raw) => match parse_service_date(&raw) {
            Some(parsed) => Value::String(parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => {
                tracing::warn!("unparseable timestamp in field '{}': {:?}", field, raw);
                Value::String(raw)
            }
        },
        // Null and already-typed values pass through.
        other => other,
    }
}

fn format_enum(value: Value, values: &HashMap<&'static str, i64>) -> Value {
    match value {
        Value::String(name) => {
            let code = values
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(&name))
                .map(|(_, code)| *code);
            match code {
                Some(code) => Value::Number(code.into()),
                None => Value::String(name),
            }
        }
        // Numbers are already codes; formatting is idempotent.
        other => other,
    }
}

/// Parse the timestamp shapes the service emits: RFC 3339 with or without
/// fractional seconds, the offset-less `2024-01-01T00:00:00` form (UTC by
/// contract), and bare dates.
fn parse_service_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
