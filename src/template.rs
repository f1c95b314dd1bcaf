//! `<%= field %>` placeholder substitution

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::state::Record;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"<%=\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*%>")
            .expect("placeholder pattern is valid")
    })
}

/// Whether a string contains placeholders
pub fn has_placeholders(pattern: &str) -> bool {
    placeholder().is_match(pattern)
}

/// Replace every placeholder with the named field of a record
///
/// Dotted names reach into nested objects. Missing fields become the empty
/// string.
pub fn substitute(pattern: &str, record: &dyn Record) -> String {
    placeholder()
        .replace_all(pattern, |caps: &Captures<'_>| {
            lookup(record, &caps[1]).map(|v| value_to_text(&v)).unwrap_or_default()
        })
        .into_owned()
}

/// Substitute placeholders in every string of a value
pub fn substitute_value(value: &Value, record: &dyn Record) -> Value {
    match value {
        Value::String(s) if has_placeholders(s) => Value::String(substitute(s, record)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_value(v, record)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_value(v, record)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn lookup(record: &dyn Record, path: &str) -> Option<Value> {
    let mut parts = path.split('.');
    let mut value = record.field(parts.next()?)?;
    for part in parts {
        value = value.get(part)?.clone();
    }
    Some(value)
}

/// Display text of a value: strings verbatim, null as empty
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
