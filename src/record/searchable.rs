use serde_json::{Map, Number, Value};
use std::borrow::Cow;

/// Name of the nested mapping some records carry alongside their top-level properties
pub const NESTED_FIELDS_KEY: &str = "fields";

/// Anything a table can search over.
///
/// Implementors return the text form of the value stored under `key`, or
/// `None` when the key is missing or null. Missing values never match a search.
pub trait Searchable {
    fn search_text(&self, key: &str) -> Option<Cow<'_, str>>;
}

/// Coerce a JSON value to the text that search queries are matched against
pub fn coerce_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Number(n) => Some(Cow::Owned(number_text(n))),
        Value::Array(items) => {
            let parts: Vec<Cow<'_, str>> = items
                .iter()
                .map(|v| coerce_text(v).unwrap_or(Cow::Borrowed("")))
                .collect();
            Some(Cow::Owned(parts.join(",")))
        }
        Value::Object(_) => Some(Cow::Owned(value.to_string())),
    }
}

/// Integral floats print without a fractional part, so `1.0` reads as `1`
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => f.to_string(),
        _ => n.to_string(),
    }
}

/// Resolve `key` on a JSON object, looking inside the nested `fields` mapping
/// when the object carries one. A `fields` entry that is not an object is
/// ignored and the lookup reads the top-level property.
pub fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match map.get(NESTED_FIELDS_KEY) {
        Some(Value::Object(nested)) => nested.get(key),
        _ => map.get(key),
    }
}

impl Searchable for Map<String, Value> {
    fn search_text(&self, key: &str) -> Option<Cow<'_, str>> {
        lookup(self, key).and_then(coerce_text)
    }
}

impl Searchable for Value {
    fn search_text(&self, key: &str) -> Option<Cow<'_, str>> {
        match self {
            Value::Object(map) => map.search_text(key),
            _ => None,
        }
    }
}

impl<T: Searchable + ?Sized> Searchable for &T {
    fn search_text(&self, key: &str) -> Option<Cow<'_, str>> {
        (**self).search_text(key)
    }
}
