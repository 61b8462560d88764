use std::cmp::Ordering;

use serde_json::Value;

use crate::record::{coerce_text, Record};

use super::types::{FieldType, FilterCondition, FilterGroup, FilterOperator, Logic};
use super::validate::parse_date;

/// Evaluate filter groups against a record in memory.
///
/// Groups are AND-ed, empty groups are ignored. A condition on a missing or
/// null value never matches, whatever the operator.
pub fn matches_filters(groups: &[FilterGroup], record: &Record) -> bool {
    groups
        .iter()
        .filter(|g| !g.conditions.is_empty())
        .all(|g| matches_group(g, record))
}

pub fn matches_group(group: &FilterGroup, record: &Record) -> bool {
    let mut results = group.conditions.iter().map(|c| matches_condition(c, record));
    match group.logic {
        Logic::And => results.all(|m| m),
        Logic::Or => results.any(|m| m),
    }
}

pub fn matches_condition(condition: &FilterCondition, record: &Record) -> bool {
    let Some(actual) = record.field(&condition.field_name).filter(|v| !v.is_null()) else {
        return false;
    };
    if condition.value.is_null() {
        return false;
    }

    match condition.operator {
        FilterOperator::Like | FilterOperator::Contains => text_match(actual, &condition.value, |a, b| a.contains(b)),
        FilterOperator::NotLike => text_match(actual, &condition.value, |a, b| !a.contains(b)),
        FilterOperator::StartsWith => text_match(actual, &condition.value, |a, b| a.starts_with(b)),
        FilterOperator::EndsWith => text_match(actual, &condition.value, |a, b| a.ends_with(b)),
        op => match compare(condition.field_type, actual, &condition.value) {
            Some(ordering) => match op {
                FilterOperator::Eq => ordering == Ordering::Equal,
                FilterOperator::Ne => ordering != Ordering::Equal,
                FilterOperator::Gt => ordering == Ordering::Greater,
                FilterOperator::Lt => ordering == Ordering::Less,
                FilterOperator::Gte => ordering != Ordering::Less,
                FilterOperator::Lte => ordering != Ordering::Greater,
                _ => false,
            },
            None => false,
        },
    }
}

fn text_match(actual: &Value, expected: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    match (coerce_text(actual), coerce_text(expected)) {
        (Some(a), Some(b)) => test(&a.to_lowercase(), &b.to_lowercase()),
        _ => false,
    }
}

/// Ordering of the record value relative to the condition value, `None` when
/// either side cannot be read as the field type.
///
/// An untyped condition compares on the stored value: two JSON numbers or two
/// booleans compare as such, anything else as text.
fn compare(field_type: FieldType, actual: &Value, expected: &Value) -> Option<Ordering> {
    match field_type {
        FieldType::Number => as_number(actual)?.partial_cmp(&as_number(expected)?),
        FieldType::Date => Some(parse_date(actual.as_str()?)?.cmp(&parse_date(expected.as_str()?)?)),
        FieldType::Boolean => Some(as_bool(actual)?.cmp(&as_bool(expected)?)),
        FieldType::Text => match (actual, expected) {
            (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => Some(coerce_text(actual)?.cmp(&coerce_text(expected)?)),
        },
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
