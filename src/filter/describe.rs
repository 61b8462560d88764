use serde_json::Value;

use crate::record::coerce_text;

use super::types::{FieldType, FilterCondition, FilterFieldInfo, FilterGroup};

pub const NO_FILTERS_DESCRIPTION: &str = "No filters applied";

/// Human-readable summary such as `Status equals open OR Amount greater than 5`
pub fn describe_filters(groups: &[FilterGroup], fields: &[FilterFieldInfo]) -> String {
    if groups.is_empty() {
        return NO_FILTERS_DESCRIPTION.to_string();
    }

    groups
        .iter()
        .filter(|g| !g.conditions.is_empty())
        .map(|group| {
            let separator = format!(" {} ", group.logic.as_str());
            group
                .conditions
                .iter()
                .map(|c| describe_condition(c, fields))
                .collect::<Vec<_>>()
                .join(separator.as_str())
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn describe_condition(condition: &FilterCondition, fields: &[FilterFieldInfo]) -> String {
    let name = fields
        .iter()
        .find(|f| f.field_name == condition.field_name)
        .map(|f| f.display_name.as_str())
        .unwrap_or(&condition.field_name);

    let value = if condition.field_type == FieldType::Boolean {
        if is_truthy(&condition.value) { "Yes".to_string() } else { "No".to_string() }
    } else {
        coerce_text(&condition.value)
            .map(|t| t.into_owned())
            .unwrap_or_else(|| "null".to_string())
    };

    format!("{} {} {}", name, condition.operator.display_name(), value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
