use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::config::FilterConfig;

use super::error::FilterError;
use super::types::{operators_for, FieldType, FilterFieldInfo, FilterGroup, FilterValidation};

/// Check filter groups against the available fields.
///
/// Each condition reports at most one problem: the first check it fails.
pub fn validate_filters(groups: &[FilterGroup], fields: &[FilterFieldInfo]) -> FilterValidation {
    let mut errors = vec![];

    for (g, group) in groups.iter().enumerate() {
        let group_no = g + 1;
        if group.conditions.is_empty() {
            errors.push(format!("Group {}: Must have at least one condition", group_no));
            continue;
        }

        for (c, condition) in group.conditions.iter().enumerate() {
            let prefix = format!("Group {}, Condition {}", group_no, c + 1);

            if condition.field_name.is_empty() {
                errors.push(format!("{}: Field is required", prefix));
                continue;
            }

            let Some(field) = fields.iter().find(|f| f.field_name == condition.field_name) else {
                errors.push(format!("{}: Field \"{}\" not found", prefix, condition.field_name));
                continue;
            };

            if !field.is_filterable {
                errors.push(format!("{}: Field \"{}\" is not filterable", prefix, condition.field_name));
                continue;
            }

            if !operators_for(field.field_type).contains(&condition.operator) {
                errors.push(format!(
                    "{}: Operator \"{}\" is not valid for field type \"{}\"",
                    prefix,
                    condition.operator.as_str(),
                    field.field_type.as_str()
                ));
                continue;
            }

            if is_blank(&condition.value) {
                errors.push(format!("{}: Value is required", prefix));
                continue;
            }

            let type_ok = match field.field_type {
                FieldType::Number => condition.value.is_number(),
                FieldType::Boolean => condition.value.is_boolean(),
                FieldType::Date => is_valid_date(&condition.value),
                FieldType::Text => true,
            };
            if !type_ok {
                let expected = match field.field_type {
                    FieldType::Date => "a valid date",
                    FieldType::Boolean => "a boolean",
                    _ => "a number",
                };
                errors.push(format!(
                    "{}: Value must be {} for field type \"{}\"",
                    prefix,
                    expected,
                    field.field_type.as_str()
                ));
            }
        }
    }

    FilterValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Enforce the configured size limits on a filter list
pub fn check_limits(groups: &[FilterGroup], limits: &FilterConfig) -> Result<(), FilterError> {
    if groups.len() > limits.max_groups {
        return Err(FilterError::TooManyGroups {
            count: groups.len(),
            max: limits.max_groups,
        });
    }
    for (i, group) in groups.iter().enumerate() {
        if group.conditions.len() > limits.max_conditions_per_group {
            return Err(FilterError::TooManyConditions {
                group: i + 1,
                count: group.conditions.len(),
                max: limits.max_conditions_per_group,
            });
        }
    }
    Ok(())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub fn is_valid_date(value: &Value) -> bool {
    value.as_str().and_then(parse_date).is_some()
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DD`, and `YYYY-MM-DD[T ]HH:MM:SS`
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
