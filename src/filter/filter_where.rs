use serde_json::Value;

use crate::record::coerce_text;

use super::error::FilterError;
use super::types::{FilterCondition, FilterGroup, FilterOperator, SqlResult};

const MAX_IDENTIFIER_LEN: usize = 63;

/// Builds a parameterised WHERE clause from filter groups.
///
/// Each group becomes `(c1 <logic> c2 ...)` and groups are AND-ed. Placeholders
/// are numbered across the whole clause starting after `starting_param_index`.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(groups: &[FilterGroup], table_alias: &str) -> Result<SqlResult, FilterError> {
        Self::new(0).build(groups, table_alias)
    }

    fn build(mut self, groups: &[FilterGroup], table_alias: &str) -> Result<SqlResult, FilterError> {
        let alias = table_alias.trim();
        if !alias.is_empty() && !is_valid_identifier(alias) {
            return Err(FilterError::InvalidAlias(alias.to_string()));
        }

        let mut clauses = vec![];
        for group in groups {
            if group.conditions.is_empty() {
                continue;
            }
            let mut parts = Vec::with_capacity(group.conditions.len());
            for condition in &group.conditions {
                parts.push(self.build_condition(condition, alias)?);
            }
            let separator = format!(" {} ", group.logic.as_str());
            clauses.push(format!("({})", parts.join(separator.as_str())));
        }

        Ok(SqlResult {
            query: clauses.join(" AND "),
            params: self.param_values,
        })
    }

    fn build_condition(&mut self, condition: &FilterCondition, alias: &str) -> Result<String, FilterError> {
        let column = quote_column(&condition.field_name, alias)?;
        let sql = match condition.operator {
            FilterOperator::Eq => format!("{} = {}", column, self.param(condition.value.clone())),
            FilterOperator::Ne => format!("{} <> {}", column, self.param(condition.value.clone())),
            FilterOperator::Gt => format!("{} > {}", column, self.param(condition.value.clone())),
            FilterOperator::Lt => format!("{} < {}", column, self.param(condition.value.clone())),
            FilterOperator::Gte => format!("{} >= {}", column, self.param(condition.value.clone())),
            FilterOperator::Lte => format!("{} <= {}", column, self.param(condition.value.clone())),
            FilterOperator::Like | FilterOperator::Contains => {
                format!("{} ILIKE {}", column, self.pattern("%", &condition.value, "%"))
            }
            FilterOperator::NotLike => {
                format!("{} NOT ILIKE {}", column, self.pattern("%", &condition.value, "%"))
            }
            FilterOperator::StartsWith => format!("{} ILIKE {}", column, self.pattern("", &condition.value, "%")),
            FilterOperator::EndsWith => format!("{} ILIKE {}", column, self.pattern("%", &condition.value, "")),
        };
        Ok(sql)
    }

    fn pattern(&mut self, prefix: &str, value: &Value, suffix: &str) -> String {
        let text = coerce_text(value).unwrap_or_default();
        self.param(Value::String(format!("{prefix}{text}{suffix}")))
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

pub fn filters_to_sql_where(groups: &[FilterGroup], table_alias: &str) -> Result<SqlResult, FilterError> {
    FilterWhere::generate(groups, table_alias)
}

fn quote_column(field_name: &str, alias: &str) -> Result<String, FilterError> {
    if !is_valid_identifier(field_name) {
        return Err(FilterError::InvalidColumn(field_name.to_string()));
    }
    if alias.is_empty() {
        Ok(format!("\"{}\"", field_name))
    } else {
        Ok(format!("\"{}\".\"{}\"", alias, field_name))
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= MAX_IDENTIFIER_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
