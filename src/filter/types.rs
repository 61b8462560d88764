use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
}

impl FieldType {
    /// Map a Postgres column type name onto the filterable field type
    pub fn from_column_type(column_type: &str) -> Option<Self> {
        Some(match column_type.trim().to_ascii_lowercase().as_str() {
            "text" | "varchar" | "character varying" | "char" | "string" => FieldType::Text,
            "integer" | "bigint" | "numeric" | "decimal" | "real" | "double precision" | "float"
            | "smallint" => FieldType::Number,
            "date" | "timestamp" | "timestamp without time zone" | "timestamp with time zone"
            | "time" => FieldType::Date,
            "boolean" | "bool" => FieldType::Boolean,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "==")] Eq,
    #[serde(rename = "!=")] Ne,
    #[serde(rename = ">")] Gt,
    #[serde(rename = "<")] Lt,
    #[serde(rename = ">=")] Gte,
    #[serde(rename = "<=")] Lte,
    #[serde(rename = "LIKE")] Like,
    #[serde(rename = "NOT LIKE")] NotLike,
    #[serde(rename = "contains")] Contains,
    #[serde(rename = "starts_with")] StartsWith,
    #[serde(rename = "ends_with")] EndsWith,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "==",
            FilterOperator::Ne => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Gte => ">=",
            FilterOperator::Lte => "<=",
            FilterOperator::Like => "LIKE",
            FilterOperator::NotLike => "NOT LIKE",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "starts_with",
            FilterOperator::EndsWith => "ends_with",
        }
    }

    /// Human-readable operator name used in filter descriptions
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "equals",
            FilterOperator::Ne => "not equals",
            FilterOperator::Gt => "greater than",
            FilterOperator::Lt => "less than",
            FilterOperator::Gte => "greater than or equal to",
            FilterOperator::Lte => "less than or equal to",
            FilterOperator::Like | FilterOperator::Contains => "contains",
            FilterOperator::NotLike => "not contains",
            FilterOperator::StartsWith => "starts with",
            FilterOperator::EndsWith => "ends with",
        }
    }
}

/// Operators a field type accepts
pub fn operators_for(field_type: FieldType) -> &'static [FilterOperator] {
    use FilterOperator::*;
    match field_type {
        FieldType::Text => &[Eq, Ne, Like, NotLike, Contains, StartsWith, EndsWith],
        FieldType::Number | FieldType::Date => &[Eq, Ne, Gt, Lt, Gte, Lte],
        FieldType::Boolean => &[Eq, Ne],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Logic {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub field_type: FieldType,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub condition_order: i32,
}

impl FilterCondition {
    /// Blank condition as offered by the filter builder
    pub fn default_condition() -> Self {
        Self {
            id: Some(format!("condition_{}", Uuid::new_v4().simple())),
            field_name: String::new(),
            field_type: FieldType::Text,
            operator: FilterOperator::Eq,
            value: Value::String(String::new()),
            condition_order: 0,
        }
    }
}

/// Conditions combined with one logic operator; groups are AND-ed together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub group_order: i32,
}

impl FilterGroup {
    pub fn default_group() -> Self {
        Self {
            id: format!("group_{}", Uuid::new_v4().simple()),
            conditions: vec![FilterCondition::default_condition()],
            logic: Logic::And,
            group_order: 0,
        }
    }
}

/// Sort groups by `group_order` and each group's conditions by `condition_order`
pub fn sort_by_order(mut groups: Vec<FilterGroup>) -> Vec<FilterGroup> {
    groups.sort_by_key(|g| g.group_order);
    for group in &mut groups {
        group.conditions.sort_by_key(|c| c.condition_order);
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFieldInfo {
    pub field_name: String,
    pub field_type: FieldType,
    pub display_name: String,
    #[serde(default = "default_filterable")]
    pub is_filterable: bool,
}

fn default_filterable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
