use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid table alias: {0}")]
    InvalidAlias(String),

    #[error("Too many filter groups: {count} (max {max})")]
    TooManyGroups { count: usize, max: usize },

    #[error("Group {group}: too many conditions: {count} (max {max})")]
    TooManyConditions { group: usize, count: usize, max: usize },

    #[error("SQL preview is disabled in this environment")]
    SqlPreviewDisabled,
}
