pub mod types;
pub mod validate;
pub mod filter_where;
pub mod describe;
pub mod evaluate;
pub mod error;

pub use types::*;
pub use validate::{check_limits, validate_filters};
pub use filter_where::{filters_to_sql_where, FilterWhere};
pub use describe::describe_filters;
pub use evaluate::matches_filters;
pub use error::FilterError;
