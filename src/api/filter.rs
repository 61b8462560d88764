use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::filter::{
    check_limits, describe_filters, filters_to_sql_where, sort_by_order, validate_filters, FilterError,
    FilterFieldInfo, FilterGroup, FilterValidation, SqlResult,
};

use super::extract::ApiJson;
use super::response::{ApiResponse, ApiResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub filters: Vec<FilterGroup>,
    #[serde(default)]
    pub fields: Vec<FilterFieldInfo>,
    #[serde(default)]
    pub table_alias: String,
}

#[derive(Debug, Serialize)]
pub struct DescribeResponse {
    pub description: String,
}

/// POST /api/filter/validate
pub async fn validate(
    State(config): State<Arc<AppConfig>>,
    ApiJson(request): ApiJson<FilterRequest>,
) -> ApiResult<FilterValidation> {
    check_limits(&request.filters, &config.filter)?;
    Ok(ApiResponse::success(validate_filters(&request.filters, &request.fields)))
}

/// POST /api/filter/sql - preview of the generated WHERE clause
pub async fn sql(State(config): State<Arc<AppConfig>>, ApiJson(request): ApiJson<FilterRequest>) -> ApiResult<SqlResult> {
    if !config.filter.allow_sql_preview {
        tracing::warn!("SQL preview requested while disabled");
        return Err(FilterError::SqlPreviewDisabled.into());
    }
    check_limits(&request.filters, &config.filter)?;

    let groups = sort_by_order(request.filters);
    let result = filters_to_sql_where(&groups, &request.table_alias)?;
    tracing::debug!("Generated filter SQL with {} params", result.params.len());
    Ok(ApiResponse::success(result))
}

/// POST /api/filter/describe
pub async fn describe(
    State(config): State<Arc<AppConfig>>,
    ApiJson(request): ApiJson<FilterRequest>,
) -> ApiResult<DescribeResponse> {
    check_limits(&request.filters, &config.filter)?;
    let groups = sort_by_order(request.filters);
    Ok(ApiResponse::success(DescribeResponse {
        description: describe_filters(&groups, &request.fields),
    }))
}
