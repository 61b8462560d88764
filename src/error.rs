// HTTP API Error Types
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::filter::FilterError;
use crate::table::TableError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 403 Forbidden
    Forbidden(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Forbidden(_) => 403,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });
        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }
        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidColumn(ref column) => {
                let mut field_errors = HashMap::new();
                field_errors.insert(column.clone(), "Invalid column name".to_string());
                ApiError::validation_error(err.to_string(), Some(field_errors))
            }
            FilterError::InvalidAlias(_) | FilterError::TooManyGroups { .. } | FilterError::TooManyConditions { .. } => {
                ApiError::validation_error(err.to_string(), None)
            }
            FilterError::SqlPreviewDisabled => ApiError::forbidden(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::validation_error(e.body_text(), None),
            JsonRejection::JsonSyntaxError(e) => ApiError::invalid_json(e.body_text()),
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(other.body_text()),
            other => ApiError::bad_request(other.body_text()),
        }
    }
}

impl From<TableError> for ApiError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::TooManyRows { .. } => ApiError::payload_too_large(err.to_string()),
            TableError::MissingIdField => {
                let mut field_errors = HashMap::new();
                field_errors.insert("id_field".to_string(), "This field is required".to_string());
                ApiError::validation_error(err.to_string(), Some(field_errors))
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_errors_map_to_status_codes() {
        assert_eq!(ApiError::from(FilterError::SqlPreviewDisabled).status_code(), 403);
        let err = ApiError::from(FilterError::InvalidColumn("x y".into()));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json()["field_errors"]["x y"], "Invalid column name");
    }

    #[test]
    fn table_errors_map_to_status_codes() {
        let err = ApiError::from(TableError::TooManyRows { count: 5, max: 2 });
        assert_eq!(err.status_code(), 413);
        assert_eq!(err.to_json()["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(ApiError::from(TableError::MissingIdField).error_code(), "VALIDATION_ERROR");
    }
}
