pub mod extract;
pub mod filter;
pub mod response;
pub mod table;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, CONFIG};

pub use extract::ApiJson;
pub use response::{ApiResponse, ApiResult};

/// Router over the global configuration
pub fn app() -> Router {
    create_router(Arc::new(CONFIG.clone()))
}

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let body_limit = config.api.max_request_size_bytes;
    let cors = cors_layer(&config);
    let request_logging = config.api.enable_request_logging;

    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Table
        .route("/api/table/view", post(table::view))
        .route("/api/table/selection", post(table::selection))
        // Filters
        .route("/api/filter/validate", post(filter::validate))
        .route("/api/filter/sql", post(filter::sql))
        .route("/api/filter/describe", post(filter::describe))
        .with_state(config)
        .layer(DefaultBodyLimit::max(body_limit));

    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    if request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    let origins = &config.security.cors_origins;
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };
    Some(CorsLayer::new().allow_origin(allow_origin).allow_methods(Any).allow_headers(Any))
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Searchable Table API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Search, select and render tables of dynamic records",
            "endpoints": {
                "health": "GET /health",
                "table_view": "POST /api/table/view",
                "table_selection": "POST /api/table/selection",
                "filter_validate": "POST /api/filter/validate",
                "filter_sql": "POST /api/filter/sql",
                "filter_describe": "POST /api/filter/describe",
            }
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        create_router(Arc::new(AppConfig::for_environment(Environment::Development)))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn view_renders_selection_state() {
        let (status, body) = post_json(router(), "/api/table/view", json!({
            "data": [{"id": "1", "name": "Alice"}, {"id": "2", "name": "Bob"}],
            "search_keys": ["name"],
            "enable_selection": true,
            "id_field": "id",
            "selected": ["1"],
            "columns": ["name"]
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["state"], "table");
        assert_eq!(data["search"]["placeholder"], "Search...");
        assert_eq!(data["header"]["select_all"], json!({"type": "checkbox", "checked": false, "indeterminate": true}));
        assert_eq!(data["rows"][0]["selected"], true);
        assert_eq!(data["rows"][1]["id"], "2");
        assert_eq!(data["selection"]["indeterminate"], true);
    }

    #[tokio::test]
    async fn view_reports_no_search_results() {
        let (_, body) = post_json(router(), "/api/table/view", json!({
            "data": [{"name": "Alice"}],
            "search_keys": ["name"],
            "query": "zzz"
        }))
        .await;
        assert_eq!(body["data"]["state"], "empty");
        assert_eq!(body["data"]["message"], "No items found matching your search.");
    }

    #[tokio::test]
    async fn select_all_covers_only_visible_rows() {
        let (status, body) = post_json(router(), "/api/table/selection", json!({
            "data": [{"id": "1", "name": "Alice"}, {"id": "2", "name": "Bob"}, {"id": "3", "name": "Alina"}],
            "search_keys": ["name"],
            "query": "ali",
            "enable_selection": true,
            "id_field": "id",
            "action": {"type": "select_all", "checked": true}
        }))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({"changed": true, "selected": ["1", "3"]}));
    }

    #[tokio::test]
    async fn selection_is_a_no_op_when_disabled() {
        let (_, body) = post_json(router(), "/api/table/selection", json!({
            "data": [{"id": "1"}],
            "selected": ["9"],
            "action": {"type": "toggle", "id": "1", "checked": true}
        }))
        .await;
        assert_eq!(body["data"], json!({"changed": false, "selected": ["9"]}));
    }

    #[tokio::test]
    async fn selection_requires_id_field() {
        let (status, body) = post_json(router(), "/api/table/selection", json!({
            "data": [{"id": "1"}],
            "enable_selection": true,
            "action": {"type": "toggle", "id": "1", "checked": true}
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_bodies_use_the_error_envelope() {
        let send = |content_type: &'static str, body: &'static str| {
            router().oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/table/view")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
        };

        let response = send("application/json", "{\"data\": [").await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_JSON");

        let response = send("text/plain", "{}").await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, body) = post_json(router(), "/api/table/view", json!({"data": [1, 2]})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let mut config = AppConfig::for_environment(Environment::Development);
        config.api.max_request_size_bytes = 64;
        let app = create_router(Arc::new(config));
        let rows: Vec<Value> = (0..20).map(|i| json!({"id": i, "name": "padding"})).collect();
        let (status, body) = post_json(app, "/api/table/view", json!({"data": rows})).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn filter_sql_is_forbidden_in_production() {
        let app = create_router(Arc::new(AppConfig::for_environment(Environment::Production)));
        let (status, body) = post_json(app, "/api/filter/sql", json!({"filters": []})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn filter_endpoints() {
        let filters = json!([{
            "logic": "OR",
            "conditions": [
                {"field_name": "status", "operator": "==", "value": "open"},
                {"field_name": "name", "operator": "starts_with", "value": "Ac"}
            ]
        }]);
        let fields = json!([
            {"field_name": "status", "field_type": "text", "display_name": "Status", "is_filterable": true},
            {"field_name": "name", "field_type": "text", "display_name": "Name", "is_filterable": true}
        ]);

        let (_, body) = post_json(router(), "/api/filter/sql", json!({"filters": filters, "table_alias": "r"})).await;
        assert_eq!(body["data"]["query"], "(\"r\".\"status\" = $1 OR \"r\".\"name\" ILIKE $2)");
        assert_eq!(body["data"]["params"], json!(["open", "Ac%"]));

        let (_, body) = post_json(router(), "/api/filter/validate", json!({"filters": filters, "fields": fields})).await;
        assert_eq!(body["data"], json!({"is_valid": true, "errors": []}));

        let (_, body) = post_json(router(), "/api/filter/describe", json!({"filters": filters, "fields": fields})).await;
        assert_eq!(body["data"]["description"], "Status equals open OR Name starts with Ac");
    }
}
