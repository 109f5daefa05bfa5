//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, delete_pattern_handler, get_all_handler, get_handler, get_multiple_handler,
    health_handler, put_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a key-value pair
/// - `GET /get/:key` - Retrieve a value by key
/// - `POST /get` - Retrieve several keys, in order
/// - `GET /all` - Retrieve every value in the namespace
/// - `DELETE /del/:key` - Delete a key
/// - `DELETE /pattern/:fragment` - Delete every key starting with a fragment
/// - `GET /stats` - Operation counters
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(put_handler))
        .route("/get", axum::routing::post(get_multiple_handler))
        .route("/get/:key", get(get_handler))
        .route("/all", get(get_all_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/pattern/:fragment", delete(delete_pattern_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NamespacedCache;
    use crate::store::MemoryStore;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let cache = NamespacedCache::new("T_", Arc::new(MemoryStore::new())).unwrap();
        create_router(AppState::new(cache))
    }

    async fn status_of(method: Method, uri: &str, body: &'static str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        create_test_app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_every_route_is_mounted() {
        let cases = [
            (Method::GET, "/health", ""),
            (Method::GET, "/stats", ""),
            (Method::GET, "/all", ""),
            (Method::PUT, "/set", r#"{"key":"k","value":"v"}"#),
            (Method::POST, "/get", r#"{"keys":["k"]}"#),
            (Method::DELETE, "/del/k", ""),
            (Method::DELETE, "/pattern/k", ""),
        ];

        for (method, uri, body) in cases {
            let status = status_of(method.clone(), uri, body).await;
            assert_eq!(status, StatusCode::OK, "{} {}", method, uri);
        }
    }

    #[tokio::test]
    async fn test_single_get_of_missing_key_is_404() {
        let status = status_of(Method::GET, "/get/missing", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let status = status_of(Method::POST, "/set", r#"{"key":"k","value":"v"}"#).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let status = status_of(Method::GET, "/keys", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
