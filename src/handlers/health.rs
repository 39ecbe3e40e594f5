use crate::error::{HealthResponse, UnhealthyResponse};
use crate::models::MessageResponse;
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// GET / handler - Liveness endpoint
///
/// Always answers while the process is serving requests; it does not touch
/// the store.
#[utoipa::path(
    get,
    path = routes::ROOT,
    responses(
        (status = 200, description = "Service is running", body = MessageResponse)
    ),
    tag = "health"
)]
pub async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse::new("Up & Running"))
}

/// GET /health handler - Readiness endpoint
///
/// Asks the store to prove it can reach its backend.
/// Returns 200 OK if it can, 503 Service Unavailable otherwise.
#[utoipa::path(
    get,
    path = routes::HEALTH,
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = UnhealthyResponse)
    ),
    tag = "health"
)]
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<HealthResponse>), (StatusCode, Json<UnhealthyResponse>)> {
    match state.store.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            Ok((
                StatusCode::OK,
                Json(HealthResponse {
                    status: "healthy".to_string(),
                }),
            ))
        }
        Err(e) => {
            tracing::error!("Health check failed: {:#}", e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(UnhealthyResponse {
                    status: "unhealthy".to_string(),
                    error: format!("Cannot reach todo store: {}", e),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::{body::Body, http::Request, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn setup_test_app(store: MemoryStore) -> Router {
        routes::router(AppState::new(Arc::new(store)))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, axum::body::Bytes) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_root_reports_up_and_running() {
        let (status, body) = get(setup_test_app(MemoryStore::new()), "/").await;

        assert_eq!(status, StatusCode::OK);
        let response_json: MessageResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response_json.message, "Up & Running");
    }

    #[tokio::test]
    async fn test_root_does_not_depend_on_store() {
        let store = MemoryStore::new();
        store.set_failing(true);

        let (status, _) = get(setup_test_app(store), "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_endpoint_healthy() {
        let (status, body) = get(setup_test_app(MemoryStore::new()), "/health").await;

        assert_eq!(status, StatusCode::OK);
        let response_json: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response_json.status, "healthy");
    }

    #[tokio::test]
    async fn test_health_endpoint_unhealthy() {
        let store = MemoryStore::new();
        store.set_failing(true);

        let (status, body) = get(setup_test_app(store), "/health").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let response_json: UnhealthyResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response_json.status, "unhealthy");
        assert!(response_json.error.contains("Cannot reach todo store"));
    }
}
