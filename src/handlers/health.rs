// src/handlers/health.rs

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    #[schema(example = "postgres")]
    pub store: &'static str,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Servidor e store respondendo", body = HealthResponse),
        (status = 503, description = "Store indisponível", body = HealthResponse)
    )
)]
pub async fn health(State(app_state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = app_state.store.backend_name();

    match app_state.store.health_check().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok", store })),
        Err(e) => {
            tracing::error!(store, error = ?e, "health check falhou");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse { status: "unavailable", store }),
            )
        }
    }
}
