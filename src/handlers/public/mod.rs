// handlers/public/mod.rs - Public handlers (no authentication required)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - Service descriptor
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Library Admin",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Admin service for the school digital library",
            "endpoints": {
                "health": "/health (public)",
                "login": "/login, /logout (public)",
                "functions": "/functions/v1/upload-and-insert, /functions/v1/delete-book-and-files (admin)",
                "console": "/dashboard, /books/:id, /books/:id/edit, /analytics, /settings (admin)"
            }
        }
    }))
}

/// GET /health - Pings the catalog store
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
