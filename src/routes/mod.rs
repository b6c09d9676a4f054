//! Rutas HTTP
//!
//! Un router por recurso, anidados bajo su prefijo en `create_app_router`.

pub mod location_routes;
pub mod partner_routes;
pub mod request_routes;
pub mod transaction_routes;
pub mod verification_routes;

use axum::{routing::get, Json, Router};
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::cors_layer;
use crate::state::AppState;
use crate::utils::errors::{validation_error, AppError};
use crate::utils::validation::validate_radius;

/// Router completo de la API con CORS, compresión y trazas HTTP
pub fn create_app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/request", request_routes::create_request_router())
        .nest("/transaction", transaction_routes::create_transaction_router())
        .nest("/carVerification", verification_routes::create_verification_router())
        .nest("/location", location_routes::create_location_router())
        .nest("/partner", partner_routes::create_partner_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Radio pedido o el configurado por defecto; debe ser positivo y finito
pub(crate) fn resolve_radius(state: &AppState, requested: Option<f64>) -> Result<f64, AppError> {
    let radius_km = requested.unwrap_or(state.config.default_search_radius_km);
    validate_radius(radius_km).map_err(|e| validation_error("radius_km", e))?;
    Ok(radius_km)
}
