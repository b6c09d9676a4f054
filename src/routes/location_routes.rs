use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::location_dto::{UpdatePartnerLocationRequest, UpdateUserLocationRequest};
use crate::dto::request_dto::NearbyQuery;
use crate::dto::ApiResponse;
use crate::models::{Location, NearbyPartner, Partner, UserLocation};
use crate::routes::resolve_radius;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_location_router() -> Router<AppState> {
    Router::new()
        .route("/partner", put(update_partner_location))
        .route("/user", put(update_user_location))
        .route("/partner/:partner_id", get(partner_location))
        .route("/user/:user_id", get(user_location))
        .route("/nearby-partners", get(nearest_partners))
}

async fn update_partner_location(
    State(state): State<AppState>,
    Json(payload): Json<UpdatePartnerLocationRequest>,
) -> Result<Json<ApiResponse<Partner>>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let partner = state
        .locations
        .update_partner_location(payload.partner_id, payload.location())
        .await?;
    info!(
        "📍 Partner {} en ({}, {}), disponible: {}",
        partner.id, payload.latitude, payload.longitude, partner.is_available
    );

    Ok(Json(ApiResponse::success(partner)))
}

async fn update_user_location(
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserLocationRequest>,
) -> Result<Json<ApiResponse<UserLocation>>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let location = state
        .locations
        .update_user_location(payload.user_id, payload.location())
        .await?;
    Ok(Json(ApiResponse::success(location)))
}

async fn partner_location(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Location>>, AppError> {
    let location = state.locations.partner_location(partner_id).await?;
    Ok(Json(ApiResponse::success(location)))
}

async fn user_location(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Location>>, AppError> {
    let location = state.locations.user_location(user_id).await?;
    Ok(Json(ApiResponse::success(location)))
}

async fn nearest_partners(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<Vec<NearbyPartner>>>, AppError> {
    query.validate().map_err(AppError::Validation)?;
    let radius_km = resolve_radius(&state, query.radius_km)?;

    let partners = state
        .locations
        .nearest_partners(query.origin(), radius_km, query.page())
        .await?;
    info!(
        "🔍 {} partners disponibles a menos de {} km",
        partners.len(),
        radius_km
    );

    Ok(Json(ApiResponse::success(partners)))
}
