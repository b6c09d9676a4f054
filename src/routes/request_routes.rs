use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::request_dto::{
    CreateRequestRequest, NearbyQuery, ServiceTypeQuery, UpdateRequestStatusRequest,
};
use crate::dto::ApiResponse;
use crate::models::{NearbyRequest, Pagination, Request};
use crate::routes::resolve_radius;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_request_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request).get(list_requests))
        .route("/nearby", get(nearby_requests))
        .route("/service", get(requests_by_service_type))
        .route("/user/:user_id", get(requests_by_user))
        .route("/partner/:partner_id", get(requests_by_partner))
        .route("/:id", get(get_request))
        .route("/:id/status", patch(update_request_status))
        .route("/:id/cancel", post(cancel_request))
        .route("/:id/complete", post(complete_request))
}

async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateRequestRequest>,
) -> Result<Json<ApiResponse<Request>>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let request = state.requests.create(payload.into()).await?;
    info!("🆘 Request {} creada por usuario {}", request.id, request.user_id);

    Ok(Json(ApiResponse::success_with_message(request, "Request created")))
}

async fn list_requests(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Request>>>, AppError> {
    let requests = state.requests.list(page).await?;
    Ok(Json(ApiResponse::success(requests)))
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Request>>, AppError> {
    let request = state.requests.get(id).await?;
    Ok(Json(ApiResponse::success(request)))
}

async fn requests_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Request>>>, AppError> {
    let requests = state.requests.by_user(user_id, page).await?;
    Ok(Json(ApiResponse::success(requests)))
}

async fn requests_by_partner(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Request>>>, AppError> {
    let requests = state.requests.by_partner(partner_id, page).await?;
    Ok(Json(ApiResponse::success(requests)))
}

async fn requests_by_service_type(
    State(state): State<AppState>,
    Query(query): Query<ServiceTypeQuery>,
) -> Result<Json<ApiResponse<Vec<Request>>>, AppError> {
    let requests = state
        .requests
        .by_service_type(query.service_type_id, query.page())
        .await?;
    Ok(Json(ApiResponse::success(requests)))
}

async fn nearby_requests(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<ApiResponse<Vec<NearbyRequest>>>, AppError> {
    query.validate().map_err(AppError::Validation)?;
    let radius_km = resolve_radius(&state, query.radius_km)?;

    let nearby = state
        .requests
        .nearby_pending(query.origin(), radius_km, query.page())
        .await?;
    info!(
        "📍 {} requests pendientes a menos de {} km de ({}, {})",
        nearby.len(),
        radius_km,
        query.latitude,
        query.longitude
    );

    Ok(Json(ApiResponse::success(nearby)))
}

async fn update_request_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequestStatusRequest>,
) -> Result<Json<ApiResponse<Request>>, AppError> {
    let request = state
        .requests
        .update_status(id, payload.status, payload.partner_id)
        .await?;
    info!("🔄 Request {} -> {}", request.id, request.status);

    Ok(Json(ApiResponse::success(request)))
}

async fn cancel_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Request>>, AppError> {
    let request = state.requests.cancel(id).await?;
    info!("🛑 Request {} cancelada", request.id);

    Ok(Json(ApiResponse::success_with_message(request, "Request cancelled")))
}

async fn complete_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Request>>, AppError> {
    let request = state.requests.complete(id).await?;
    info!("✅ Request {} completada", request.id);

    Ok(Json(ApiResponse::success_with_message(request, "Request completed")))
}
