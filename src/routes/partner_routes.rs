use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::partner_dto::{
    BanPartnerRequest, CreatePartnerRequest, SetAvailabilityRequest, UpdatePartnerProfileRequest,
};
use crate::dto::request_dto::ServiceTypeQuery;
use crate::dto::ApiResponse;
use crate::models::{Pagination, Partner};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_partner_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_partner).get(list_partners))
        .route("/service", get(partners_by_service_type))
        .route(
            "/:id",
            get(get_partner).patch(update_profile).delete(delete_partner),
        )
        .route("/:id/availability", patch(set_availability))
        .route("/:id/ban", post(ban_partner))
        .route("/:id/unban", post(unban_partner))
}

async fn create_partner(
    State(state): State<AppState>,
    Json(payload): Json<CreatePartnerRequest>,
) -> Result<Json<ApiResponse<Partner>>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let partner = state
        .partners
        .create_from_application(payload.user_id, payload.service_type_id)
        .await?;
    info!("🤝 Partner {} dado de alta para usuario {}", partner.id, partner.user_id);

    Ok(Json(ApiResponse::success(partner)))
}

async fn get_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Partner>>, AppError> {
    let partner = state.partners.get(id).await?;
    Ok(Json(ApiResponse::success(partner)))
}

async fn list_partners(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Partner>>>, AppError> {
    let partners = state.partners.list(page).await?;
    Ok(Json(ApiResponse::success(partners)))
}

async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePartnerProfileRequest>,
) -> Result<Json<ApiResponse<Partner>>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let partner = state.partners.update_profile(id, payload.into()).await?;
    info!("📝 Perfil del partner {} actualizado", partner.id);

    Ok(Json(ApiResponse::success(partner)))
}

async fn partners_by_service_type(
    State(state): State<AppState>,
    Query(query): Query<ServiceTypeQuery>,
) -> Result<Json<ApiResponse<Vec<Partner>>>, AppError> {
    let partners = state
        .partners
        .by_service_type(query.service_type_id, query.page())
        .await?;
    Ok(Json(ApiResponse::success(partners)))
}

async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetAvailabilityRequest>,
) -> Result<Json<ApiResponse<Partner>>, AppError> {
    let partner = state
        .partners
        .set_availability(id, payload.is_available)
        .await?;
    Ok(Json(ApiResponse::success(partner)))
}

async fn ban_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<BanPartnerRequest>>,
) -> Result<Json<ApiResponse<Partner>>, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate().map_err(AppError::Validation)?;

    let partner = state.partners.ban(id, payload.reason).await?;
    warn!("⛔ Partner {} baneado", partner.id);

    Ok(Json(ApiResponse::success_with_message(partner, "Partner banned")))
}

async fn unban_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Partner>>, AppError> {
    let partner = state.partners.unban(id).await?;
    info!("✅ Partner {} rehabilitado", partner.id);

    Ok(Json(ApiResponse::success_with_message(partner, "Partner unbanned")))
}

async fn delete_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.partners.delete(id).await?;
    warn!("🗑️ Partner {} eliminado", id);

    Ok(Json(ApiResponse::message("Partner deleted")))
}
