use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::verification_dto::{
    CreateVerificationRequest, IssueGuaranteeRequest, IssueGuaranteeResponse, VerifyCarRequest,
};
use crate::dto::ApiResponse;
use crate::models::{CarVerification, Guarantee, GuaranteeValidity, Pagination};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_verification_router() -> Router<AppState> {
    Router::new()
        .route("/", post(request_verification).get(list_verifications))
        .route("/user/:user_id", get(verifications_by_user))
        .route("/:id", get(get_verification))
        .route("/:id/verify", patch(verify_car))
        .route("/:id/guarantee", post(issue_guarantee).get(get_guarantee))
        .route("/:id/guarantee/validity", get(check_validity))
}

async fn request_verification(
    State(state): State<AppState>,
    Json(payload): Json<CreateVerificationRequest>,
) -> Result<Json<ApiResponse<CarVerification>>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let verification = state
        .verifications
        .request_verification(payload.into())
        .await?;
    info!(
        "🚗 Verificación {} solicitada para VIN {}",
        verification.id, verification.vin_number
    );

    Ok(Json(ApiResponse::success(verification)))
}

async fn list_verifications(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<CarVerification>>>, AppError> {
    let verifications = state.verifications.list(page).await?;
    Ok(Json(ApiResponse::success(verifications)))
}

async fn get_verification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CarVerification>>, AppError> {
    let verification = state.verifications.get(id).await?;
    Ok(Json(ApiResponse::success(verification)))
}

async fn verifications_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<CarVerification>>>, AppError> {
    let verifications = state.verifications.by_user(user_id, page).await?;
    Ok(Json(ApiResponse::success(verifications)))
}

async fn verify_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VerifyCarRequest>,
) -> Result<Json<ApiResponse<CarVerification>>, AppError> {
    let verification = state
        .verifications
        .verify(id, payload.admin_id, payload.status)
        .await?;
    info!(
        "🔎 Verificación {} -> {} por admin {}",
        verification.id, verification.status, payload.admin_id
    );

    let message = format!("Car {}", verification.status.as_str().to_lowercase());
    Ok(Json(ApiResponse::success_with_message(verification, message)))
}

async fn issue_guarantee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<IssueGuaranteeRequest>,
) -> Result<Json<ApiResponse<IssueGuaranteeResponse>>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let (guarantee, verification) = state
        .verifications
        .issue_guarantee(id, payload.valid_until, payload.terms)
        .await?;
    info!(
        "🛡️ Garantía {} emitida para verificación {} (válida hasta {})",
        guarantee.id, verification.id, guarantee.valid_until
    );

    Ok(Json(ApiResponse::success_with_message(
        IssueGuaranteeResponse {
            guarantee,
            verification,
        },
        "Guarantee issued",
    )))
}

async fn get_guarantee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Guarantee>>, AppError> {
    let guarantee = state.verifications.guarantee_for(id).await?;
    Ok(Json(ApiResponse::success(guarantee)))
}

async fn check_validity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GuaranteeValidity>>, AppError> {
    let validity = state.verifications.check_validity(id).await?;
    Ok(Json(ApiResponse::success(validity)))
}
