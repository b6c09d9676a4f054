use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::transaction_dto::{CreateTransactionRequest, UpdatePaymentStatusRequest};
use crate::dto::ApiResponse;
use crate::models::{Pagination, Transaction};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_transaction_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_transaction).get(list_transactions))
        .route("/request/:request_id", get(transaction_by_request))
        .route("/user/:user_id", get(transactions_by_user))
        .route("/partner/:partner_id", get(transactions_by_partner))
        .route("/:id/status", patch(update_payment_status))
        .route("/:id/tax", post(recompute_tax))
        .route("/:id/refund", post(refund_transaction))
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let transaction = state
        .transactions
        .create_for_request(payload.request_id, payload.partner_id, payload.amount)
        .await?;
    info!(
        "💰 Transacción {} para request {}: total {}",
        transaction.id, transaction.request_id, transaction.total_amount
    );

    Ok(Json(ApiResponse::success(transaction)))
}

async fn list_transactions(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, AppError> {
    let transactions = state.transactions.list(page).await?;
    Ok(Json(ApiResponse::success(transactions)))
}

async fn transaction_by_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    let transaction = state.transactions.by_request(request_id).await?;
    Ok(Json(ApiResponse::success(transaction)))
}

async fn transactions_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, AppError> {
    let transactions = state.transactions.by_user(user_id, page).await?;
    Ok(Json(ApiResponse::success(transactions)))
}

async fn transactions_by_partner(
    State(state): State<AppState>,
    Path(partner_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, AppError> {
    let transactions = state.transactions.by_partner(partner_id, page).await?;
    Ok(Json(ApiResponse::success(transactions)))
}

async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    let transaction = state
        .transactions
        .set_payment_status(id, payload.payment_status)
        .await?;
    info!("💳 Transacción {} -> {}", transaction.id, transaction.payment_status);

    Ok(Json(ApiResponse::success(transaction)))
}

async fn recompute_tax(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    let transaction = state.transactions.recompute_tax(id).await?;
    Ok(Json(ApiResponse::success(transaction)))
}

async fn refund_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Transaction>>, AppError> {
    let transaction = state.transactions.refund(id).await?;
    info!("↩️ Transacción {} reembolsada", transaction.id);

    Ok(Json(ApiResponse::success_with_message(transaction, "Transaction refunded")))
}
