//! Sistema de manejo de errores
//!
//! Este módulo define los tipos de errores del flujo de despacho
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Already issued: {0}")]
    AlreadyIssued(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Código estable expuesto en el cuerpo de la respuesta
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidTransition(_) => "INVALID_TRANSITION",
            AppError::InvalidAssignment(_) => "INVALID_ASSIGNMENT",
            AppError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            AppError::AlreadyIssued(_) => "ALREADY_ISSUED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_)
            | AppError::InvalidAssignment(_)
            | AppError::PreconditionFailed(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition(_) | AppError::AlreadyIssued(_) => StatusCode::CONFLICT,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().to_string();

        let error_response = match self {
            AppError::Database(e) => {
                error!("❌ Database error: {}", e);
                ErrorResponse {
                    error: "Database Error".to_string(),
                    message: "An error occurred while accessing the database".to_string(),
                    details: None,
                    code,
                }
            }

            AppError::Validation(e) => {
                warn!("⚠️ Validation error: {}", e);
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code,
                }
            }

            AppError::NotFound(msg) => {
                warn!("🔍 Resource not found: {}", msg);
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }

            AppError::InvalidTransition(msg) => {
                warn!("🚫 Invalid transition: {}", msg);
                ErrorResponse {
                    error: "Invalid Transition".to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }

            AppError::InvalidAssignment(msg) => {
                warn!("🚫 Invalid assignment: {}", msg);
                ErrorResponse {
                    error: "Invalid Assignment".to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }

            AppError::PreconditionFailed(msg) => {
                warn!("🚫 Precondition failed: {}", msg);
                ErrorResponse {
                    error: "Precondition Failed".to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }

            AppError::AlreadyIssued(msg) => {
                warn!("🚫 Already issued: {}", msg);
                ErrorResponse {
                    error: "Already Issued".to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }

            AppError::Internal(msg) => {
                error!("❌ Internal error: {}", msg);
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "An unexpected error occurred".to_string(),
                    details: None,
                    code,
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación sobre un campo
pub fn validation_error(field: &'static str, error: validator::ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de transición inválida
pub fn invalid_transition_error(resource: &str, from: &str, to: &str) -> AppError {
    AppError::InvalidTransition(format!("{} cannot move from {} to {}", resource, from, to))
}
