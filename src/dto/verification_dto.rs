use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CarVerification, Guarantee, NewVerification, VerificationOutcome};
use crate::utils::validation::validate_vin;

// Request para solicitar la verificación de un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVerificationRequest {
    pub user_id: Uuid,

    #[validate(custom = "validate_vin")]
    pub vin_number: String,

    #[validate(length(min = 2, max = 100))]
    pub car_model: String,

    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,

    #[validate(range(min = 1))]
    pub mileage: i64,
}

impl From<CreateVerificationRequest> for NewVerification {
    fn from(dto: CreateVerificationRequest) -> Self {
        Self {
            user_id: dto.user_id,
            vin_number: dto.vin_number,
            car_model: dto.car_model,
            year: dto.year,
            mileage: dto.mileage,
        }
    }
}

// Request de un administrador con el resultado de la verificación
#[derive(Debug, Deserialize)]
pub struct VerifyCarRequest {
    pub admin_id: Uuid,
    pub status: VerificationOutcome,
}

// Request para emitir la garantía
#[derive(Debug, Deserialize, Validate)]
pub struct IssueGuaranteeRequest {
    pub valid_until: DateTime<Utc>,

    #[validate(length(min = 10))]
    pub terms: String,
}

// Response de emisión: garantía y verificación actualizada
#[derive(Debug, Serialize)]
pub struct IssueGuaranteeResponse {
    pub guarantee: Guarantee,
    pub verification: CarVerification,
}
