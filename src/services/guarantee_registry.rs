//! GuaranteeRegistry
//!
//! Verificación de vehículos de partners y emisión de la garantía asociada.
//! Una verificación admite como máximo una garantía.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::ValidationError;

use crate::models::{
    CarVerification, Guarantee, GuaranteeValidity, NewVerification, Pagination,
    VerificationOutcome,
};
use crate::repositories::VerificationRepository;
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};
use crate::utils::validation::validate_positive;

pub const MIN_CAR_YEAR: i32 = 1900;
pub const MAX_CAR_YEAR: i32 = 2100;

#[derive(Clone)]
pub struct GuaranteeRegistry {
    verifications: Arc<dyn VerificationRepository>,
}

impl GuaranteeRegistry {
    pub fn new(verifications: Arc<dyn VerificationRepository>) -> Self {
        Self { verifications }
    }

    /// Registrar una verificación en `PENDING`
    pub async fn request_verification(&self, new: NewVerification) -> AppResult<CarVerification> {
        if !(MIN_CAR_YEAR..=MAX_CAR_YEAR).contains(&new.year) {
            let mut error = ValidationError::new("year");
            error.add_param("value".into(), &new.year);
            return Err(validation_error("year", error));
        }
        validate_positive(new.mileage).map_err(|e| validation_error("mileage", e))?;

        self.verifications
            .create(&CarVerification::new(new))
            .await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<CarVerification> {
        self.verifications
            .get(id)
            .await?
            .ok_or_else(|| not_found_error("CarVerification", &id.to_string()))
    }

    /// Resultado de un administrador. No crea garantía.
    ///
    /// Una verificación con garantía emitida no puede pasar a `REJECTED`.
    pub async fn verify(
        &self,
        id: Uuid,
        admin_id: Uuid,
        outcome: VerificationOutcome,
    ) -> AppResult<CarVerification> {
        let verification = self.get(id).await?;
        let rejection_blocked = || {
            AppError::PreconditionFailed(format!(
                "verification '{}' already has a guarantee and cannot be rejected",
                id
            ))
        };

        if outcome == VerificationOutcome::Rejected && verification.guarantee_id.is_some() {
            return Err(rejection_blocked());
        }

        // None: la garantía se emitió entre la lectura y la escritura
        self.verifications
            .record_outcome(id, outcome.into(), admin_id)
            .await?
            .ok_or_else(rejection_blocked)
    }

    /// Emitir la garantía, enlazarla y forzar `VERIFIED`.
    ///
    /// Una segunda emisión falla con `AlreadyIssued` y deja intacta la primera.
    pub async fn issue_guarantee(
        &self,
        id: Uuid,
        valid_until: DateTime<Utc>,
        terms: String,
    ) -> AppResult<(Guarantee, CarVerification)> {
        let verification = self.get(id).await?;

        if verification.guarantee_id.is_some()
            || self.verifications.find_guarantee(id).await?.is_some()
        {
            return Err(AppError::AlreadyIssued(format!(
                "a guarantee was already issued for verification '{}'",
                id
            )));
        }

        self.verifications
            .issue_guarantee(&Guarantee::new(id, valid_until, terms))
            .await
    }

    pub async fn guarantee_for(&self, id: Uuid) -> AppResult<Guarantee> {
        self.verifications
            .find_guarantee(id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Guarantee for verification '{}' not found", id))
            })
    }

    pub async fn check_validity(&self, id: Uuid) -> AppResult<GuaranteeValidity> {
        self.check_validity_at(id, Utc::now()).await
    }

    /// Vigencia evaluada en `now`; `{valid: false}` si no hay garantía
    pub async fn check_validity_at(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<GuaranteeValidity> {
        Ok(match self.verifications.find_guarantee(id).await? {
            Some(guarantee) => GuaranteeValidity::of(&guarantee, now),
            None => GuaranteeValidity::none(),
        })
    }

    pub async fn by_user(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<CarVerification>> {
        self.verifications.find_by_user(user_id, page).await
    }

    pub async fn list(&self, page: Pagination) -> AppResult<Vec<CarVerification>> {
        self.verifications.list(page).await
    }
}
