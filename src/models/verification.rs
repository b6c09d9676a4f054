//! Modelos de verificación de vehículo y garantía
//!
//! Una `CarVerification` se crea en `PENDING`; un administrador la resuelve
//! y, opcionalmente, se le emite una única `Guarantee` con fecha de validez.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de verificación - mapea al ENUM verification_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "verification_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "PENDING",
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resultado que un administrador puede registrar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationOutcome {
    Verified,
    Rejected,
}

impl From<VerificationOutcome> for VerificationStatus {
    fn from(outcome: VerificationOutcome) -> Self {
        match outcome {
            VerificationOutcome::Verified => VerificationStatus::Verified,
            VerificationOutcome::Rejected => VerificationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct CarVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vin_number: String,
    pub car_model: String,
    pub year: i32,
    pub mileage: i64,
    pub status: VerificationStatus,
    pub verified_by_id: Option<Uuid>,
    pub guarantee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos para solicitar una verificación
#[derive(Debug, Clone)]
pub struct NewVerification {
    pub user_id: Uuid,
    pub vin_number: String,
    pub car_model: String,
    pub year: i32,
    pub mileage: i64,
}

impl CarVerification {
    pub fn new(new: NewVerification) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            vin_number: new.vin_number.trim().to_uppercase(),
            car_model: new.car_model,
            year: new.year,
            mileage: new.mileage,
            status: VerificationStatus::Pending,
            verified_by_id: None,
            guarantee_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Guarantee {
    pub id: Uuid,
    pub verification_id: Uuid,
    pub valid_until: DateTime<Utc>,
    pub terms: String,
    pub created_at: DateTime<Utc>,
}

impl Guarantee {
    pub fn new(verification_id: Uuid, valid_until: DateTime<Utc>, terms: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            verification_id,
            valid_until,
            terms,
            created_at: Utc::now(),
        }
    }

    /// Vigente mientras `now < valid_until`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.valid_until
    }
}

/// Vista de vigencia de la garantía de una verificación
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GuaranteeValidity {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
}

impl GuaranteeValidity {
    pub fn none() -> Self {
        Self {
            valid: false,
            valid_until: None,
            terms: None,
        }
    }

    pub fn of(guarantee: &Guarantee, now: DateTime<Utc>) -> Self {
        Self {
            valid: guarantee.is_valid_at(now),
            valid_until: Some(guarantee.valid_until),
            terms: Some(guarantee.terms.clone()),
        }
    }
}
