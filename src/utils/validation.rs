//! Utilidades de validación
//!
//! Validadores reutilizados por los DTOs (vía `validator`) y por los
//! handlers que reciben coordenadas en query params.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

lazy_static! {
    /// VIN: 10 a 17 caracteres alfanuméricos (sin I, O ni Q en el estándar de 17)
    pub static ref VIN_REGEX: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{10,17}$").unwrap();
}

/// Validar formato de coordenadas GPS
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat);
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }

    if !(-180.0..=180.0).contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng);
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }

    Ok(())
}

/// Adaptadores para `#[validate(custom = ...)]` sobre campos sueltos
pub fn validate_latitude(value: f64) -> Result<(), ValidationError> {
    validate_coordinates(value, 0.0)
}

pub fn validate_longitude(value: f64) -> Result<(), ValidationError> {
    validate_coordinates(0.0, value)
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Adaptador para `#[validate(custom = ...)]` sobre montos
pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)
}

/// Validar que un radio de búsqueda sea positivo y finito
pub fn validate_radius(radius_km: f64) -> Result<(), ValidationError> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        let mut error = ValidationError::new("radius_km");
        error.add_param("value".into(), &radius_km);
        return Err(error);
    }
    Ok(())
}

/// Validar número de chasis (VIN), normalizado a mayúsculas
pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    if !VIN_REGEX.is_match(&value.trim().to_uppercase()) {
        let mut error = ValidationError::new("vin_number");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"10-17 alphanumeric characters".to_string());
        return Err(error);
    }
    Ok(())
}
