//! Modelo de Location
//!
//! Coordenadas geográficas en grados decimales. Una `Location` se embebe en
//! cada Request y se guarda opcionalmente para usuarios y partners.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Ubicación asociada a un usuario (upsert en sitio, sin historial)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLocation {
    pub user_id: Uuid,
    pub location: Location,
}
