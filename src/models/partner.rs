//! Modelo de Partner
//!
//! Proveedor de servicio que atiende Requests. La disponibilidad se activa
//! al actualizar su ubicación y se desactiva cuando un administrador lo banea.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::location::Location;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_type_id: i32,
    pub is_available: bool,
    pub location: Option<Location>,
    pub banned: bool,
    pub admin_notes: Option<String>,
}

impl Partner {
    /// Partner recién creado a partir de una solicitud aprobada
    pub fn new(user_id: Uuid, service_type_id: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            service_type_id,
            is_available: false,
            location: None,
            banned: false,
            admin_notes: None,
        }
    }

    /// Un partner es candidato para matching si está disponible y no baneado
    pub fn is_matchable(&self) -> bool {
        self.is_available && !self.banned
    }
}

/// Cambios de perfil; los campos ausentes no se tocan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartnerProfile {
    pub service_type_id: Option<i32>,
    pub admin_notes: Option<String>,
}

impl PartnerProfile {
    pub fn is_empty(&self) -> bool {
        self.service_type_id.is_none() && self.admin_notes.is_none()
    }

    pub fn apply_to(&self, partner: &mut Partner) {
        if let Some(service_type_id) = self.service_type_id {
            partner.service_type_id = service_type_id;
        }
        if let Some(notes) = &self.admin_notes {
            partner.admin_notes = Some(notes.clone());
        }
    }
}

/// Partner acompañado de su distancia al origen de búsqueda
#[derive(Debug, Clone, Serialize)]
pub struct NearbyPartner {
    #[serde(flatten)]
    pub partner: Partner,
    pub distance_km: f64,
}
