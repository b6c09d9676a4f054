use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::PartnerProfile;

// Request para dar de alta un partner desde una solicitud aprobada
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePartnerRequest {
    pub user_id: Uuid,

    #[validate(range(min = 1))]
    pub service_type_id: i32,
}

// Request para cambiar la disponibilidad
#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    pub is_available: bool,
}

// Request de baneo con motivo opcional
#[derive(Debug, Default, Deserialize, Validate)]
pub struct BanPartnerRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

// Request de actualización de perfil; los campos ausentes no cambian
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePartnerProfileRequest {
    #[validate(range(min = 1))]
    pub service_type_id: Option<i32>,

    #[validate(length(max = 500))]
    pub admin_notes: Option<String>,
}

impl From<UpdatePartnerProfileRequest> for PartnerProfile {
    fn from(dto: UpdatePartnerProfileRequest) -> Self {
        Self {
            service_type_id: dto.service_type_id,
            admin_notes: dto.admin_notes,
        }
    }
}
