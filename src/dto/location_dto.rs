use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::Location;
use crate::utils::validation::{validate_latitude, validate_longitude};

// Request para publicar la ubicación de un partner
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePartnerLocationRequest {
    pub partner_id: Uuid,

    #[validate(custom = "validate_latitude")]
    pub latitude: f64,

    #[validate(custom = "validate_longitude")]
    pub longitude: f64,
}

impl UpdatePartnerLocationRequest {
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }
}

// Request para actualizar la ubicación de un usuario
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserLocationRequest {
    pub user_id: Uuid,

    #[validate(custom = "validate_latitude")]
    pub latitude: f64,

    #[validate(custom = "validate_longitude")]
    pub longitude: f64,
}

impl UpdateUserLocationRequest {
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }
}
