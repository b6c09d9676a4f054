use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Location, NewRequest, Pagination, RequestStatus};
use crate::utils::validation::{validate_latitude, validate_longitude};

// Request para crear una solicitud de servicio
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestRequest {
    pub user_id: Uuid,

    #[validate(range(min = 1))]
    pub service_type_id: i32,

    #[validate(custom = "validate_latitude")]
    pub latitude: f64,

    #[validate(custom = "validate_longitude")]
    pub longitude: f64,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl From<CreateRequestRequest> for NewRequest {
    fn from(dto: CreateRequestRequest) -> Self {
        Self {
            user_id: dto.user_id,
            service_type_id: dto.service_type_id,
            location: Location::new(dto.latitude, dto.longitude),
            description: dto.description,
        }
    }
}

// Request para cambiar el estado de una solicitud
#[derive(Debug, Deserialize)]
pub struct UpdateRequestStatusRequest {
    pub status: RequestStatus,
    pub partner_id: Option<Uuid>,
}

// Query de búsqueda por proximidad
#[derive(Debug, Deserialize, Validate)]
pub struct NearbyQuery {
    #[validate(custom = "validate_latitude")]
    pub latitude: f64,

    #[validate(custom = "validate_longitude")]
    pub longitude: f64,

    pub radius_km: Option<f64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl NearbyQuery {
    pub fn origin(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }

    pub fn page(&self) -> Pagination {
        Pagination {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

// Query de listado por tipo de servicio
#[derive(Debug, Deserialize)]
pub struct ServiceTypeQuery {
    pub service_type_id: i32,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ServiceTypeQuery {
    pub fn page(&self) -> Pagination {
        Pagination {
            limit: self.limit,
            offset: self.offset,
        }
    }
}
