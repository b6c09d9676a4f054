//! RequestLifecycle
//!
//! Máquina de estados de una Request: creación, transiciones verificadas
//! contra la tabla de aristas legales, asignación de partner y las dos
//! operaciones administrativas (`cancel`, `complete`) que fuerzan el estado.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::{
    AdminOverride, Location, NearbyRequest, NewRequest, Pagination, Request, RequestStatus,
};
use crate::repositories::{PartnerRepository, RequestRepository};
use crate::services::geo_matcher::{self, BoundingBox};
use crate::utils::errors::{invalid_transition_error, not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct RequestLifecycle {
    requests: Arc<dyn RequestRepository>,
    partners: Arc<dyn PartnerRepository>,
}

impl RequestLifecycle {
    pub fn new(requests: Arc<dyn RequestRepository>, partners: Arc<dyn PartnerRepository>) -> Self {
        Self { requests, partners }
    }

    /// Crear una Request en `PENDING` sin partner asignado
    pub async fn create(&self, new: NewRequest) -> AppResult<Request> {
        self.requests.create(&Request::new(new)).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Request> {
        self.requests
            .get(id)
            .await?
            .ok_or_else(|| not_found_error("Request", &id.to_string()))
    }

    /// Transición verificada.
    ///
    /// Pasar a `ACCEPTED` exige `partner_id`: el partner debe existir y no
    /// estar baneado. Enviar `partner_id` hacia cualquier otro estado es una
    /// asignación inválida. Aristas fuera de la tabla fallan con
    /// `InvalidTransition`.
    pub async fn update_status(
        &self,
        id: Uuid,
        next: RequestStatus,
        partner_id: Option<Uuid>,
    ) -> AppResult<Request> {
        let request = self.get(id).await?;

        if !request.status.can_transition_to(next) {
            return Err(invalid_transition_error(
                "Request",
                request.status.as_str(),
                next.as_str(),
            ));
        }

        let assigned = match (next, partner_id) {
            (RequestStatus::Accepted, Some(partner_id)) => {
                let partner = self
                    .partners
                    .get(partner_id)
                    .await?
                    .ok_or_else(|| not_found_error("Partner", &partner_id.to_string()))?;
                if partner.banned {
                    return Err(AppError::InvalidAssignment(format!(
                        "partner '{}' is banned and cannot accept requests",
                        partner_id
                    )));
                }
                Some(partner.id)
            }
            (RequestStatus::Accepted, None) => {
                return Err(AppError::InvalidAssignment(
                    "accepting a request requires a partner_id".to_string(),
                ));
            }
            (_, Some(_)) => {
                return Err(AppError::InvalidAssignment(format!(
                    "partner_id can only be set when moving to {}",
                    RequestStatus::Accepted
                )));
            }
            (_, None) => None,
        };

        match self
            .requests
            .transition(id, request.status, next, assigned)
            .await?
        {
            Some(updated) => Ok(updated),
            // otro escritor cambió el estado entre la lectura y la escritura
            None => {
                let current = self.get(id).await?;
                Err(invalid_transition_error(
                    "Request",
                    current.status.as_str(),
                    next.as_str(),
                ))
            }
        }
    }

    /// Operación administrativa: fija el estado sin consultar la tabla
    pub async fn apply_override(&self, id: Uuid, action: AdminOverride) -> AppResult<Request> {
        self.requests
            .force_status(id, action.target())
            .await?
            .ok_or_else(|| not_found_error("Request", &id.to_string()))
    }

    pub async fn cancel(&self, id: Uuid) -> AppResult<Request> {
        self.apply_override(id, AdminOverride::Cancel).await
    }

    pub async fn complete(&self, id: Uuid) -> AppResult<Request> {
        self.apply_override(id, AdminOverride::Complete).await
    }

    pub async fn list(&self, page: Pagination) -> AppResult<Vec<Request>> {
        self.requests.list(page).await
    }

    pub async fn by_user(&self, user_id: Uuid, page: Pagination) -> AppResult<Vec<Request>> {
        self.requests.find_by_user(user_id, page).await
    }

    pub async fn by_partner(&self, partner_id: Uuid, page: Pagination) -> AppResult<Vec<Request>> {
        self.requests.find_by_partner(partner_id, page).await
    }

    pub async fn by_service_type(
        &self,
        service_type_id: i32,
        page: Pagination,
    ) -> AppResult<Vec<Request>> {
        self.requests
            .find_by_service_type(service_type_id, page)
            .await
    }

    /// Requests `PENDING` dentro de `radius_km`, la más cercana primero
    pub async fn nearby_pending(
        &self,
        origin: Location,
        radius_km: f64,
        page: Pagination,
    ) -> AppResult<Vec<NearbyRequest>> {
        let candidates = self
            .requests
            .find_pending_in_box(BoundingBox::around(origin, radius_km))
            .await?;

        let nearby = geo_matcher::find_nearby(origin, radius_km, candidates)
            .into_iter()
            .map(|m| NearbyRequest {
                request: m.item,
                distance_km: m.distance_km,
            })
            .collect();

        Ok(page.apply(nearby))
    }
}
