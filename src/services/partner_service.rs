//! Servicio de partners
//!
//! Alta desde una solicitud aprobada, disponibilidad y moderación
//! administrativa (ban/unban, baja).

use std::sync::Arc;

use uuid::Uuid;

use crate::models::{Pagination, Partner, PartnerProfile};
use crate::repositories::PartnerRepository;
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct PartnerService {
    partners: Arc<dyn PartnerRepository>,
}

impl PartnerService {
    pub fn new(partners: Arc<dyn PartnerRepository>) -> Self {
        Self { partners }
    }

    /// Crear el partner de una solicitud aprobada; queda no disponible hasta
    /// que publique su ubicación
    pub async fn create_from_application(
        &self,
        user_id: Uuid,
        service_type_id: i32,
    ) -> AppResult<Partner> {
        self.partners
            .create(&Partner::new(user_id, service_type_id))
            .await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Partner> {
        self.partners
            .get(id)
            .await?
            .ok_or_else(|| not_found_error("Partner", &id.to_string()))
    }

    /// Partners disponibles para un tipo de servicio
    pub async fn by_service_type(
        &self,
        service_type_id: i32,
        page: Pagination,
    ) -> AppResult<Vec<Partner>> {
        self.partners
            .find_available_by_service_type(service_type_id, page)
            .await
    }

    pub async fn list(&self, page: Pagination) -> AppResult<Vec<Partner>> {
        self.partners.list(page).await
    }

    pub async fn set_availability(&self, id: Uuid, available: bool) -> AppResult<Partner> {
        match self.partners.set_availability(id, available).await? {
            Some(partner) => Ok(partner),
            None => {
                // distinguir "no existe" de "baneado"
                self.get(id).await?;
                Err(AppError::PreconditionFailed(format!(
                    "partner '{}' is banned and cannot become available",
                    id
                )))
            }
        }
    }

    /// Cambiar tipo de servicio y/o notas administrativas
    pub async fn update_profile(&self, id: Uuid, profile: PartnerProfile) -> AppResult<Partner> {
        if profile.is_empty() {
            return self.get(id).await;
        }

        self.partners
            .update_profile(id, &profile)
            .await?
            .ok_or_else(|| not_found_error("Partner", &id.to_string()))
    }

    pub async fn ban(&self, id: Uuid, reason: Option<String>) -> AppResult<Partner> {
        self.partners
            .set_banned(id, true, reason)
            .await?
            .ok_or_else(|| not_found_error("Partner", &id.to_string()))
    }

    pub async fn unban(&self, id: Uuid) -> AppResult<Partner> {
        self.partners
            .set_banned(id, false, None)
            .await?
            .ok_or_else(|| not_found_error("Partner", &id.to_string()))
    }

    /// Baja definitiva. Se rechaza mientras alguna Request lo tenga asignado.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.partners.delete(id).await? {
            return Err(not_found_error("Partner", &id.to_string()));
        }
        Ok(())
    }
}
