//! Servicio de ubicaciones
//!
//! Actualización en sitio de las ubicaciones de usuarios y partners, y
//! búsqueda de los partners disponibles más cercanos.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::{Location, NearbyPartner, Pagination, Partner, UserLocation};
use crate::repositories::{PartnerRepository, UserLocationRepository};
use crate::services::geo_matcher::{self, BoundingBox};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct LocationService {
    partners: Arc<dyn PartnerRepository>,
    user_locations: Arc<dyn UserLocationRepository>,
}

impl LocationService {
    pub fn new(
        partners: Arc<dyn PartnerRepository>,
        user_locations: Arc<dyn UserLocationRepository>,
    ) -> Self {
        Self {
            partners,
            user_locations,
        }
    }

    /// Reemplaza la ubicación del partner y lo marca disponible.
    /// Un partner baneado conserva `is_available = false`.
    pub async fn update_partner_location(
        &self,
        partner_id: Uuid,
        location: Location,
    ) -> AppResult<Partner> {
        self.partners
            .set_location(partner_id, location)
            .await?
            .ok_or_else(|| not_found_error("Partner", &partner_id.to_string()))
    }

    pub async fn update_user_location(
        &self,
        user_id: Uuid,
        location: Location,
    ) -> AppResult<UserLocation> {
        self.user_locations.upsert(user_id, location).await
    }

    pub async fn partner_location(&self, partner_id: Uuid) -> AppResult<Location> {
        self.partners
            .get(partner_id)
            .await?
            .and_then(|p| p.location)
            .ok_or_else(|| {
                AppError::NotFound(format!("Location for partner '{}' not found", partner_id))
            })
    }

    pub async fn user_location(&self, user_id: Uuid) -> AppResult<Location> {
        self.user_locations
            .get(user_id)
            .await?
            .map(|u| u.location)
            .ok_or_else(|| {
                AppError::NotFound(format!("Location for user '{}' not found", user_id))
            })
    }

    /// Partners disponibles y no baneados dentro de `radius_km`, el más
    /// cercano primero. `distance_km` se expone redondeada a 2 decimales.
    pub async fn nearest_partners(
        &self,
        origin: Location,
        radius_km: f64,
        page: Pagination,
    ) -> AppResult<Vec<NearbyPartner>> {
        let candidates = self
            .partners
            .find_available_in_box(BoundingBox::around(origin, radius_km))
            .await?;

        let nearby = geo_matcher::find_nearby(origin, radius_km, candidates)
            .into_iter()
            .map(|m| NearbyPartner {
                partner: m.item,
                distance_km: round2(m.distance_km),
            })
            .collect();

        Ok(page.apply(nearby))
    }
}

fn round2(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryStore;

    const ALGIERS: Location = Location {
        latitude: 36.75,
        longitude: 3.06,
    };

    struct Fixture {
        store: MemoryStore,
        service: LocationService,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let service = LocationService::new(Arc::new(store.clone()), Arc::new(store.clone()));
        Fixture { store, service }
    }

    async fn partner(store: &MemoryStore, banned: bool) -> Partner {
        let mut partner = Partner::new(Uuid::new_v4(), 1);
        partner.banned = banned;
        PartnerRepository::create(store, &partner).await.unwrap()
    }

    /// Punto a `km` kilómetros al norte del origen
    fn north_of(origin: Location, km: f64) -> Location {
        Location::new(
            origin.latitude + (km / geo_matcher::EARTH_RADIUS_KM).to_degrees(),
            origin.longitude,
        )
    }

    #[tokio::test]
    async fn test_update_partner_location_makes_available() {
        let f = fixture();
        let p = partner(&f.store, false).await;
        assert!(!p.is_available);

        let updated = f.service.update_partner_location(p.id, ALGIERS).await.unwrap();
        assert!(updated.is_available);
        assert_eq!(updated.location, Some(ALGIERS));
        assert_eq!(f.service.partner_location(p.id).await.unwrap(), ALGIERS);
    }

    #[tokio::test]
    async fn test_banned_partner_stays_unavailable() {
        let f = fixture();
        let p = partner(&f.store, true).await;

        let updated = f.service.update_partner_location(p.id, ALGIERS).await.unwrap();
        assert!(!updated.is_available);

        let found = f
            .service
            .nearest_partners(ALGIERS, 10.0, Pagination::default())
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_missing_locations_are_not_found() {
        let f = fixture();
        let p = partner(&f.store, false).await;

        assert!(matches!(
            f.service.partner_location(p.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.user_location(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.update_partner_location(Uuid::new_v4(), ALGIERS).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_user_location_is_overwritten() {
        let f = fixture();
        let user_id = Uuid::new_v4();

        f.service.update_user_location(user_id, ALGIERS).await.unwrap();
        let moved = Location::new(35.69, -0.63);
        f.service.update_user_location(user_id, moved).await.unwrap();

        assert_eq!(f.service.user_location(user_id).await.unwrap(), moved);
    }

    #[tokio::test]
    async fn test_nearest_partners_within_radius() {
        let f = fixture();
        let p = partner(&f.store, false).await;
        let q = partner(&f.store, false).await;
        f.service
            .update_partner_location(p.id, north_of(ALGIERS, 5.0))
            .await
            .unwrap();
        f.service
            .update_partner_location(q.id, north_of(ALGIERS, 20.0))
            .await
            .unwrap();

        let found = f
            .service
            .nearest_partners(ALGIERS, 10.0, Pagination::default())
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].partner.id, p.id);
        assert_eq!(found[0].distance_km, 5.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(4.999_9), 5.0);
        assert_eq!(round2(12.344), 12.34);
    }
}
