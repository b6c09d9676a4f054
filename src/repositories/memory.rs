//! Almacén en memoria
//!
//! Implementa todos los repositorios sobre mapas protegidos por un
//! `RwLock`. Cada escritura toma el lock de escritura y comprueba el
//! estado previo bajo ese mismo lock, igual que el `WHERE` de las
//! sentencias `UPDATE` en PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    partner_in_use, PartnerRepository, RequestRepository, TransactionRepository, UserLocationRepository,
    VerificationRepository,
};
use rust_decimal::Decimal;

use crate::models::{
    CarVerification, Guarantee, Location, Pagination, Partner, PartnerProfile, PaymentStatus,
    Request, RequestStatus, Transaction, UserLocation, VerificationStatus,
};
use crate::services::geo_matcher::BoundingBox;
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Debug, Default)]
struct Tables {
    requests: HashMap<Uuid, Request>,
    partners: HashMap<Uuid, Partner>,
    transactions: HashMap<Uuid, Transaction>,
    verifications: HashMap<Uuid, CarVerification>,
    // clave: verification_id
    guarantees: HashMap<Uuid, Guarantee>,
    user_locations: HashMap<Uuid, Location>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    read_delay: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simula la latencia de ida y vuelta de una base de datos en cada `get`
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    async fn round_trip(&self) {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
    }
}

/// Más recientes primero, con el id como desempate para un orden determinista
fn newest_first<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (chrono::DateTime<chrono::Utc>, Uuid),
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

fn by_id(mut partners: Vec<Partner>) -> Vec<Partner> {
    partners.sort_by_key(|p| p.id);
    partners
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<Request>> {
        self.round_trip().await;
        Ok(self.tables.read().await.requests.get(&id).cloned())
    }

    async fn create(&self, request: &Request) -> AppResult<Request> {
        let mut tables = self.tables.write().await;
        tables.requests.insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        partner_id: Option<Uuid>,
    ) -> AppResult<Option<Request>> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.requests.get_mut(&id) else {
            return Ok(None);
        };
        if stored.status != from || (partner_id.is_some() && stored.partner_id.is_some()) {
            return Ok(None);
        }

        stored.status = to;
        if partner_id.is_some() {
            stored.partner_id = partner_id;
        }
        stored.updated_at = chrono::Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn force_status(&self, id: Uuid, to: RequestStatus) -> AppResult<Option<Request>> {
        let mut tables = self.tables.write().await;
        Ok(tables.requests.get_mut(&id).map(|stored| {
            stored.status = to;
            stored.updated_at = chrono::Utc::now();
            stored.clone()
        }))
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<Request>> {
        let tables = self.tables.read().await;
        let all = tables.requests.values().cloned().collect();
        Ok(page.apply(newest_first(all, |r: &Request| (r.created_at, r.id))))
    }

    async fn find_by_user(&self, user_id: Uuid, page: Pagination) -> AppResult<Vec<Request>> {
        let tables = self.tables.read().await;
        let matching = tables
            .requests
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(page.apply(newest_first(matching, |r: &Request| (r.created_at, r.id))))
    }

    async fn find_by_partner(&self, partner_id: Uuid, page: Pagination) -> AppResult<Vec<Request>> {
        let tables = self.tables.read().await;
        let matching = tables
            .requests
            .values()
            .filter(|r| r.partner_id == Some(partner_id))
            .cloned()
            .collect();
        Ok(page.apply(newest_first(matching, |r: &Request| (r.created_at, r.id))))
    }

    async fn find_by_service_type(
        &self,
        service_type_id: i32,
        page: Pagination,
    ) -> AppResult<Vec<Request>> {
        let tables = self.tables.read().await;
        let matching = tables
            .requests
            .values()
            .filter(|r| r.service_type_id == service_type_id)
            .cloned()
            .collect();
        Ok(page.apply(newest_first(matching, |r: &Request| (r.created_at, r.id))))
    }

    async fn find_pending_in_box(&self, bbox: BoundingBox) -> AppResult<Vec<Request>> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Request> = tables
            .requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending && bbox.contains(r.location))
            .cloned()
            .collect();
        matching.sort_by_key(|r| (r.created_at, r.id));
        Ok(matching)
    }
}

#[async_trait]
impl PartnerRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<Partner>> {
        self.round_trip().await;
        Ok(self.tables.read().await.partners.get(&id).cloned())
    }

    async fn create(&self, partner: &Partner) -> AppResult<Partner> {
        let mut tables = self.tables.write().await;
        tables.partners.insert(partner.id, partner.clone());
        Ok(partner.clone())
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<Partner>> {
        let tables = self.tables.read().await;
        Ok(page.apply(by_id(tables.partners.values().cloned().collect())))
    }

    async fn set_location(&self, id: Uuid, location: Location) -> AppResult<Option<Partner>> {
        let mut tables = self.tables.write().await;
        Ok(tables.partners.get_mut(&id).map(|stored| {
            stored.location = Some(location);
            stored.is_available = !stored.banned;
            stored.clone()
        }))
    }

    async fn set_availability(&self, id: Uuid, available: bool) -> AppResult<Option<Partner>> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.partners.get_mut(&id) else {
            return Ok(None);
        };
        if available && stored.banned {
            return Ok(None);
        }

        stored.is_available = available;
        Ok(Some(stored.clone()))
    }

    async fn set_banned(
        &self,
        id: Uuid,
        banned: bool,
        admin_notes: Option<String>,
    ) -> AppResult<Option<Partner>> {
        let mut tables = self.tables.write().await;
        Ok(tables.partners.get_mut(&id).map(|stored| {
            stored.banned = banned;
            stored.is_available = !banned;
            stored.admin_notes = admin_notes;
            stored.clone()
        }))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        profile: &PartnerProfile,
    ) -> AppResult<Option<Partner>> {
        let mut tables = self.tables.write().await;
        Ok(tables.partners.get_mut(&id).map(|stored| {
            profile.apply_to(stored);
            stored.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.partners.contains_key(&id) {
            return Ok(false);
        }
        // ON DELETE RESTRICT
        if tables.requests.values().any(|r| r.partner_id == Some(id)) {
            return Err(partner_in_use(id));
        }
        tables.partners.remove(&id);
        Ok(true)
    }

    async fn find_available_by_service_type(
        &self,
        service_type_id: i32,
        page: Pagination,
    ) -> AppResult<Vec<Partner>> {
        let tables = self.tables.read().await;
        let matching = tables
            .partners
            .values()
            .filter(|p| p.service_type_id == service_type_id && p.is_matchable())
            .cloned()
            .collect();
        Ok(page.apply(by_id(matching)))
    }

    async fn find_available_in_box(&self, bbox: BoundingBox) -> AppResult<Vec<Partner>> {
        let tables = self.tables.read().await;
        let matching = tables
            .partners
            .values()
            .filter(|p| p.is_matchable() && p.location.is_some_and(|l| bbox.contains(l)))
            .cloned()
            .collect();
        Ok(by_id(matching))
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        self.round_trip().await;
        Ok(self.tables.read().await.transactions.get(&id).cloned())
    }

    async fn create(&self, transaction: &Transaction) -> AppResult<Transaction> {
        let mut tables = self.tables.write().await;
        // UNIQUE(request_id)
        if tables
            .transactions
            .values()
            .any(|t| t.request_id == transaction.request_id)
        {
            return Err(AppError::PreconditionFailed(format!(
                "a transaction already exists for request '{}'",
                transaction.request_id
            )));
        }
        tables.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction.clone())
    }

    async fn transition_payment(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> AppResult<Option<Transaction>> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.transactions.get_mut(&id) else {
            return Ok(None);
        };
        if stored.payment_status != from {
            return Ok(None);
        }

        stored.payment_status = to;
        stored.updated_at = chrono::Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn set_tax(
        &self,
        id: Uuid,
        tax_amount: Decimal,
        total_amount: Decimal,
    ) -> AppResult<Option<Transaction>> {
        let mut tables = self.tables.write().await;
        Ok(tables.transactions.get_mut(&id).map(|stored| {
            stored.tax_amount = tax_amount;
            stored.total_amount = total_amount;
            stored.updated_at = chrono::Utc::now();
            stored.clone()
        }))
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let all = tables.transactions.values().cloned().collect();
        Ok(page.apply(newest_first(all, |t: &Transaction| (t.created_at, t.id))))
    }

    async fn find_by_request(&self, request_id: Uuid) -> AppResult<Option<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .values()
            .find(|t| t.request_id == request_id)
            .cloned())
    }

    async fn find_by_partner(
        &self,
        partner_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let matching = tables
            .transactions
            .values()
            .filter(|t| t.partner_id == partner_id)
            .cloned()
            .collect();
        Ok(page.apply(newest_first(matching, |t: &Transaction| (t.created_at, t.id))))
    }

    async fn find_by_user(&self, user_id: Uuid, page: Pagination) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let matching = tables
            .transactions
            .values()
            .filter(|t| {
                tables
                    .requests
                    .get(&t.request_id)
                    .is_some_and(|r| r.user_id == user_id)
            })
            .cloned()
            .collect();
        Ok(page.apply(newest_first(matching, |t: &Transaction| (t.created_at, t.id))))
    }
}

#[async_trait]
impl VerificationRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<CarVerification>> {
        self.round_trip().await;
        Ok(self.tables.read().await.verifications.get(&id).cloned())
    }

    async fn create(&self, verification: &CarVerification) -> AppResult<CarVerification> {
        let mut tables = self.tables.write().await;
        tables
            .verifications
            .insert(verification.id, verification.clone());
        Ok(verification.clone())
    }

    async fn record_outcome(
        &self,
        id: Uuid,
        status: VerificationStatus,
        admin_id: Uuid,
    ) -> AppResult<Option<CarVerification>> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.verifications.get_mut(&id) else {
            return Ok(None);
        };
        if status == VerificationStatus::Rejected && stored.guarantee_id.is_some() {
            return Ok(None);
        }

        stored.status = status;
        stored.verified_by_id = Some(admin_id);
        stored.updated_at = chrono::Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<CarVerification>> {
        let tables = self.tables.read().await;
        let all = tables.verifications.values().cloned().collect();
        Ok(page.apply(newest_first(all, |v: &CarVerification| (v.created_at, v.id))))
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<CarVerification>> {
        let tables = self.tables.read().await;
        let matching = tables
            .verifications
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        Ok(page.apply(newest_first(matching, |v: &CarVerification| (v.created_at, v.id))))
    }

    async fn find_guarantee(&self, verification_id: Uuid) -> AppResult<Option<Guarantee>> {
        Ok(self
            .tables
            .read()
            .await
            .guarantees
            .get(&verification_id)
            .cloned())
    }

    async fn issue_guarantee(
        &self,
        guarantee: &Guarantee,
    ) -> AppResult<(Guarantee, CarVerification)> {
        let mut tables = self.tables.write().await;
        let verification_id = guarantee.verification_id;

        if !tables.verifications.contains_key(&verification_id) {
            return Err(not_found_error("CarVerification", &verification_id.to_string()));
        }
        // UNIQUE(verification_id)
        if tables.guarantees.contains_key(&verification_id) {
            return Err(AppError::AlreadyIssued(format!(
                "a guarantee was already issued for verification '{}'",
                verification_id
            )));
        }

        tables.guarantees.insert(verification_id, guarantee.clone());

        let verification = tables
            .verifications
            .get_mut(&verification_id)
            .ok_or_else(|| not_found_error("CarVerification", &verification_id.to_string()))?;
        verification.guarantee_id = Some(guarantee.id);
        verification.status = VerificationStatus::Verified;
        verification.updated_at = chrono::Utc::now();

        Ok((guarantee.clone(), verification.clone()))
    }
}

#[async_trait]
impl UserLocationRepository for MemoryStore {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserLocation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_locations
            .get(&user_id)
            .map(|location| UserLocation {
                user_id,
                location: *location,
            }))
    }

    async fn upsert(&self, user_id: Uuid, location: Location) -> AppResult<UserLocation> {
        let mut tables = self.tables.write().await;
        tables.user_locations.insert(user_id, location);
        Ok(UserLocation { user_id, location })
    }
}
