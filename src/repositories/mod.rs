//! Repositorios
//!
//! Colaboradores de persistencia inyectados en los servicios. Cada agregado
//! expone `get`, `create` y sus consultas. Las mutaciones de estado son
//! condicionales: se aplican en una sola sentencia sólo si el estado previo
//! sigue siendo el esperado, y devuelven `None` en caso contrario (o si la
//! fila no existe). Hay dos implementaciones: PostgreSQL (`sqlx`) y un
//! almacén en memoria.

pub mod memory;
pub mod partner_repository;
pub mod request_repository;
pub mod transaction_repository;
pub mod user_location_repository;
pub mod verification_repository;

use async_trait::async_trait;
use uuid::Uuid;

use rust_decimal::Decimal;

use crate::models::{
    CarVerification, Guarantee, Location, Pagination, Partner, PartnerProfile, PaymentStatus,
    Request, RequestStatus, Transaction, UserLocation, VerificationStatus,
};
use crate::services::geo_matcher::BoundingBox;
use crate::utils::errors::{AppError, AppResult};

pub use memory::MemoryStore;
pub use partner_repository::PgPartnerRepository;
pub use request_repository::PgRequestRepository;
pub use transaction_repository::PgTransactionRepository;
pub use user_location_repository::PgUserLocationRepository;
pub use verification_repository::PgVerificationRepository;

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Request>>;

    async fn create(&self, request: &Request) -> AppResult<Request>;

    /// `from -> to` sólo si la Request sigue en `from`. Con `partner_id`
    /// también fija el partner, y sólo si aún no tenía uno.
    async fn transition(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        partner_id: Option<Uuid>,
    ) -> AppResult<Option<Request>>;

    /// Fijar el estado sin condición previa (operaciones administrativas)
    async fn force_status(&self, id: Uuid, to: RequestStatus) -> AppResult<Option<Request>>;

    async fn list(&self, page: Pagination) -> AppResult<Vec<Request>>;

    async fn find_by_user(&self, user_id: Uuid, page: Pagination) -> AppResult<Vec<Request>>;

    async fn find_by_partner(&self, partner_id: Uuid, page: Pagination) -> AppResult<Vec<Request>>;

    async fn find_by_service_type(
        &self,
        service_type_id: i32,
        page: Pagination,
    ) -> AppResult<Vec<Request>>;

    /// Requests en `PENDING` cuya ubicación cae dentro de la caja
    async fn find_pending_in_box(&self, bbox: BoundingBox) -> AppResult<Vec<Request>>;
}

#[async_trait]
pub trait PartnerRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Partner>>;

    async fn create(&self, partner: &Partner) -> AppResult<Partner>;

    async fn list(&self, page: Pagination) -> AppResult<Vec<Partner>>;

    /// Nueva ubicación; `is_available` pasa a `NOT banned`
    async fn set_location(&self, id: Uuid, location: Location) -> AppResult<Option<Partner>>;

    /// No hace nada (y devuelve `None`) si se pide disponibilidad para un
    /// partner baneado
    async fn set_availability(&self, id: Uuid, available: bool) -> AppResult<Option<Partner>>;

    /// Ban/unban: fija `banned`, `is_available = NOT banned` y las notas
    async fn set_banned(
        &self,
        id: Uuid,
        banned: bool,
        admin_notes: Option<String>,
    ) -> AppResult<Option<Partner>>;

    /// Sólo los campos presentes en `profile`
    async fn update_profile(
        &self,
        id: Uuid,
        profile: &PartnerProfile,
    ) -> AppResult<Option<Partner>>;

    /// Devuelve `false` si no existía. Falla con `PreconditionFailed` si
    /// alguna Request lo tiene asignado.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn find_available_by_service_type(
        &self,
        service_type_id: i32,
        page: Pagination,
    ) -> AppResult<Vec<Partner>>;

    /// Partners disponibles, no baneados y con ubicación dentro de la caja
    async fn find_available_in_box(&self, bbox: BoundingBox) -> AppResult<Vec<Partner>>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Transaction>>;

    async fn create(&self, transaction: &Transaction) -> AppResult<Transaction>;

    /// `from -> to` sólo si el pago sigue en `from`
    async fn transition_payment(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> AppResult<Option<Transaction>>;

    async fn set_tax(
        &self,
        id: Uuid,
        tax_amount: Decimal,
        total_amount: Decimal,
    ) -> AppResult<Option<Transaction>>;

    async fn list(&self, page: Pagination) -> AppResult<Vec<Transaction>>;

    async fn find_by_request(&self, request_id: Uuid) -> AppResult<Option<Transaction>>;

    async fn find_by_partner(
        &self,
        partner_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<Transaction>>;

    /// Transacciones de las Requests creadas por el usuario
    async fn find_by_user(&self, user_id: Uuid, page: Pagination) -> AppResult<Vec<Transaction>>;
}

#[async_trait]
pub trait VerificationRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<CarVerification>>;

    async fn create(&self, verification: &CarVerification) -> AppResult<CarVerification>;

    /// Registrar el resultado de un administrador. `REJECTED` no se aplica
    /// (devuelve `None`) si la verificación ya tiene garantía.
    async fn record_outcome(
        &self,
        id: Uuid,
        status: VerificationStatus,
        admin_id: Uuid,
    ) -> AppResult<Option<CarVerification>>;

    async fn list(&self, page: Pagination) -> AppResult<Vec<CarVerification>>;

    async fn find_by_user(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<CarVerification>>;

    async fn find_guarantee(&self, verification_id: Uuid) -> AppResult<Option<Guarantee>>;

    /// Insertar la garantía y enlazarla a su verificación (forzando `VERIFIED`)
    /// en una sola unidad. Falla con `AlreadyIssued` si ya existe una garantía
    /// para la verificación.
    async fn issue_guarantee(
        &self,
        guarantee: &Guarantee,
    ) -> AppResult<(Guarantee, CarVerification)>;
}

#[async_trait]
pub trait UserLocationRepository: Send + Sync {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserLocation>>;

    async fn upsert(&self, user_id: Uuid, location: Location) -> AppResult<UserLocation>;
}

/// Baja rechazada: el partner sigue referenciado por Requests
pub(crate) fn partner_in_use(id: Uuid) -> AppError {
    AppError::PreconditionFailed(format!(
        "partner '{}' has assigned requests and cannot be deleted",
        id
    ))
}
