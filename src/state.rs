//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum: la configuración y los servicios de
//! despacho, ya cableados con sus repositorios.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{
    MemoryStore, PgPartnerRepository, PgRequestRepository, PgTransactionRepository,
    PgUserLocationRepository, PgVerificationRepository,
};
use crate::services::{
    GuaranteeRegistry, LocationService, PartnerService, RequestLifecycle, TransactionLedger,
};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub requests: RequestLifecycle,
    pub transactions: TransactionLedger,
    pub verifications: GuaranteeRegistry,
    pub locations: LocationService,
    pub partners: PartnerService,
}

impl AppState {
    /// Servicios respaldados por PostgreSQL
    pub fn from_pool(pool: PgPool, config: EnvironmentConfig) -> Self {
        let requests = Arc::new(PgRequestRepository::new(pool.clone()));
        let partners = Arc::new(PgPartnerRepository::new(pool.clone()));
        let transactions = Arc::new(PgTransactionRepository::new(pool.clone()));
        let verifications = Arc::new(PgVerificationRepository::new(pool.clone()));
        let user_locations = Arc::new(PgUserLocationRepository::new(pool));

        Self {
            config,
            requests: RequestLifecycle::new(requests.clone(), partners.clone()),
            transactions: TransactionLedger::new(transactions, requests),
            verifications: GuaranteeRegistry::new(verifications),
            locations: LocationService::new(partners.clone(), user_locations),
            partners: PartnerService::new(partners),
        }
    }

    /// Servicios sobre un único `MemoryStore` compartido
    pub fn in_memory(config: EnvironmentConfig) -> Self {
        let store = Arc::new(MemoryStore::new());

        Self {
            config,
            requests: RequestLifecycle::new(store.clone(), store.clone()),
            transactions: TransactionLedger::new(store.clone(), store.clone()),
            verifications: GuaranteeRegistry::new(store.clone()),
            locations: LocationService::new(store.clone(), store.clone()),
            partners: PartnerService::new(store),
        }
    }
}
