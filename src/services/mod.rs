//! Services module
//!
//! Este módulo contiene la lógica de negocio del despacho. Los servicios
//! reciben sus repositorios por construcción y no registran logs: los
//! errores se devuelven tipados al llamador.

pub mod geo_matcher;
pub mod guarantee_registry;
pub mod location_service;
pub mod partner_service;
pub mod request_lifecycle;
pub mod transaction_ledger;

pub use guarantee_registry::GuaranteeRegistry;
pub use location_service::LocationService;
pub use partner_service::PartnerService;
pub use request_lifecycle::RequestLifecycle;
pub use transaction_ledger::TransactionLedger;
