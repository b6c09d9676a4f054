//! Modelos del sistema
//!
//! Entidades del flujo de despacho: ubicaciones, partners, solicitudes,
//! transacciones y verificaciones con su garantía.

pub mod location;
pub mod pagination;
pub mod partner;
pub mod request;
pub mod transaction;
pub mod verification;

pub use location::{Location, UserLocation};
pub use pagination::Pagination;
pub use partner::{NearbyPartner, Partner, PartnerProfile};
pub use request::{AdminOverride, NearbyRequest, NewRequest, Request, RequestStatus};
pub use transaction::{PaymentStatus, Transaction};
pub use verification::{
    CarVerification, Guarantee, GuaranteeValidity, NewVerification, VerificationOutcome,
    VerificationStatus,
};
