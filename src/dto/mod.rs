//! DTOs de la API
//!
//! Cuerpos y query params de entrada, validados con `validator` antes de
//! llegar a los servicios, y el envoltorio de respuesta `ApiResponse`.

pub mod api_response;
pub mod location_dto;
pub mod partner_dto;
pub mod request_dto;
pub mod transaction_dto;
pub mod verification_dto;

pub use api_response::ApiResponse;
