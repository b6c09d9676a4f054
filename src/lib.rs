//! Backend de despacho de asistencia en ruta
//!
//! Matching geográfico de partners, ciclo de vida de las solicitudes,
//! liquidación de transacciones y registro de garantías de vehículos.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
