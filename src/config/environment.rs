//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;

use anyhow::{Context, Result};

use crate::services::geo_matcher::DEFAULT_RADIUS_KM;

/// Backend de persistencia seleccionado con `STORAGE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    /// Vacío = CORS permisivo
    pub cors_origins: Vec<String>,
    pub default_search_radius_km: f64,
    pub storage: StorageBackend,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 8081,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            default_search_radius_km: DEFAULT_RADIUS_KM,
            storage: StorageBackend::Postgres,
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración desde el entorno, con valores por defecto
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(port) => port.parse().context("PORT must be a valid number")?,
            Err(_) => defaults.port,
        };

        let default_search_radius_km = match env::var("DEFAULT_SEARCH_RADIUS_KM") {
            Ok(radius) => {
                let radius: f64 = radius
                    .parse()
                    .context("DEFAULT_SEARCH_RADIUS_KM must be a valid number")?;
                anyhow::ensure!(
                    radius.is_finite() && radius > 0.0,
                    "DEFAULT_SEARCH_RADIUS_KM must be positive"
                );
                radius
            }
            Err(_) => defaults.default_search_radius_km,
        };

        let storage = match env::var("STORAGE").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("postgres") | Err(_) => StorageBackend::Postgres,
            Ok(other) => anyhow::bail!("STORAGE must be 'postgres' or 'memory', got '{}'", other),
        };

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port,
            host: env::var("HOST").unwrap_or(defaults.host),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
            default_search_radius_km,
            storage,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
