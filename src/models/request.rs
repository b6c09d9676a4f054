//! Modelo de Request
//!
//! Solicitud de ayuda creada por un usuario. El estado sigue la máquina
//! `PENDING → ACCEPTED → COMPLETED`, con `CANCELLED` como salida desde
//! `PENDING` o `ACCEPTED`. `COMPLETED` y `CANCELLED` son terminales.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use super::location::Location;

/// Estado de la solicitud - mapea al ENUM request_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "request_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Cancelled,
    Completed,
}

/// Aristas legales de la máquina de estados
const REQUEST_TRANSITIONS: &[(RequestStatus, RequestStatus)] = &[
    (RequestStatus::Pending, RequestStatus::Accepted),
    (RequestStatus::Pending, RequestStatus::Cancelled),
    (RequestStatus::Accepted, RequestStatus::Completed),
    (RequestStatus::Accepted, RequestStatus::Cancelled),
];

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Cancelled => "CANCELLED",
            RequestStatus::Completed => "COMPLETED",
        }
    }

    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        REQUEST_TRANSITIONS.contains(&(self, next))
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Cancelled | RequestStatus::Completed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operaciones administrativas que fuerzan el estado sin consultar la tabla
/// de transiciones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOverride {
    Cancel,
    Complete,
}

impl AdminOverride {
    pub fn target(self) -> RequestStatus {
        match self {
            AdminOverride::Cancel => RequestStatus::Cancelled,
            AdminOverride::Complete => RequestStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub id: Uuid,
    pub user_id: Uuid,
    pub partner_id: Option<Uuid>,
    pub service_type_id: i32,
    pub location: Location,
    pub status: RequestStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos para crear una Request nueva
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub user_id: Uuid,
    pub service_type_id: i32,
    pub location: Location,
    pub description: Option<String>,
}

impl Request {
    pub fn new(new: NewRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            partner_id: None,
            service_type_id: new.service_type_id,
            location: new.location,
            status: RequestStatus::Pending,
            description: new.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request acompañada de su distancia al origen de búsqueda
#[derive(Debug, Clone, Serialize)]
pub struct NearbyRequest {
    #[serde(flatten)]
    pub request: Request,
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestStatus::*;

    #[test]
    fn test_transition_table() {
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Accepted.can_transition_to(Completed));
        assert!(Accepted.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Accepted.can_transition_to(Accepted));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Accepted));
    }

    #[test]
    fn test_terminal_states_have_no_outgoing_edges() {
        for from in [Cancelled, Completed] {
            assert!(from.is_terminal());
            for to in [Pending, Accepted, Cancelled, Completed] {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&Accepted).unwrap();
        assert_eq!(json, "\"ACCEPTED\"");
        assert_eq!(AdminOverride::Complete.target(), Completed);
    }
}
