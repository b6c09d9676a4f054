//! Modelo de Transaction
//!
//! Liquidación de una Request completada: monto base, impuesto (15%) y total.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Tasa de impuesto fija: 15%
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Estado de pago - mapea al ENUM payment_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

const PAYMENT_TRANSITIONS: &[(PaymentStatus, PaymentStatus)] = &[
    (PaymentStatus::Unpaid, PaymentStatus::Paid),
    (PaymentStatus::Paid, PaymentStatus::Refunded),
];

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        PAYMENT_TRANSITIONS.contains(&(self, next))
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impuesto sobre el monto base, redondeado a 2 decimales (mitad hacia arriba)
pub fn calculate_tax(amount: Decimal) -> Decimal {
    (amount * TAX_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Devuelve `(tax_amount, total_amount)` para un monto base
pub fn settle(amount: Decimal) -> (Decimal, Decimal) {
    let tax_amount = calculate_tax(amount);
    (tax_amount, amount + tax_amount)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub request_id: Uuid,
    pub partner_id: Uuid,
    pub amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(request_id: Uuid, partner_id: Uuid, amount: Decimal) -> Self {
        let (tax_amount, total_amount) = settle(amount);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            request_id,
            partner_id,
            amount,
            tax_amount,
            total_amount,
            payment_status: PaymentStatus::Unpaid,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reaplicar la fórmula de impuesto sobre el monto almacenado
    pub fn recompute_tax(&mut self) {
        let (tax_amount, total_amount) = settle(self.amount);
        self.tax_amount = tax_amount;
        self.total_amount = total_amount;
    }
}
