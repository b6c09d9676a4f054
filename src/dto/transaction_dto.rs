use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::PaymentStatus;
use crate::utils::validation::validate_positive_amount;

// Request para crear la transacción de una solicitud
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub request_id: Uuid,
    pub partner_id: Uuid,

    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,
}

// Request para cambiar el estado de pago
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}
