//! TransactionLedger
//!
//! Liquidación de Requests: creación de la transacción (una por Request),
//! cálculo de impuesto y avance del estado de pago.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::models::{Pagination, PaymentStatus, Transaction};
use crate::repositories::{RequestRepository, TransactionRepository};
use crate::utils::errors::{
    invalid_transition_error, not_found_error, validation_error, AppError, AppResult,
};
use crate::utils::validation::validate_positive;

#[derive(Clone)]
pub struct TransactionLedger {
    transactions: Arc<dyn TransactionRepository>,
    requests: Arc<dyn RequestRepository>,
}

impl TransactionLedger {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        requests: Arc<dyn RequestRepository>,
    ) -> Self {
        Self {
            transactions,
            requests,
        }
    }

    /// Crear la transacción de una Request.
    ///
    /// La Request es la autoridad sobre qué partner puede facturarla: debe
    /// existir y tener asignado exactamente `partner_id`. La creación es
    /// idempotente por `request_id`: repetirla con el mismo partner y monto
    /// devuelve la transacción existente; con otro monto falla.
    pub async fn create_for_request(
        &self,
        request_id: Uuid,
        partner_id: Uuid,
        amount: Decimal,
    ) -> AppResult<Transaction> {
        let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        validate_positive(amount).map_err(|e| validation_error("amount", e))?;

        let (request, existing) = futures::try_join!(
            self.requests.get(request_id),
            self.transactions.find_by_request(request_id)
        )?;

        match request {
            Some(request) if request.partner_id == Some(partner_id) => {}
            _ => {
                return Err(AppError::InvalidAssignment(format!(
                    "request '{}' is not assigned to partner '{}'",
                    request_id, partner_id
                )));
            }
        }

        if let Some(existing) = existing {
            if existing.partner_id == partner_id && existing.amount == amount {
                return Ok(existing);
            }
            return Err(AppError::PreconditionFailed(format!(
                "a transaction already exists for request '{}'",
                request_id
            )));
        }

        self.transactions
            .create(&Transaction::new(request_id, partner_id, amount))
            .await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Transaction> {
        self.transactions
            .get(id)
            .await?
            .ok_or_else(|| not_found_error("Transaction", &id.to_string()))
    }

    /// Avance verificado: `UNPAID → PAID` y `PAID → REFUNDED`
    pub async fn set_payment_status(
        &self,
        id: Uuid,
        next: PaymentStatus,
    ) -> AppResult<Transaction> {
        let transaction = self.get(id).await?;

        if !transaction.payment_status.can_transition_to(next) {
            return Err(invalid_transition_error(
                "Transaction",
                transaction.payment_status.as_str(),
                next.as_str(),
            ));
        }

        match self
            .transactions
            .transition_payment(id, transaction.payment_status, next)
            .await?
        {
            Some(updated) => Ok(updated),
            None => {
                let current = self.get(id).await?;
                Err(invalid_transition_error(
                    "Transaction",
                    current.payment_status.as_str(),
                    next.as_str(),
                ))
            }
        }
    }

    /// Reembolso: sólo desde `PAID`
    pub async fn refund(&self, id: Uuid) -> AppResult<Transaction> {
        self.get(id).await?;

        self.transactions
            .transition_payment(id, PaymentStatus::Paid, PaymentStatus::Refunded)
            .await?
            .ok_or_else(|| {
                AppError::PreconditionFailed(format!(
                    "only paid transactions can be refunded (transaction '{}')",
                    id
                ))
            })
    }

    /// Reaplicar la fórmula de impuesto sobre el monto base almacenado
    pub async fn recompute_tax(&self, id: Uuid) -> AppResult<Transaction> {
        let mut transaction = self.get(id).await?;
        transaction.recompute_tax();

        self.transactions
            .set_tax(id, transaction.tax_amount, transaction.total_amount)
            .await?
            .ok_or_else(|| not_found_error("Transaction", &id.to_string()))
    }

    pub async fn list(&self, page: Pagination) -> AppResult<Vec<Transaction>> {
        self.transactions.list(page).await
    }

    pub async fn by_request(&self, request_id: Uuid) -> AppResult<Transaction> {
        self.transactions
            .find_by_request(request_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Transaction for request '{}' not found", request_id))
            })
    }

    pub async fn by_partner(
        &self,
        partner_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<Transaction>> {
        self.transactions.find_by_partner(partner_id, page).await
    }

    pub async fn by_user(&self, user_id: Uuid, page: Pagination) -> AppResult<Vec<Transaction>> {
        self.transactions.find_by_user(user_id, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, NewRequest, Partner, RequestStatus};
    use crate::repositories::{MemoryStore, PartnerRepository};
    use crate::services::request_lifecycle::RequestLifecycle;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    struct Fixture {
        lifecycle: RequestLifecycle,
        ledger: TransactionLedger,
        partner_id: Uuid,
        request_id: Uuid,
    }

    /// Request aceptada por un partner, lista para facturar
    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let lifecycle = RequestLifecycle::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let ledger = TransactionLedger::new(Arc::new(store.clone()), Arc::new(store.clone()));

        let partner = Partner::new(Uuid::new_v4(), 1);
        PartnerRepository::create(&store, &partner).await.unwrap();

        let request = lifecycle
            .create(NewRequest {
                user_id: Uuid::new_v4(),
                service_type_id: 1,
                location: Location::new(36.75, 3.06),
                description: None,
            })
            .await
            .unwrap();
        lifecycle
            .update_status(request.id, RequestStatus::Accepted, Some(partner.id))
            .await
            .unwrap();

        Fixture {
            lifecycle,
            ledger,
            partner_id: partner.id,
            request_id: request.id,
        }
    }

    #[tokio::test]
    async fn test_create_derives_tax_and_total() {
        let f = fixture().await;
        let tx = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("100.00"))
            .await
            .unwrap();

        assert_eq!(tx.tax_amount, dec("15.00"));
        assert_eq!(tx.total_amount, dec("115.00"));
        assert_eq!(tx.payment_status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_create_rejects_partner_mismatch_and_unknown_request() {
        let f = fixture().await;

        let err = f
            .ledger
            .create_for_request(f.request_id, Uuid::new_v4(), dec("10"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAssignment(_)));

        let err = f
            .ledger
            .create_for_request(Uuid::new_v4(), f.partner_id, dec("10"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAssignment(_)));
    }

    #[tokio::test]
    async fn test_create_is_idempotent_per_request() {
        let f = fixture().await;
        let first = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("80"))
            .await
            .unwrap();
        let again = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("80.00"))
            .await
            .unwrap();
        assert_eq!(first.id, again.id);

        let err = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("95"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let f = fixture().await;
        let err = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("0.004"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_payment_status_follows_table() {
        let f = fixture().await;
        let tx = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("50"))
            .await
            .unwrap();

        let err = f
            .ledger
            .set_payment_status(tx.id, PaymentStatus::Refunded)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        let paid = f.ledger.set_payment_status(tx.id, PaymentStatus::Paid).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);

        let err = f
            .ledger
            .set_payment_status(tx.id, PaymentStatus::Unpaid)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_refund_only_from_paid() {
        let f = fixture().await;
        let tx = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("50"))
            .await
            .unwrap();

        let err = f.ledger.refund(tx.id).await.unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
        assert_eq!(f.ledger.get(tx.id).await.unwrap().payment_status, PaymentStatus::Unpaid);

        f.ledger.set_payment_status(tx.id, PaymentStatus::Paid).await.unwrap();
        let refunded = f.ledger.refund(tx.id).await.unwrap();
        assert_eq!(refunded.payment_status, PaymentStatus::Refunded);

        let err = f.ledger.refund(tx.id).await.unwrap_err();
        assert!(matches!(err, AppError::PreconditionFailed(_)));
        assert_eq!(f.ledger.get(tx.id).await.unwrap().payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_recompute_tax_twice_is_identical() {
        let f = fixture().await;
        let tx = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("33.33"))
            .await
            .unwrap();

        let once = f.ledger.recompute_tax(tx.id).await.unwrap();
        let twice = f.ledger.recompute_tax(tx.id).await.unwrap();
        assert_eq!((once.tax_amount, once.total_amount), (twice.tax_amount, twice.total_amount));
        assert_eq!(twice.tax_amount, dec("5.00"));
        assert_eq!(twice.total_amount, dec("38.33"));
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_not_found() {
        let f = fixture().await;
        let id = Uuid::new_v4();
        assert!(matches!(f.ledger.refund(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(f.ledger.recompute_tax(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            f.ledger.by_request(f.request_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_full_fulfillment_scenario() {
        let f = fixture().await;
        let completed = f.lifecycle.complete(f.request_id).await.unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);

        let tx = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("100.00"))
            .await
            .unwrap();
        let paid = f.ledger.set_payment_status(tx.id, PaymentStatus::Paid).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        let refunded = f.ledger.refund(tx.id).await.unwrap();
        assert_eq!(refunded.payment_status, PaymentStatus::Refunded);

        let page = Pagination::default();
        assert_eq!(f.ledger.by_partner(f.partner_id, page).await.unwrap().len(), 1);
        assert_eq!(f.ledger.by_request(f.request_id).await.unwrap().id, tx.id);
        let user_id = completed.user_id;
        assert_eq!(f.ledger.by_user(user_id, page).await.unwrap()[0].id, tx.id);
    }

    #[tokio::test]
    async fn test_concurrent_refunds_apply_once() {
        let store = MemoryStore::new().with_read_delay(std::time::Duration::from_millis(5));
        let ledger = TransactionLedger::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let tx = Transaction::new(Uuid::new_v4(), Uuid::new_v4(), dec("40.00"));
        TransactionRepository::create(&store, &tx).await.unwrap();
        ledger.set_payment_status(tx.id, PaymentStatus::Paid).await.unwrap();

        let (first, second) = tokio::join!(ledger.refund(tx.id), ledger.refund(tx.id));

        assert!(first.is_ok() != second.is_ok());
        let lost = first.err().or(second.err()).unwrap();
        assert!(matches!(lost, AppError::PreconditionFailed(_)));
        assert_eq!(ledger.get(tx.id).await.unwrap().payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_list_is_paginated_newest_first() {
        let f = fixture().await;
        let tx = f
            .ledger
            .create_for_request(f.request_id, f.partner_id, dec("20"))
            .await
            .unwrap();

        assert_eq!(f.ledger.list(Pagination::default()).await.unwrap(), vec![tx]);
        assert!(f.ledger.list(Pagination::new(10, 1)).await.unwrap().is_empty());
    }
}
