use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::TransactionRepository;
use crate::models::{Pagination, PaymentStatus, Transaction};
use crate::utils::errors::{AppError, AppResult};

const TRANSACTION_COLUMNS: &str =
    "t.id, t.request_id, t.partner_id, t.amount, t.tax_amount, t.total_amount, t.payment_status, t.created_at, t.updated_at";

// Transaction se mapea 1:1 con la tabla
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    request_id: Uuid,
    partner_id: Uuid,
    amount: rust_decimal::Decimal,
    tax_amount: rust_decimal::Decimal,
    total_amount: rust_decimal::Decimal,
    payment_status: crate::models::PaymentStatus,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: row.id,
            request_id: row.request_id,
            partner_id: row.partner_id,
            amount: row.amount,
            tax_amount: row.tax_amount,
            total_amount: row.total_amount,
            payment_status: row.payment_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn get(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions t WHERE t.id = $1", TRANSACTION_COLUMNS);
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Transaction::from))
    }

    async fn create(&self, transaction: &Transaction) -> AppResult<Transaction> {
        debug!(
            "💾 Insertando transacción {} para request {}",
            transaction.id, transaction.request_id
        );

        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions AS t (id, request_id, partner_id, amount, tax_amount, total_amount, payment_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING t.id, t.request_id, t.partner_id, t.amount, t.tax_amount, t.total_amount, t.payment_status, t.created_at, t.updated_at
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.request_id)
        .bind(transaction.partner_id)
        .bind(transaction.amount)
        .bind(transaction.tax_amount)
        .bind(transaction.total_amount)
        .bind(transaction.payment_status)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::PreconditionFailed(
                format!("a transaction already exists for request '{}'", transaction.request_id),
            ),
            other => AppError::Database(other),
        })?;

        Ok(row.into())
    }

    async fn transition_payment(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> AppResult<Option<Transaction>> {
        debug!("💾 Transacción {}: {} -> {}", id, from, to);

        let sql = format!(
            r#"
            UPDATE transactions AS t
            SET payment_status = $3, updated_at = NOW()
            WHERE t.id = $1 AND t.payment_status = $2
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Transaction::from))
    }

    async fn set_tax(
        &self,
        id: Uuid,
        tax_amount: Decimal,
        total_amount: Decimal,
    ) -> AppResult<Option<Transaction>> {
        let sql = format!(
            r#"
            UPDATE transactions AS t
            SET tax_amount = $2, total_amount = $3, updated_at = NOW()
            WHERE t.id = $1
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .bind(tax_amount)
            .bind(total_amount)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Transaction::from))
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions t ORDER BY t.created_at DESC LIMIT $1 OFFSET $2",
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn find_by_request(&self, request_id: Uuid) -> AppResult<Option<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.request_id = $1",
            TRANSACTION_COLUMNS
        );
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Transaction::from))
    }

    async fn find_by_partner(
        &self,
        partner_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions t WHERE t.partner_id = $1 ORDER BY t.created_at DESC LIMIT $2 OFFSET $3",
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(partner_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn find_by_user(&self, user_id: Uuid, page: Pagination) -> AppResult<Vec<Transaction>> {
        let sql = format!(
            r#"
            SELECT {} FROM transactions t
            JOIN requests r ON r.id = t.request_id
            WHERE r.user_id = $1
            ORDER BY t.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }
}
