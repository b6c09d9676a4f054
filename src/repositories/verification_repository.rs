use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::VerificationRepository;
use crate::models::{CarVerification, Guarantee, Pagination, VerificationStatus};
use crate::utils::errors::{not_found_error, AppError, AppResult};

const VERIFICATION_COLUMNS: &str =
    "id, user_id, vin_number, car_model, year, mileage, status, verified_by_id, guarantee_id, created_at, updated_at";

pub struct PgVerificationRepository {
    pool: PgPool,
}

impl PgVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for PgVerificationRepository {
    async fn get(&self, id: Uuid) -> AppResult<Option<CarVerification>> {
        let sql = format!(
            "SELECT {} FROM car_verifications WHERE id = $1",
            VERIFICATION_COLUMNS
        );
        let verification = sqlx::query_as::<_, CarVerification>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(verification)
    }

    async fn create(&self, verification: &CarVerification) -> AppResult<CarVerification> {
        debug!("💾 Insertando verificación {}", verification.id);

        let sql = format!(
            r#"
            INSERT INTO car_verifications (id, user_id, vin_number, car_model, year, mileage, status, verified_by_id, guarantee_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            VERIFICATION_COLUMNS
        );

        let created = sqlx::query_as::<_, CarVerification>(&sql)
            .bind(verification.id)
            .bind(verification.user_id)
            .bind(&verification.vin_number)
            .bind(&verification.car_model)
            .bind(verification.year)
            .bind(verification.mileage)
            .bind(verification.status)
            .bind(verification.verified_by_id)
            .bind(verification.guarantee_id)
            .bind(verification.created_at)
            .bind(verification.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn record_outcome(
        &self,
        id: Uuid,
        status: VerificationStatus,
        admin_id: Uuid,
    ) -> AppResult<Option<CarVerification>> {
        debug!("💾 Verificación {} -> {} por {}", id, status, admin_id);

        // guarantee_id no se toca: lo escribe sólo issue_guarantee
        let sql = format!(
            r#"
            UPDATE car_verifications
            SET status = $2, verified_by_id = $3, updated_at = NOW()
            WHERE id = $1 AND ($2 <> 'REJECTED'::verification_status OR guarantee_id IS NULL)
            RETURNING {}
            "#,
            VERIFICATION_COLUMNS
        );

        let updated = sqlx::query_as::<_, CarVerification>(&sql)
            .bind(id)
            .bind(status)
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<CarVerification>> {
        let sql = format!(
            "SELECT {} FROM car_verifications ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            VERIFICATION_COLUMNS
        );
        let verifications = sqlx::query_as::<_, CarVerification>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(verifications)
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        page: Pagination,
    ) -> AppResult<Vec<CarVerification>> {
        let sql = format!(
            "SELECT {} FROM car_verifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            VERIFICATION_COLUMNS
        );
        let verifications = sqlx::query_as::<_, CarVerification>(&sql)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(verifications)
    }

    async fn find_guarantee(&self, verification_id: Uuid) -> AppResult<Option<Guarantee>> {
        let guarantee = sqlx::query_as::<_, Guarantee>(
            "SELECT id, verification_id, valid_until, terms, created_at FROM guarantees WHERE verification_id = $1",
        )
        .bind(verification_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(guarantee)
    }

    async fn issue_guarantee(
        &self,
        guarantee: &Guarantee,
    ) -> AppResult<(Guarantee, CarVerification)> {
        let verification_id = guarantee.verification_id;
        debug!("💾 Emitiendo garantía {} para verificación {}", guarantee.id, verification_id);

        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Guarantee>(
            r#"
            INSERT INTO guarantees (id, verification_id, valid_until, terms, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, verification_id, valid_until, terms, created_at
            "#,
        )
        .bind(guarantee.id)
        .bind(verification_id)
        .bind(guarantee.valid_until)
        .bind(&guarantee.terms)
        .bind(guarantee.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::AlreadyIssued(
                format!("a guarantee was already issued for verification '{}'", verification_id),
            ),
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                not_found_error("CarVerification", &verification_id.to_string())
            }
            other => AppError::Database(other),
        })?;

        let sql = format!(
            r#"
            UPDATE car_verifications
            SET guarantee_id = $2, status = $3, updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            VERIFICATION_COLUMNS
        );

        let verification = sqlx::query_as::<_, CarVerification>(&sql)
            .bind(verification_id)
            .bind(created.id)
            .bind(VerificationStatus::Verified)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((created, verification))
    }
}
