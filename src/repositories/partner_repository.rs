use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{partner_in_use, PartnerRepository};
use crate::models::{Location, Pagination, Partner, PartnerProfile};
use crate::services::geo_matcher::BoundingBox;
use crate::utils::errors::{AppError, AppResult};

const PARTNER_COLUMNS: &str =
    "id, user_id, service_type_id, is_available, latitude, longitude, banned, admin_notes";

#[derive(Debug, sqlx::FromRow)]
struct PartnerRow {
    id: Uuid,
    user_id: Uuid,
    service_type_id: i32,
    is_available: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    banned: bool,
    admin_notes: Option<String>,
}

impl From<PartnerRow> for Partner {
    fn from(row: PartnerRow) -> Self {
        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => Some(Location::new(lat, lng)),
            _ => None,
        };

        Self {
            id: row.id,
            user_id: row.user_id,
            service_type_id: row.service_type_id,
            is_available: row.is_available,
            location,
            banned: row.banned,
            admin_notes: row.admin_notes,
        }
    }
}

pub struct PgPartnerRepository {
    pool: PgPool,
}

impl PgPartnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PartnerRepository for PgPartnerRepository {
    async fn get(&self, id: Uuid) -> AppResult<Option<Partner>> {
        let sql = format!("SELECT {} FROM partners WHERE id = $1", PARTNER_COLUMNS);
        let row = sqlx::query_as::<_, PartnerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Partner::from))
    }

    async fn create(&self, partner: &Partner) -> AppResult<Partner> {
        debug!("💾 Insertando partner {}", partner.id);

        let sql = format!(
            r#"
            INSERT INTO partners (id, user_id, service_type_id, is_available, latitude, longitude, banned, admin_notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PARTNER_COLUMNS
        );

        let row = sqlx::query_as::<_, PartnerRow>(&sql)
            .bind(partner.id)
            .bind(partner.user_id)
            .bind(partner.service_type_id)
            .bind(partner.is_available)
            .bind(partner.location.map(|l| l.latitude))
            .bind(partner.location.map(|l| l.longitude))
            .bind(partner.banned)
            .bind(&partner.admin_notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<Partner>> {
        let sql = format!(
            "SELECT {} FROM partners ORDER BY id LIMIT $1 OFFSET $2",
            PARTNER_COLUMNS
        );
        let rows = sqlx::query_as::<_, PartnerRow>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Partner::from).collect())
    }

    async fn set_location(&self, id: Uuid, location: Location) -> AppResult<Option<Partner>> {
        debug!("📍 Partner {} en ({}, {})", id, location.latitude, location.longitude);

        let sql = format!(
            r#"
            UPDATE partners
            SET latitude = $2, longitude = $3, is_available = NOT banned
            WHERE id = $1
            RETURNING {}
            "#,
            PARTNER_COLUMNS
        );

        let row = sqlx::query_as::<_, PartnerRow>(&sql)
            .bind(id)
            .bind(location.latitude)
            .bind(location.longitude)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Partner::from))
    }

    async fn set_availability(&self, id: Uuid, available: bool) -> AppResult<Option<Partner>> {
        let sql = format!(
            r#"
            UPDATE partners
            SET is_available = $2
            WHERE id = $1 AND NOT ($2 AND banned)
            RETURNING {}
            "#,
            PARTNER_COLUMNS
        );

        let row = sqlx::query_as::<_, PartnerRow>(&sql)
            .bind(id)
            .bind(available)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Partner::from))
    }

    async fn set_banned(
        &self,
        id: Uuid,
        banned: bool,
        admin_notes: Option<String>,
    ) -> AppResult<Option<Partner>> {
        debug!("💾 Partner {} banned = {}", id, banned);

        let sql = format!(
            r#"
            UPDATE partners
            SET banned = $2, is_available = NOT $2, admin_notes = $3
            WHERE id = $1
            RETURNING {}
            "#,
            PARTNER_COLUMNS
        );

        let row = sqlx::query_as::<_, PartnerRow>(&sql)
            .bind(id)
            .bind(banned)
            .bind(admin_notes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Partner::from))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        profile: &PartnerProfile,
    ) -> AppResult<Option<Partner>> {
        let sql = format!(
            r#"
            UPDATE partners
            SET service_type_id = COALESCE($2, service_type_id),
                admin_notes = COALESCE($3, admin_notes)
            WHERE id = $1
            RETURNING {}
            "#,
            PARTNER_COLUMNS
        );

        let row = sqlx::query_as::<_, PartnerRow>(&sql)
            .bind(id)
            .bind(profile.service_type_id)
            .bind(&profile.admin_notes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Partner::from))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM partners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => partner_in_use(id),
                other => AppError::Database(other),
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_available_by_service_type(
        &self,
        service_type_id: i32,
        page: Pagination,
    ) -> AppResult<Vec<Partner>> {
        let sql = format!(
            r#"
            SELECT {} FROM partners
            WHERE service_type_id = $1 AND is_available AND NOT banned
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
            PARTNER_COLUMNS
        );

        let rows = sqlx::query_as::<_, PartnerRow>(&sql)
            .bind(service_type_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Partner::from).collect())
    }

    async fn find_available_in_box(&self, bbox: BoundingBox) -> AppResult<Vec<Partner>> {
        let sql = format!(
            r#"
            SELECT {} FROM partners
            WHERE is_available AND NOT banned
              AND latitude IS NOT NULL AND longitude IS NOT NULL
              AND latitude BETWEEN $1 AND $2
              AND (
                ($5 AND (longitude >= $3 OR longitude <= $4))
                OR (NOT $5 AND longitude BETWEEN $3 AND $4)
              )
            ORDER BY id
            "#,
            PARTNER_COLUMNS
        );

        let rows = sqlx::query_as::<_, PartnerRow>(&sql)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lng)
            .bind(bbox.max_lng)
            .bind(bbox.wraps)
            .fetch_all(&self.pool)
            .await?;

        debug!("📍 {} partners disponibles en la caja {:?}", rows.len(), bbox);
        Ok(rows.into_iter().map(Partner::from).collect())
    }
}
