use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::UserLocationRepository;
use crate::models::{Location, UserLocation};
use crate::utils::errors::AppResult;

#[derive(Debug, sqlx::FromRow)]
struct UserLocationRow {
    user_id: Uuid,
    latitude: f64,
    longitude: f64,
}

impl From<UserLocationRow> for UserLocation {
    fn from(row: UserLocationRow) -> Self {
        Self {
            user_id: row.user_id,
            location: Location::new(row.latitude, row.longitude),
        }
    }
}

pub struct PgUserLocationRepository {
    pool: PgPool,
}

impl PgUserLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserLocationRepository for PgUserLocationRepository {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserLocation>> {
        let row = sqlx::query_as::<_, UserLocationRow>(
            "SELECT user_id, latitude, longitude FROM user_locations WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserLocation::from))
    }

    async fn upsert(&self, user_id: Uuid, location: Location) -> AppResult<UserLocation> {
        let row = sqlx::query_as::<_, UserLocationRow>(
            r#"
            INSERT INTO user_locations (user_id, latitude, longitude)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET latitude = EXCLUDED.latitude, longitude = EXCLUDED.longitude
            RETURNING user_id, latitude, longitude
            "#,
        )
        .bind(user_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}
