use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::RequestRepository;
use crate::models::{Location, Pagination, Request, RequestStatus};
use crate::services::geo_matcher::BoundingBox;
use crate::utils::errors::AppResult;

const REQUEST_COLUMNS: &str =
    "id, user_id, partner_id, service_type_id, latitude, longitude, status, description, created_at, updated_at";

// Fila plana de la tabla requests
#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    user_id: Uuid,
    partner_id: Option<Uuid>,
    service_type_id: i32,
    latitude: f64,
    longitude: f64,
    status: RequestStatus,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RequestRow> for Request {
    fn from(row: RequestRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            partner_id: row.partner_id,
            service_type_id: row.service_type_id,
            location: Location::new(row.latitude, row.longitude),
            status: row.status,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(
        &self,
        filter: &str,
        bind: RequestFilter,
        page: Pagination,
    ) -> AppResult<Vec<Request>> {
        let sql = format!(
            "SELECT {} FROM requests WHERE {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            REQUEST_COLUMNS, filter
        );

        let query = sqlx::query_as::<_, RequestRow>(&sql);
        let query = match bind {
            RequestFilter::Uuid(id) => query.bind(id),
            RequestFilter::Int(value) => query.bind(value),
        };

        let rows = query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Request::from).collect())
    }
}

enum RequestFilter {
    Uuid(Uuid),
    Int(i32),
}

#[async_trait]
impl RequestRepository for PgRequestRepository {
    async fn get(&self, id: Uuid) -> AppResult<Option<Request>> {
        let sql = format!("SELECT {} FROM requests WHERE id = $1", REQUEST_COLUMNS);
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Request::from))
    }

    async fn create(&self, request: &Request) -> AppResult<Request> {
        debug!("💾 Insertando request {}", request.id);

        let sql = format!(
            r#"
            INSERT INTO requests (id, user_id, partner_id, service_type_id, latitude, longitude, status, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );

        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(request.id)
            .bind(request.user_id)
            .bind(request.partner_id)
            .bind(request.service_type_id)
            .bind(request.location.latitude)
            .bind(request.location.longitude)
            .bind(request.status)
            .bind(&request.description)
            .bind(request.created_at)
            .bind(request.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        partner_id: Option<Uuid>,
    ) -> AppResult<Option<Request>> {
        debug!("💾 Request {}: {} -> {}", id, from, to);

        // el WHERE re-evalúa el estado previo sobre la fila bloqueada
        let sql = format!(
            r#"
            UPDATE requests
            SET status = $3, partner_id = COALESCE($4, partner_id), updated_at = NOW()
            WHERE id = $1 AND status = $2 AND ($4::uuid IS NULL OR partner_id IS NULL)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );

        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(partner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Request::from))
    }

    async fn force_status(&self, id: Uuid, to: RequestStatus) -> AppResult<Option<Request>> {
        debug!("💾 Request {}: forzando {}", id, to);

        let sql = format!(
            "UPDATE requests SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            REQUEST_COLUMNS
        );

        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Request::from))
    }

    async fn list(&self, page: Pagination) -> AppResult<Vec<Request>> {
        let sql = format!(
            "SELECT {} FROM requests ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Request::from).collect())
    }

    async fn find_by_user(&self, user_id: Uuid, page: Pagination) -> AppResult<Vec<Request>> {
        self.fetch_where("user_id = $1", RequestFilter::Uuid(user_id), page)
            .await
    }

    async fn find_by_partner(&self, partner_id: Uuid, page: Pagination) -> AppResult<Vec<Request>> {
        self.fetch_where("partner_id = $1", RequestFilter::Uuid(partner_id), page)
            .await
    }

    async fn find_by_service_type(
        &self,
        service_type_id: i32,
        page: Pagination,
    ) -> AppResult<Vec<Request>> {
        self.fetch_where(
            "service_type_id = $1",
            RequestFilter::Int(service_type_id),
            page,
        )
        .await
    }

    async fn find_pending_in_box(&self, bbox: BoundingBox) -> AppResult<Vec<Request>> {
        let sql = format!(
            r#"
            SELECT {} FROM requests
            WHERE status = 'PENDING'
              AND latitude BETWEEN $1 AND $2
              AND (
                ($5 AND (longitude >= $3 OR longitude <= $4))
                OR (NOT $5 AND longitude BETWEEN $3 AND $4)
              )
            ORDER BY created_at ASC
            "#,
            REQUEST_COLUMNS
        );

        let rows = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(bbox.min_lat)
            .bind(bbox.max_lat)
            .bind(bbox.min_lng)
            .bind(bbox.max_lng)
            .bind(bbox.wraps)
            .fetch_all(&self.pool)
            .await?;

        debug!("📍 {} requests pendientes en la caja {:?}", rows.len(), bbox);
        Ok(rows.into_iter().map(Request::from).collect())
    }
}
