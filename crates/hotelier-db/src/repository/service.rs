//! # Service Request Repository
//!
//! Persistence for guest service requests. Requests reference their stay by
//! id only; they are deleted together with the stay when it is archived (see
//! [`CheckoutHistoryRepository`](super::checkout::CheckoutHistoryRepository)).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use hotelier_core::{ServiceRequest, ServiceStatus};

#[derive(Debug, sqlx::FromRow)]
struct ServiceRequestRecord {
    id: String,
    hotel_id: String,
    stay_id: String,
    room_number: String,
    service_name: String,
    price_cents: Option<i64>,
    status: ServiceStatus,
    assigned_to: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<ServiceRequestRecord> for ServiceRequest {
    fn from(r: ServiceRequestRecord) -> Self {
        ServiceRequest {
            id: r.id,
            hotel_id: r.hotel_id,
            stay_id: r.stay_id,
            room_number: r.room_number,
            service_name: r.service_name,
            price_cents: r.price_cents,
            status: r.status,
            assigned_to: r.assigned_to,
            created_at: r.created_at,
            completed_at: r.completed_at,
        }
    }
}

const COLUMNS: &str = r#"
    id, hotel_id, stay_id, room_number, service_name, price_cents,
    status, assigned_to, created_at, completed_at
"#;

/// Repository for service request operations.
#[derive(Debug, Clone)]
pub struct ServiceRequestRepository {
    pool: SqlitePool,
}

impl ServiceRequestRepository {
    /// Creates a new ServiceRequestRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRequestRepository { pool }
    }

    /// Inserts or replaces a request.
    pub async fn upsert(&self, request: &ServiceRequest) -> DbResult<()> {
        debug!(id = %request.id, stay_id = %request.stay_id, "Saving service request");

        sqlx::query(
            r#"
            INSERT INTO service_requests (
                id, hotel_id, stay_id, room_number, service_name, price_cents,
                status, assigned_to, created_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (id) DO UPDATE SET
                service_name = excluded.service_name,
                price_cents = excluded.price_cents,
                status = excluded.status,
                assigned_to = excluded.assigned_to,
                completed_at = excluded.completed_at
            "#,
        )
        .bind(&request.id)
        .bind(&request.hotel_id)
        .bind(&request.stay_id)
        .bind(&request.room_number)
        .bind(&request.service_name)
        .bind(request.price_cents)
        .bind(request.status)
        .bind(&request.assigned_to)
        .bind(request.created_at)
        .bind(request.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes a status change (and completion time) decided by the ledger.
    pub async fn update_status(
        &self,
        id: &str,
        status: ServiceStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> DbResult<()> {
        debug!(id = %id, status = %status, "Updating service request status");

        let result = sqlx::query(
            "UPDATE service_requests SET status = ?2, completed_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(completed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service request", id));
        }

        Ok(())
    }

    /// Every open request of a hotel, oldest first.
    pub async fn list(&self, hotel_id: &str) -> DbResult<Vec<ServiceRequest>> {
        let records: Vec<ServiceRequestRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM service_requests WHERE hotel_id = ?1 ORDER BY created_at",
            COLUMNS
        ))
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(ServiceRequest::from).collect())
    }

    /// Pending queue, oldest first.
    pub async fn pending(&self, hotel_id: &str) -> DbResult<Vec<ServiceRequest>> {
        let records: Vec<ServiceRequestRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM service_requests WHERE hotel_id = ?1 AND status = 'pending' ORDER BY created_at",
            COLUMNS
        ))
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(ServiceRequest::from).collect())
    }

    /// Requests charged to one stay.
    pub async fn for_stay(&self, stay_id: &str) -> DbResult<Vec<ServiceRequest>> {
        let records: Vec<ServiceRequestRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM service_requests WHERE stay_id = ?1 ORDER BY created_at",
            COLUMNS
        ))
        .bind(stay_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(ServiceRequest::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone};

    fn request(id: &str, stay_id: &str, minutes: i64) -> ServiceRequest {
        ServiceRequest {
            id: id.to_string(),
            hotel_id: "h".to_string(),
            stay_id: stay_id.to_string(),
            room_number: "101".to_string(),
            service_name: "Room service".to_string(),
            price_cents: Some(1_500),
            status: ServiceStatus::Pending,
            assigned_to: Some("Kitchen".to_string()),
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()
                + Duration::minutes(minutes),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_pending_is_oldest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.services();
        repo.upsert(&request("late", "s-1", 30)).await.unwrap();
        repo.upsert(&request("early", "s-1", 0)).await.unwrap();
        repo.upsert(&request("done", "s-2", 10)).await.unwrap();

        let completed_at = Utc.with_ymd_and_hms(2026, 10, 1, 10, 0, 0).unwrap();
        repo.update_status("done", ServiceStatus::Completed, Some(completed_at))
            .await
            .unwrap();

        let pending: Vec<String> = repo
            .pending("h")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(pending, vec!["early", "late"]);

        let done = repo.for_stay("s-2").await.unwrap();
        assert_eq!(done[0].status, ServiceStatus::Completed);
        assert_eq!(done[0].completed_at, Some(completed_at));
        assert_eq!(repo.list("h").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_missing_request() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .services()
            .update_status("ghost", ServiceStatus::InProgress, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
