//! # Checkout History Repository
//!
//! Closed stays are archived as one JSON row each. Archiving removes the
//! stay and its service requests from the live tables in the same
//! transaction, so a stay is always either live or archived, never both.
//!
//! Archiving is idempotent: a second archive of the same stay id is ignored.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use hotelier_core::CheckoutRecord;

#[derive(Debug, sqlx::FromRow)]
struct CheckoutRow {
    payload: String,
}

impl TryFrom<CheckoutRow> for CheckoutRecord {
    type Error = serde_json::Error;

    fn try_from(row: CheckoutRow) -> Result<Self, Self::Error> {
        serde_json::from_str(&row.payload)
    }
}

/// Repository for the checkout archive.
#[derive(Debug, Clone)]
pub struct CheckoutHistoryRepository {
    pool: SqlitePool,
}

impl CheckoutHistoryRepository {
    /// Creates a new CheckoutHistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutHistoryRepository { pool }
    }

    /// Archives a closed stay and deletes its live rows.
    ///
    /// Returns `false` when the stay was already archived (nothing changes).
    pub async fn archive(&self, hotel_id: &str, record: &CheckoutRecord) -> DbResult<bool> {
        let payload = serde_json::to_string(record)?;
        let stay_id = &record.stay.id;

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO checkout_history (
                stay_id, hotel_id, room_id, room_number, final_status, payload, archived_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(stay_id)
        .bind(hotel_id)
        .bind(&record.room_id)
        .bind(&record.room_number)
        .bind(record.final_status)
        .bind(&payload)
        .bind(record.archived_at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if !inserted {
            debug!(stay_id = %stay_id, "Stay already archived");
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM service_requests WHERE stay_id = ?1")
            .bind(stay_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM stays WHERE id = ?1")
            .bind(stay_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            stay_id = %stay_id,
            room = %record.room_number,
            status = %record.final_status,
            services = record.service_requests.len(),
            "Stay archived"
        );
        Ok(true)
    }

    /// Drains records collected by `RoomBook` closures into the archive.
    ///
    /// Each record commits on its own. Returns how many were newly archived.
    pub async fn archive_all(
        &self,
        hotel_id: &str,
        records: impl IntoIterator<Item = CheckoutRecord>,
    ) -> DbResult<usize> {
        let mut archived = 0;
        for record in records {
            if self.archive(hotel_id, &record).await? {
                archived += 1;
            }
        }
        Ok(archived)
    }

    /// Archive for a hotel, most recent first. `since` limits to records
    /// archived at or after the given instant.
    pub async fn list(
        &self,
        hotel_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<CheckoutRecord>> {
        let rows: Vec<CheckoutRow> = match since {
            Some(since) => {
                sqlx::query_as(
                    "SELECT payload FROM checkout_history WHERE hotel_id = ?1 AND archived_at >= ?2 ORDER BY archived_at DESC",
                )
                .bind(hotel_id)
                .bind(since)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT payload FROM checkout_history WHERE hotel_id = ?1 ORDER BY archived_at DESC",
                )
                .bind(hotel_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter()
            .map(|row| CheckoutRecord::try_from(row).map_err(Into::into))
            .collect()
    }

    pub async fn get(&self, stay_id: &str) -> DbResult<Option<CheckoutRecord>> {
        let row: Option<CheckoutRow> =
            sqlx::query_as("SELECT payload FROM checkout_history WHERE stay_id = ?1")
                .bind(stay_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| CheckoutRecord::try_from(r).map_err(Into::into))
            .transpose()
    }

    pub async fn count(&self, hotel_id: &str) -> DbResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM checkout_history WHERE hotel_id = ?1")
                .bind(hotel_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone};
    use hotelier_core::{GuestInfo, Room, ServiceRequest, ServiceStatus, Stay, StayStatus};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 3, hour, 0, 0).unwrap()
    }

    fn stay() -> Stay {
        Stay {
            id: "s-1".to_string(),
            room_id: "r-101".to_string(),
            guest: GuestInfo::named("Asha Rao"),
            check_in: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 10, 3).unwrap(),
            room_charge_cents: 10_000,
            paid_amount_cents: 20_000,
            is_group_booking: false,
            group_master_stay_id: None,
            status: StayStatus::CheckedIn,
            created_at: at(8),
        }
    }

    fn request() -> ServiceRequest {
        ServiceRequest {
            id: "q-1".to_string(),
            hotel_id: "h".to_string(),
            stay_id: "s-1".to_string(),
            room_number: "101".to_string(),
            service_name: "Laundry".to_string(),
            price_cents: Some(2_000),
            status: ServiceStatus::Completed,
            assigned_to: None,
            created_at: at(9),
            completed_at: Some(at(10)),
        }
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut room = Room::new("r-101", "h", "101", "Deluxe");
        room.stays.push(stay());
        db.rooms().insert(&room).await.unwrap();
        db.services().upsert(&request()).await.unwrap();
        db
    }

    fn record() -> CheckoutRecord {
        let mut closed = stay();
        closed.status = StayStatus::CheckedOut;
        CheckoutRecord {
            stay: closed,
            room_id: "r-101".to_string(),
            room_number: "101".to_string(),
            final_status: StayStatus::CheckedOut,
            service_requests: vec![request()],
            archived_at: at(11),
        }
    }

    #[tokio::test]
    async fn test_archive_moves_stay_out_of_live_tables() {
        let db = seeded().await;

        assert!(db.checkouts().archive("h", &record()).await.unwrap());

        let room = db.rooms().get("r-101").await.unwrap().unwrap();
        assert!(room.stays.is_empty());
        assert!(db.services().for_stay("s-1").await.unwrap().is_empty());

        let archived = db.checkouts().get("s-1").await.unwrap().unwrap();
        assert_eq!(archived, record());
    }

    #[tokio::test]
    async fn test_archive_twice_is_ignored() {
        let db = seeded().await;
        assert!(db.checkouts().archive("h", &record()).await.unwrap());
        assert!(!db.checkouts().archive("h", &record()).await.unwrap());
        assert_eq!(db.checkouts().count("h").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_archive_all_drains_room_book_closures() {
        use hotelier_core::{FixedClock, RoomBook, ServiceLedger};
        use std::sync::Arc;

        let db = seeded().await;
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 3).unwrap()));
        let mut book = RoomBook::from_rooms("h", db.rooms().list("h").await.unwrap(), clock.clone());
        let mut services = ServiceLedger::new("h", clock);
        let mut pending: Vec<CheckoutRecord> = Vec::new();

        book.check_out_stay("s-1", &mut services, &mut pending).unwrap();
        assert_eq!(pending.len(), 1);

        assert_eq!(db.checkouts().archive_all("h", pending.drain(..)).await.unwrap(), 1);
        assert!(db.rooms().get("r-101").await.unwrap().unwrap().stays.is_empty());
        assert_eq!(db.checkouts().get("s-1").await.unwrap().unwrap().final_status, StayStatus::CheckedOut);

        // re-draining an already archived record changes nothing
        assert_eq!(db.checkouts().archive_all("h", vec![record()]).await.unwrap(), 0);
        assert_eq!(db.checkouts().count("h").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_since() {
        let db = seeded().await;
        db.checkouts().archive("h", &record()).await.unwrap();

        assert_eq!(db.checkouts().list("h", None).await.unwrap().len(), 1);
        assert_eq!(db.checkouts().list("h", Some(at(11))).await.unwrap().len(), 1);
        assert!(db.checkouts().list("h", Some(at(12))).await.unwrap().is_empty());
    }
}
