//! # Room Repository
//!
//! Rooms together with the stays and out-of-order blocks they own.
//!
//! ## Loading a Room Snapshot
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list(hotel_id)                                                         │
//! │    ├── SELECT rooms               ORDER BY number                       │
//! │    ├── SELECT stays               ORDER BY check_in                     │
//! │    └── SELECT out_of_order_blocks ORDER BY from_date                    │
//! │                │                                                        │
//! │                ▼                                                        │
//! │    group stays & blocks by room_id ──► Vec<Room>                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use hotelier_core::{GuestInfo, OutOfOrderBlock, Room, Stay, StayStatus};

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RoomRecord {
    id: String,
    hotel_id: String,
    number: String,
    category: String,
}

#[derive(Debug, sqlx::FromRow)]
struct StayRecord {
    id: String,
    room_id: String,
    guest_name: String,
    guest_phone: Option<String>,
    guest_email: Option<String>,
    check_in: NaiveDate,
    check_out: NaiveDate,
    room_charge_cents: i64,
    paid_amount_cents: i64,
    is_group_booking: bool,
    group_master_stay_id: Option<String>,
    status: StayStatus,
    created_at: DateTime<Utc>,
}

impl From<StayRecord> for Stay {
    fn from(r: StayRecord) -> Self {
        Stay {
            id: r.id,
            room_id: r.room_id,
            guest: GuestInfo {
                name: r.guest_name,
                phone: r.guest_phone,
                email: r.guest_email,
            },
            check_in: r.check_in,
            check_out: r.check_out,
            room_charge_cents: r.room_charge_cents,
            paid_amount_cents: r.paid_amount_cents,
            is_group_booking: r.is_group_booking,
            group_master_stay_id: r.group_master_stay_id,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BlockRecord {
    id: String,
    room_id: String,
    from_date: NaiveDate,
    to_date: NaiveDate,
    reason: Option<String>,
}

impl From<BlockRecord> for OutOfOrderBlock {
    fn from(r: BlockRecord) -> Self {
        OutOfOrderBlock {
            id: r.id,
            from: r.from_date,
            to: r.to_date,
            reason: r.reason,
        }
    }
}

const STAY_COLUMNS: &str = r#"
    id, room_id, guest_name, guest_phone, guest_email,
    check_in, check_out, room_charge_cents, paid_amount_cents,
    is_group_booking, group_master_stay_id, status, created_at
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for rooms, stays and out-of-order blocks.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    /// Creates a new RoomRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    /// Inserts a room with all of its stays and blocks in one transaction.
    pub async fn insert(&self, room: &Room) -> DbResult<()> {
        debug!(id = %room.id, number = %room.number, "Inserting room");

        let mut tx = self.pool.begin().await?;
        upsert_room_row(&mut *tx, room).await?;
        for stay in &room.stays {
            upsert_stay_row(&mut *tx, stay).await?;
        }
        for block in &room.out_of_order {
            insert_block_row(&mut *tx, &room.id, block).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Inserts or updates the room row only (number, category).
    pub async fn upsert_room(&self, room: &Room) -> DbResult<()> {
        upsert_room_row(&self.pool, room).await
    }

    /// Loads every room of a hotel with its stays and blocks, in numeric
    /// room-number order.
    pub async fn list(&self, hotel_id: &str) -> DbResult<Vec<Room>> {
        let rooms: Vec<RoomRecord> = sqlx::query_as(
            r#"
            SELECT id, hotel_id, number, category
            FROM rooms
            WHERE hotel_id = ?1
            ORDER BY CAST(number AS INTEGER), number
            "#,
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        let stays: Vec<StayRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM stays WHERE hotel_id = ?1 ORDER BY check_in, created_at",
            STAY_COLUMNS
        ))
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        let blocks: Vec<BlockRecord> = sqlx::query_as(
            r#"
            SELECT id, room_id, from_date, to_date, reason
            FROM out_of_order_blocks
            WHERE hotel_id = ?1
            ORDER BY from_date
            "#,
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stays_by_room: HashMap<String, Vec<Stay>> = HashMap::new();
        for record in stays {
            stays_by_room
                .entry(record.room_id.clone())
                .or_default()
                .push(record.into());
        }
        let mut blocks_by_room: HashMap<String, Vec<OutOfOrderBlock>> = HashMap::new();
        for record in blocks {
            blocks_by_room
                .entry(record.room_id.clone())
                .or_default()
                .push(record.into());
        }

        let rooms = rooms
            .into_iter()
            .map(|r| Room {
                stays: stays_by_room.remove(&r.id).unwrap_or_default(),
                out_of_order: blocks_by_room.remove(&r.id).unwrap_or_default(),
                id: r.id,
                hotel_id: r.hotel_id,
                number: r.number,
                category: r.category,
            })
            .collect::<Vec<_>>();

        debug!(hotel_id = %hotel_id, rooms = rooms.len(), "Loaded rooms");
        Ok(rooms)
    }

    /// Loads one room with its stays and blocks.
    pub async fn get(&self, room_id: &str) -> DbResult<Option<Room>> {
        let record: Option<RoomRecord> = sqlx::query_as(
            "SELECT id, hotel_id, number, category FROM rooms WHERE id = ?1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let stays: Vec<StayRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM stays WHERE room_id = ?1 ORDER BY check_in, created_at",
            STAY_COLUMNS
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        let blocks: Vec<BlockRecord> = sqlx::query_as(
            "SELECT id, room_id, from_date, to_date, reason FROM out_of_order_blocks WHERE room_id = ?1 ORDER BY from_date",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Room {
            id: record.id,
            hotel_id: record.hotel_id,
            number: record.number,
            category: record.category,
            stays: stays.into_iter().map(Stay::from).collect(),
            out_of_order: blocks.into_iter().map(OutOfOrderBlock::from).collect(),
        }))
    }

    /// Inserts or updates a stay. The hotel id is taken from the owning room.
    pub async fn upsert_stay(&self, stay: &Stay) -> DbResult<()> {
        debug!(id = %stay.id, room_id = %stay.room_id, status = %stay.status, "Saving stay");
        upsert_stay_row(&self.pool, stay).await
    }

    /// Deletes a stay row. Returns false when it did not exist.
    pub async fn delete_stay(&self, stay_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM stays WHERE id = ?1")
            .bind(stay_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds an out-of-order block to a room.
    pub async fn insert_block(&self, room_id: &str, block: &OutOfOrderBlock) -> DbResult<()> {
        debug!(room_id = %room_id, block_id = %block.id, "Inserting out-of-order block");
        insert_block_row(&self.pool, room_id, block).await
    }

    /// Removes an out-of-order block.
    pub async fn delete_block(&self, block_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM out_of_order_blocks WHERE id = ?1")
            .bind(block_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Out-of-order block", block_id));
        }

        Ok(())
    }

    /// Counts rooms of a hotel.
    pub async fn count(&self, hotel_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE hotel_id = ?1")
            .bind(hotel_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Row Writers
// =============================================================================

async fn upsert_room_row<'e>(executor: impl SqliteExecutor<'e>, room: &Room) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO rooms (id, hotel_id, number, category)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT (id) DO UPDATE SET
            number = excluded.number,
            category = excluded.category
        "#,
    )
    .bind(&room.id)
    .bind(&room.hotel_id)
    .bind(&room.number)
    .bind(&room.category)
    .execute(executor)
    .await?;

    Ok(())
}

async fn upsert_stay_row<'e>(executor: impl SqliteExecutor<'e>, stay: &Stay) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stays (
            id, hotel_id, room_id, guest_name, guest_phone, guest_email,
            check_in, check_out, room_charge_cents, paid_amount_cents,
            is_group_booking, group_master_stay_id, status, created_at
        ) VALUES (
            ?1, (SELECT hotel_id FROM rooms WHERE id = ?2), ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13
        )
        ON CONFLICT (id) DO UPDATE SET
            room_id = excluded.room_id,
            guest_name = excluded.guest_name,
            guest_phone = excluded.guest_phone,
            guest_email = excluded.guest_email,
            check_in = excluded.check_in,
            check_out = excluded.check_out,
            room_charge_cents = excluded.room_charge_cents,
            paid_amount_cents = excluded.paid_amount_cents,
            is_group_booking = excluded.is_group_booking,
            group_master_stay_id = excluded.group_master_stay_id,
            status = excluded.status
        "#,
    )
    .bind(&stay.id)
    .bind(&stay.room_id)
    .bind(&stay.guest.name)
    .bind(&stay.guest.phone)
    .bind(&stay.guest.email)
    .bind(stay.check_in)
    .bind(stay.check_out)
    .bind(stay.room_charge_cents)
    .bind(stay.paid_amount_cents)
    .bind(stay.is_group_booking)
    .bind(&stay.group_master_stay_id)
    .bind(stay.status)
    .bind(stay.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn insert_block_row<'e>(
    executor: impl SqliteExecutor<'e>,
    room_id: &str,
    block: &OutOfOrderBlock,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO out_of_order_blocks (id, hotel_id, room_id, from_date, to_date, reason)
        VALUES (?1, (SELECT hotel_id FROM rooms WHERE id = ?2), ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&block.id)
    .bind(room_id)
    .bind(block.from)
    .bind(block.to)
    .bind(&block.reason)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn stay(id: &str, room_id: &str) -> Stay {
        Stay {
            id: id.to_string(),
            room_id: room_id.to_string(),
            guest: GuestInfo {
                name: "Asha Rao".to_string(),
                phone: Some("+91 98450 00000".to_string()),
                email: None,
            },
            check_in: d(1),
            check_out: d(3),
            room_charge_cents: 10_000,
            paid_amount_cents: 5_000,
            is_group_booking: false,
            group_master_stay_id: None,
            status: StayStatus::CheckedIn,
            created_at: Utc.with_ymd_and_hms(2026, 9, 30, 14, 0, 0).unwrap(),
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_list_room_with_children() {
        let db = db().await;
        let mut room = Room::new("r-101", "h", "101", "Deluxe");
        room.stays.push(stay("s-1", "r-101"));
        room.out_of_order.push(OutOfOrderBlock {
            id: "b-1".to_string(),
            from: d(10),
            to: d(12),
            reason: Some("Plumbing".to_string()),
        });
        db.rooms().insert(&room).await.unwrap();
        db.rooms().insert(&Room::new("r-102", "h", "102", "Suite")).await.unwrap();
        db.rooms().insert(&Room::new("r-x", "other", "101", "Suite")).await.unwrap();

        let rooms = db.rooms().list("h").await.unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0], room);
        assert!(rooms[1].stays.is_empty());
        assert_eq!(db.rooms().count("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_room_numbers_numerically() {
        let db = db().await;
        for number in ["101", "10", "9"] {
            let room = Room::new(format!("r-{}", number), "h", number, "Std");
            db.rooms().insert(&room).await.unwrap();
        }

        let numbers: Vec<String> = db
            .rooms()
            .list("h")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.number)
            .collect();
        assert_eq!(numbers, vec!["9", "10", "101"]);
    }

    #[tokio::test]
    async fn test_upsert_stay_updates_in_place() {
        let db = db().await;
        db.rooms().insert(&Room::new("r-101", "h", "101", "Deluxe")).await.unwrap();

        let mut s = stay("s-1", "r-101");
        db.rooms().upsert_stay(&s).await.unwrap();
        s.check_out = d(5);
        s.group_master_stay_id = Some("s-1".to_string());
        s.is_group_booking = true;
        db.rooms().upsert_stay(&s).await.unwrap();

        let room = db.rooms().get("r-101").await.unwrap().unwrap();
        assert_eq!(room.stays.len(), 1);
        assert_eq!(room.stays[0].check_out, d(5));
        assert!(room.stays[0].is_grouped());

        assert!(db.rooms().delete_stay("s-1").await.unwrap());
        assert!(!db.rooms().delete_stay("s-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_stay_needs_existing_room() {
        let db = db().await;
        let err = db.rooms().upsert_stay(&stay("s-1", "ghost")).await.unwrap_err();
        // hotel_id subselect is NULL and room_id has no parent
        assert!(matches!(
            err,
            DbError::ForeignKeyViolation { .. } | DbError::QueryFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_block_lifecycle() {
        let db = db().await;
        db.rooms().insert(&Room::new("r-101", "h", "101", "Deluxe")).await.unwrap();
        let block = OutOfOrderBlock {
            id: "b-1".to_string(),
            from: d(1),
            to: d(1),
            reason: None,
        };
        db.rooms().insert_block("r-101", &block).await.unwrap();
        assert_eq!(db.rooms().get("r-101").await.unwrap().unwrap().out_of_order, vec![block]);

        db.rooms().delete_block("b-1").await.unwrap();
        assert!(matches!(
            db.rooms().delete_block("b-1").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_missing_room() {
        let db = db().await;
        assert!(db.rooms().get("nope").await.unwrap().is_none());
    }
}
