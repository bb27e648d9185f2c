//! # Inventory Repository
//!
//! Items and their stock movements. A movement insert and the matching
//! `stock` update always share one transaction, so the cached stock column
//! equals `SUM(quantity)` for the item at every commit.

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use hotelier_core::{InventoryItem, MovementKind, StockMovement};

#[derive(Debug, sqlx::FromRow)]
struct ItemRecord {
    id: String,
    hotel_id: String,
    name: String,
    stock: i64,
    par_level: i64,
    unit: String,
}

impl From<ItemRecord> for InventoryItem {
    fn from(r: ItemRecord) -> Self {
        InventoryItem {
            id: r.id,
            hotel_id: r.hotel_id,
            name: r.name,
            stock: r.stock,
            par_level: r.par_level,
            unit: r.unit,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovementRecord {
    id: String,
    item_id: String,
    kind: MovementKind,
    quantity: i64,
    note: String,
    created_at: DateTime<Utc>,
}

impl From<MovementRecord> for StockMovement {
    fn from(r: MovementRecord) -> Self {
        StockMovement {
            id: r.id,
            item_id: r.item_id,
            kind: r.kind,
            quantity: r.quantity,
            note: r.note,
            created_at: r.created_at,
        }
    }
}

const ITEM_COLUMNS: &str = "id, hotel_id, name, stock, par_level, unit";
const MOVEMENT_COLUMNS: &str = "id, item_id, kind, quantity, note, created_at";

/// Repository for inventory items and stock movements.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Creates an item with zero stock, then applies its opening movement.
    pub async fn create_item(
        &self,
        item: &InventoryItem,
        opening: Option<&StockMovement>,
    ) -> DbResult<InventoryItem> {
        debug!(item_id = %item.id, name = %item.name, "Creating inventory item");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_items (id, hotel_id, name, stock, par_level, unit)
            VALUES (?1, ?2, ?3, 0, ?4, ?5)
            "#,
        )
        .bind(&item.id)
        .bind(&item.hotel_id)
        .bind(&item.name)
        .bind(item.par_level)
        .bind(&item.unit)
        .execute(&mut *tx)
        .await?;

        if let Some(movement) = opening {
            apply_movement(&mut tx, &item.hotel_id, movement).await?;
        }

        let created = fetch_item(&mut *tx, &item.id).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Records a movement and applies it to the item's stock.
    ///
    /// Returns the item as stored after the update.
    pub async fn record_movement(
        &self,
        hotel_id: &str,
        movement: &StockMovement,
    ) -> DbResult<InventoryItem> {
        debug!(
            item_id = %movement.item_id,
            kind = movement.kind.as_str(),
            quantity = movement.quantity,
            "Recording stock movement"
        );

        let mut tx = self.pool.begin().await?;
        apply_movement(&mut tx, hotel_id, movement).await?;
        let item = fetch_item(&mut *tx, &movement.item_id).await?;
        tx.commit().await?;
        Ok(item)
    }

    /// Every item of a hotel, by name.
    pub async fn items(&self, hotel_id: &str) -> DbResult<Vec<InventoryItem>> {
        let records: Vec<ItemRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM inventory_items WHERE hotel_id = ?1 ORDER BY name",
            ITEM_COLUMNS
        ))
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(InventoryItem::from).collect())
    }

    pub async fn get_item(&self, item_id: &str) -> DbResult<Option<InventoryItem>> {
        let record: Option<ItemRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM inventory_items WHERE id = ?1",
            ITEM_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(InventoryItem::from))
    }

    /// Items strictly below par level.
    pub async fn low_stock(&self, hotel_id: &str) -> DbResult<Vec<InventoryItem>> {
        let records: Vec<ItemRecord> = sqlx::query_as(&format!(
            "SELECT {} FROM inventory_items WHERE hotel_id = ?1 AND stock < par_level ORDER BY name",
            ITEM_COLUMNS
        ))
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(InventoryItem::from).collect())
    }

    /// Movement log, newest first, optionally for one item.
    pub async fn movements(
        &self,
        hotel_id: &str,
        item_id: Option<&str>,
    ) -> DbResult<Vec<StockMovement>> {
        let records: Vec<MovementRecord> = match item_id {
            Some(item_id) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM stock_movements WHERE hotel_id = ?1 AND item_id = ?2 ORDER BY created_at DESC, rowid DESC",
                    MOVEMENT_COLUMNS
                ))
                .bind(hotel_id)
                .bind(item_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM stock_movements WHERE hotel_id = ?1 ORDER BY created_at DESC, rowid DESC",
                    MOVEMENT_COLUMNS
                ))
                .bind(hotel_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records.into_iter().map(StockMovement::from).collect())
    }

    /// Sum of every recorded movement for the item.
    pub async fn running_total(&self, item_id: &str) -> DbResult<i64> {
        let total: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(quantity), 0) FROM stock_movements WHERE item_id = ?1",
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.0)
    }
}

async fn apply_movement(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    hotel_id: &str,
    movement: &StockMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, hotel_id, item_id, kind, quantity, note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(hotel_id)
    .bind(&movement.item_id)
    .bind(movement.kind)
    .bind(movement.quantity)
    .bind(&movement.note)
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;

    let result = sqlx::query("UPDATE inventory_items SET stock = stock + ?2 WHERE id = ?1")
        .bind(&movement.item_id)
        .bind(movement.quantity)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Inventory item", &movement.item_id));
    }

    Ok(())
}

async fn fetch_item<'e>(executor: impl SqliteExecutor<'e>, item_id: &str) -> DbResult<InventoryItem> {
    let record: Option<ItemRecord> = sqlx::query_as(&format!(
        "SELECT {} FROM inventory_items WHERE id = ?1",
        ITEM_COLUMNS
    ))
    .bind(item_id)
    .fetch_optional(executor)
    .await?;

    record
        .map(InventoryItem::from)
        .ok_or_else(|| DbError::not_found("Inventory item", item_id))
}
