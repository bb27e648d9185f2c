//! # Settings Repository
//!
//! One row of fee rates per hotel, stored in basis points.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use hotelier_core::{FeeRate, Settings};

#[derive(Debug, sqlx::FromRow)]
struct SettingsRecord {
    gst_rate_bps: i64,
    service_charge_rate_bps: i64,
}

impl From<SettingsRecord> for Settings {
    fn from(r: SettingsRecord) -> Self {
        Settings {
            gst_rate: FeeRate::from_bps(r.gst_rate_bps.clamp(0, 10_000) as u32),
            service_charge_rate: FeeRate::from_bps(r.service_charge_rate_bps.clamp(0, 10_000) as u32),
        }
    }
}

/// Repository for fee-rate settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Rates for a hotel, if they were ever saved.
    pub async fn get(&self, hotel_id: &str) -> DbResult<Option<Settings>> {
        let record: Option<SettingsRecord> = sqlx::query_as(
            "SELECT gst_rate_bps, service_charge_rate_bps FROM settings WHERE hotel_id = ?1",
        )
        .bind(hotel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Settings::from))
    }

    /// Saves rates for a hotel (administrative action).
    pub async fn upsert(&self, hotel_id: &str, settings: &Settings) -> DbResult<()> {
        debug!(
            hotel_id = %hotel_id,
            gst = %settings.gst_rate,
            service_charge = %settings.service_charge_rate,
            "Saving settings"
        );

        sqlx::query(
            r#"
            INSERT INTO settings (hotel_id, gst_rate_bps, service_charge_rate_bps, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (hotel_id) DO UPDATE SET
                gst_rate_bps = excluded.gst_rate_bps,
                service_charge_rate_bps = excluded.service_charge_rate_bps,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(hotel_id)
        .bind(settings.gst_rate.bps() as i64)
        .bind(settings.service_charge_rate.bps() as i64)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
