//! # Hotelier Configuration
//!
//! Configuration for the hotel, the database, the feed, and billing fallbacks.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HOTELIER_HOTEL_ID=grand-palace                                     │
//! │     HOTELIER_GST_RATE=12                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/hotelier/hotelier.toml (Linux)                           │
//! │     ~/Library/Application Support/com.hotelier.hotelier/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     DEFAULT_HOTEL_ID, 0% GST, 0% service charge, Flag policy           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # hotelier.toml
//! [hotel]
//! id = "grand-palace"
//! name = "Grand Palace"
//!
//! [database]
//! path = "/var/lib/hotelier/hotelier.db"
//! max_connections = 5
//!
//! [feed]
//! channel_capacity = 256
//!
//! [billing]
//! gst_rate = 12.0            # percent, used until a settings record arrives
//! service_charge_rate = 5.0
//!
//! [inventory]
//! negative_stock_policy = "flag"   # flag | reject
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::protocol::Collection;
use hotelier_core::validation::validate_rate_percent;
use hotelier_core::{NegativeStockPolicy, Settings, DEFAULT_HOTEL_ID};

// =============================================================================
// Sections
// =============================================================================

/// The property this process serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelConfig {
    /// Key for every table row and feed message.
    #[serde(default = "default_hotel_id")]
    pub id: String,

    /// Display name for reports.
    #[serde(default = "default_hotel_name")]
    pub name: String,
}

fn default_hotel_id() -> String {
    DEFAULT_HOTEL_ID.to_string()
}

fn default_hotel_name() -> String {
    "Hotelier".to_string()
}

impl Default for HotelConfig {
    fn default() -> Self {
        HotelConfig {
            id: default_hotel_id(),
            name: default_hotel_name(),
        }
    }
}

/// SQLite location and pool size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "hotelier", "hotelier")
        .map(|dirs| dirs.data_dir().join("hotelier.db"))
        .unwrap_or_else(|| PathBuf::from("./hotelier.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Change feed tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Messages buffered per subscriber before it is reported as lagged.
    /// Must hold at least one full snapshot.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for FeedSettings {
    fn default() -> Self {
        FeedSettings {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Fallback fee rates, in percent. A settings record from the feed wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingSettings {
    #[serde(default)]
    pub gst_rate: f64,

    #[serde(default)]
    pub service_charge_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySettings {
    #[serde(default)]
    pub negative_stock_policy: NegativeStockPolicy,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotelierConfig {
    #[serde(default)]
    pub hotel: HotelConfig,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub feed: FeedSettings,

    #[serde(default)]
    pub billing: BillingSettings,

    #[serde(default)]
    pub inventory: InventorySettings,
}

impl HotelierConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`hotelier.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; missing sections take their defaults.
    pub fn from_toml(contents: &str) -> SyncResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.hotel.id.trim().is_empty() {
            return Err(SyncError::InvalidConfig("hotel.id must not be empty".into()));
        }

        validate_rate_percent("billing.gst_rate", self.billing.gst_rate)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;
        validate_rate_percent("billing.service_charge_rate", self.billing.service_charge_rate)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        if self.database.max_connections == 0 {
            return Err(SyncError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        // A snapshot is one status message plus one message per collection.
        let snapshot_len = Collection::ALL.len() + 1;
        if self.feed.channel_capacity < snapshot_len {
            return Err(SyncError::InvalidConfig(format!(
                "feed.channel_capacity must be at least {} to hold a full snapshot",
                snapshot_len
            )));
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// [`load`](Self::load)).
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("HOTELIER_HOTEL_ID") {
            debug!(hotel_id = %id, "Overriding hotel ID from environment");
            self.hotel.id = id;
        }

        if let Some(path) = var("HOTELIER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(rate) = var("HOTELIER_GST_RATE") {
            match rate.parse::<f64>() {
                Ok(r) => self.billing.gst_rate = r,
                Err(_) => warn!(value = %rate, "Ignoring unparseable HOTELIER_GST_RATE"),
            }
        }

        if let Some(rate) = var("HOTELIER_SERVICE_CHARGE_RATE") {
            match rate.parse::<f64>() {
                Ok(r) => self.billing.service_charge_rate = r,
                Err(_) => warn!(value = %rate, "Ignoring unparseable HOTELIER_SERVICE_CHARGE_RATE"),
            }
        }

        if let Some(policy) = var("HOTELIER_NEGATIVE_STOCK") {
            match policy.parse::<NegativeStockPolicy>() {
                Ok(p) => self.inventory.negative_stock_policy = p,
                Err(e) => warn!(error = %e, "Ignoring HOTELIER_NEGATIVE_STOCK"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "hotelier", "hotelier")
            .map(|dirs| dirs.config_dir().join("hotelier.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn hotel_id(&self) -> &str {
        &self.hotel.id
    }

    /// Fallback fee settings built from the `[billing]` section.
    pub fn billing_settings(&self) -> Settings {
        Settings::from_percentages(self.billing.gst_rate, self.billing.service_charge_rate)
    }

    /// Pool configuration for `hotelier-db`.
    pub fn db_config(&self) -> hotelier_db::DbConfig {
        hotelier_db::DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = HotelierConfig::default();
        assert_eq!(config.hotel_id(), DEFAULT_HOTEL_ID);
        assert_eq!(config.feed.channel_capacity, 256);
        assert_eq!(config.inventory.negative_stock_policy, NegativeStockPolicy::Flag);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HotelierConfig::from_toml(
            r#"
            [hotel]
            id = "grand-palace"

            [billing]
            gst_rate = 12.0
            service_charge_rate = 5.0

            [inventory]
            negative_stock_policy = "reject"
            "#,
        )
        .unwrap();

        assert_eq!(config.hotel.id, "grand-palace");
        assert_eq!(config.hotel.name, "Hotelier");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.billing_settings().gst_rate.bps(), 1200);
        assert_eq!(config.billing_settings().service_charge_rate.bps(), 500);
        assert_eq!(config.inventory.negative_stock_policy, NegativeStockPolicy::Reject);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HOTELIER_HOTEL_ID", "seaside"),
            ("HOTELIER_DB_PATH", "/tmp/seaside.db"),
            ("HOTELIER_GST_RATE", "18"),
            ("HOTELIER_SERVICE_CHARGE_RATE", "not-a-number"),
            ("HOTELIER_NEGATIVE_STOCK", "reject"),
        ]
        .into_iter()
        .collect();

        let mut config = HotelierConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.hotel.id, "seaside");
        assert_eq!(config.database.path, PathBuf::from("/tmp/seaside.db"));
        assert_eq!(config.billing.gst_rate, 18.0);
        assert_eq!(config.billing.service_charge_rate, 0.0);
        assert_eq!(config.inventory.negative_stock_policy, NegativeStockPolicy::Reject);
    }

    #[test]
    fn test_config_validation() {
        let mut config = HotelierConfig::default();

        config.billing.gst_rate = 120.0;
        assert!(config.validate().unwrap_err().is_config_error());

        config.billing.gst_rate = 10.0;
        config.hotel.id = "  ".to_string();
        assert!(config.validate().is_err());

        config.hotel.id = "h".to_string();
        config.feed.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_capacity_holds_snapshot() {
        let mut config = HotelierConfig::default();

        for capacity in 1..=Collection::ALL.len() {
            config.feed.channel_capacity = capacity;
            assert!(config.validate().unwrap_err().is_config_error());
        }

        config.feed.channel_capacity = Collection::ALL.len() + 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_toml_is_load_error() {
        let err = HotelierConfig::from_toml("[hotel\nid = 1").unwrap_err();
        assert!(matches!(err, SyncError::ConfigLoadFailed(_)));
    }
}
