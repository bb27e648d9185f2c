//! # hotelier-db: Database Layer for Hotelier
//!
//! This crate persists rooms, stays, service requests, inventory and checkout
//! history in SQLite using sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hotelier Data Flow                               │
//! │                                                                         │
//! │  hotelier-sync (DatabaseSource publishes snapshots)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   hotelier-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ RoomRepo       │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ServiceRepo    │    │ 0001_initial │  │   │
//! │  │   │ Connection    │    │ InventoryRepo  │    │   _schema    │  │   │
//! │  │   │ Management    │    │ CheckoutRepo   │    │              │  │   │
//! │  │   │               │    │ SettingsRepo   │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (hotelier.db)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hotelier_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("hotelier.db")).await?;
//! let rooms = db.rooms().list(hotel_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::checkout::CheckoutHistoryRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::room::RoomRepository;
pub use repository::service::ServiceRequestRepository;
pub use repository::settings::SettingsRepository;
