//! # Repository Module
//!
//! Database repository implementations for Hotelier.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  DatabaseSource / seed                                                 │
//! │       │                                                                 │
//! │       │  db.rooms().list(hotel_id)                                     │
//! │       ▼                                                                 │
//! │  RoomRepository                                                        │
//! │  ├── list(&self, hotel_id)      rooms + stays + blocks                 │
//! │  ├── upsert_stay(&self, stay)                                          │
//! │  └── insert_block(&self, ...)                                          │
//! │       │                                                                 │
//! │       │  SQL (sqlx::query_as into private *Record rows)                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every repository reads into a private `*Record` struct deriving
//! `sqlx::FromRow` and converts it into the hotelier-core type, so the pure
//! crate never depends on row layout.
//!
//! ## Available Repositories
//!
//! - [`RoomRepository`](room::RoomRepository) - Rooms, stays, out-of-order blocks
//! - [`ServiceRequestRepository`](service::ServiceRequestRepository) - Service requests
//! - [`InventoryRepository`](inventory::InventoryRepository) - Items and stock movements
//! - [`CheckoutHistoryRepository`](checkout::CheckoutHistoryRepository) - Archived stays
//! - [`SettingsRepository`](settings::SettingsRepository) - Fee rates

pub mod checkout;
pub mod inventory;
pub mod room;
pub mod service;
pub mod settings;
