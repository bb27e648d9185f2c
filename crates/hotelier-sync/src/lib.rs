//! # hotelier-sync: Change Feed and Snapshot Store for Hotelier
//!
//! This crate keeps a typed, always-recomputed view of one hotel on top of a
//! push-based feed of stored documents.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Layer Architecture                          │
//! │                                                                         │
//! │  ┌────────────────┐      ┌────────────────┐      ┌──────────────────┐  │
//! │  │ DatabaseSource │      │ BroadcastFeed  │      │   HotelStore     │  │
//! │  │                │      │                │      │                  │  │
//! │  │ hotelier-db    │─────►│ Snapshot       │─────►│ inbound decode   │  │
//! │  │ rows → docs    │      │ Changes        │      │ RwLock snapshot  │  │
//! │  │                │      │ Status         │      │ readiness checks │  │
//! │  └────────────────┘      └────────────────┘      └────────┬─────────┘  │
//! │                                                           │            │
//! │                                                           ▼            │
//! │                                        hotelier-core (pure, on read)   │
//! │                                        BillingContext, OccupancyWindow │
//! │                                        InventoryLedger, ServiceLedger  │
//! │                                                                         │
//! │  Disconnected, lagged or not-yet-loaded data surfaces as an error the  │
//! │  caller shows as a degraded state.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - `HotelierConfig` (TOML file + environment overrides)
//! - [`error`] - Sync error types
//! - [`protocol`] - Feed message types
//! - [`inbound`] - Document ⇄ entity conversion with lenient date recovery
//! - [`feed`] - `ChangeFeed` trait and the broadcast implementation
//! - [`store`] - `HotelStore` snapshot and reads
//! - [`source`] - `DatabaseSource` snapshot publisher
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hotelier_sync::{BroadcastFeed, ChangeFeed, DatabaseSource, HotelStore, HotelierConfig};
//!
//! let config = HotelierConfig::load(None)?;
//! let db = hotelier_db::Database::new(config.db_config()).await?;
//!
//! let feed = BroadcastFeed::new(config.feed.channel_capacity);
//! let store = HotelStore::new(config.hotel_id(), Arc::new(SystemClock));
//! let sub = feed.subscribe(config.hotel_id());
//!
//! DatabaseSource::new(db, config.hotel_id()).hydrate(feed, sub, &store).await?;
//!
//! let report = store.occupancy(OccupancyWindow::Last7Days).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod feed;
pub mod inbound;
pub mod protocol;
pub mod source;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::HotelierConfig;
pub use error::{SyncError, SyncResult};
pub use feed::{BroadcastFeed, ChangeFeed, FeedEvent, Subscription};
pub use protocol::{Collection, Document, DocumentChange, FeedMessage, FeedStatus};
pub use source::DatabaseSource;
pub use store::{Folio, HotelStore};
