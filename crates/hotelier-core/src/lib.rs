//! # hotelier-core: Pure Engine for Hotelier
//!
//! This crate is the **heart** of Hotelier. It tracks which rooms are occupied
//! over time and derives every guest balance from the records that feed it.
//! Nothing in here performs I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hotelier Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              hotelier-sync (HotelStore, ChangeFeed)             │   │
//! │  │    snapshot + incremental updates ──► typed entities            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ hotelier-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │   stay   │ │ billing  │ │ service  │ │    inventory     │  │   │
//! │  │   │ RoomBook │ │ BillSum. │ │  Ledger  │ │     Ledger       │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │occupancy │ │  money   │ │  clock   │ │   validation     │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • INJECTED CLOCK            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  hotelier-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Room, Stay, ServiceRequest, InventoryItem, ...)
//! - [`money`] - Money and FeeRate with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`clock`] - Injected time source
//! - [`stay`] - Room & Stay lifecycle (`RoomBook`)
//! - [`billing`] - Billing aggregator
//! - [`service`] - Service request ledger
//! - [`inventory`] - Inventory stock ledger
//! - [`occupancy`] - Occupancy analytics
//!
//! ## Design Principles
//!
//! 1. **Recompute, never patch**: billing and occupancy are pure functions
//!    over a snapshot and are re-run whenever any input changes
//! 2. **Integer Money**: all monetary values are in cents (i64)
//! 3. **Explicit Errors**: all errors are typed, never strings or panics
//! 4. **Injected Time**: every timestamp comes from a [`clock::Clock`]
//!
//! ## Example Usage
//!
//! ```rust
//! use hotelier_core::money::{FeeRate, Money};
//!
//! let subtotal = Money::from_cents(22_000); // $220.00
//! let gst = subtotal.percentage_of(FeeRate::from_bps(1000)); // 10%
//! assert_eq!(gst.cents(), 2_200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod clock;
pub mod error;
pub mod inventory;
pub mod money;
pub mod occupancy;
pub mod service;
pub mod stay;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use billing::{get_bill_summary, BillSummary, BillingContext};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::{InventoryLedger, NegativeStockPolicy, StockAlert};
pub use money::{FeeRate, Money};
pub use occupancy::{compute_occupancy, OccupancyPoint, OccupancyReport, OccupancyWindow};
pub use service::{NewServiceRequest, ServiceLedger};
pub use stay::{CheckoutArchive, Closure, Conflict, NewStay, OverlapWarning, RoomBook};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default hotel ID for single-property deployments.
///
/// Every table and feed message is keyed by hotel id so one database can hold
/// several properties; this is the id used when none is configured.
pub const DEFAULT_HOTEL_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Longest stay a single booking may span, in nights.
pub const MAX_STAY_NIGHTS: i64 = 365;
