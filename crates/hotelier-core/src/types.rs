//! # Domain Types
//!
//! Core domain types used throughout Hotelier.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐  owns  ┌─────────────────┐   ┌─────────────────┐  │
//! │  │      Room       │───────►│      Stay       │   │ OutOfOrderBlock │  │
//! │  │  ─────────────  │        │  ─────────────  │   │  ─────────────  │  │
//! │  │  id, number     │        │  check_in/out   │   │  from..=to      │  │
//! │  │  category       │───┐    │  room_charge    │   └─────────────────┘  │
//! │  │  stays, blocks  │   │    │  group master   │           ▲            │
//! │  └─────────────────┘   └────┼─────────────────┼───────────┘            │
//! │                             └────────▲────────┘                        │
//! │                                      │ stay_id (weak)                  │
//! │  ┌─────────────────┐   ┌─────────────┴───┐   ┌─────────────────┐       │
//! │  │  InventoryItem  │◄──│  StockMovement  │   │ ServiceRequest  │       │
//! │  │  stock, par     │   │  kind, quantity │   │  price, status  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Date Conventions
//! - A stay occupies the half-open range `[check_in, check_out)`: the guest
//!   sleeps in the room every night from check-in up to, not including, the
//!   check-out day.
//! - Out-of-order blocks and [`DateRange`] are inclusive on both ends.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::{FeeRate, Money};

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// A range covering exactly one day.
    pub fn single(day: NaiveDate) -> Self {
        DateRange {
            start: day,
            end: day,
        }
    }

    /// True when `end` is before `start`; such a range contains no days.
    pub fn is_reversed(&self) -> bool {
        self.end < self.start
    }

    /// Number of days in the range (0 when reversed).
    pub fn len_days(&self) -> i64 {
        if self.is_reversed() {
            0
        } else {
            (self.end - self.start).num_days() + 1
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Iterates every day from `start` to `end` inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

// =============================================================================
// Stay Status
// =============================================================================

/// Lifecycle status of a stay.
///
/// ## State Machine
/// ```text
///   Reserved ──► CheckedIn ──► CheckedOut (terminal)
///       │            │
///       └────────────┴──────► Cancelled  (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StayStatus {
    /// Booked, guest has not arrived.
    Reserved,
    /// Guest is in the room.
    CheckedIn,
    /// Guest has left and the folio is closed.
    CheckedOut,
    /// Booking was called off.
    Cancelled,
}

impl StayStatus {
    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StayStatus::CheckedOut | StayStatus::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: StayStatus) -> bool {
        use StayStatus::*;
        matches!(
            (self, next),
            (Reserved, CheckedIn)
                | (CheckedIn, CheckedOut)
                | (Reserved, Cancelled)
                | (CheckedIn, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StayStatus::Reserved => "reserved",
            StayStatus::CheckedIn => "checked_in",
            StayStatus::CheckedOut => "checked_out",
            StayStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for StayStatus {
    fn default() -> Self {
        StayStatus::Reserved
    }
}

impl fmt::Display for StayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Guest & Stay
// =============================================================================

/// Contact details captured at booking time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuestInfo {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl GuestInfo {
    pub fn named(name: impl Into<String>) -> Self {
        GuestInfo {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A single guest's booked date range on one room.
///
/// ## Group Bookings
/// Clubbed stays share `group_master_stay_id`. The master points to itself,
/// and every member carries `is_group_booking = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Stay {
    pub id: String,
    pub room_id: String,
    pub guest: GuestInfo,
    #[ts(as = "String")]
    pub check_in: NaiveDate,
    #[ts(as = "String")]
    pub check_out: NaiveDate,
    /// Nightly rate in cents.
    pub room_charge_cents: i64,
    /// Cumulative payments in cents.
    pub paid_amount_cents: i64,
    pub is_group_booking: bool,
    pub group_master_stay_id: Option<String>,
    pub status: StayStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Stay {
    /// Returns the nightly rate as Money.
    #[inline]
    pub fn room_charge(&self) -> Money {
        Money::from_cents(self.room_charge_cents)
    }

    /// Returns the amount paid so far as Money.
    #[inline]
    pub fn paid_amount(&self) -> Money {
        Money::from_cents(self.paid_amount_cents)
    }

    /// Billable nights. Never less than one, even for same-day or reversed
    /// ranges.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(1)
    }

    /// Room charge for the whole stay (`room_charge × nights`).
    pub fn total_room_charge(&self) -> Money {
        self.room_charge() * self.nights()
    }

    /// Reserved or checked in.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// True when this stay bills as part of a clubbed group.
    pub fn is_grouped(&self) -> bool {
        self.is_group_booking && self.group_master_stay_id.is_some()
    }

    /// Whether the guest occupies the room on the night of `day`.
    pub fn occupies(&self, day: NaiveDate) -> bool {
        self.check_in <= day && day < self.check_out
    }

    /// Half-open intersection with another stay's range.
    pub fn overlaps_dates(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        self.check_in < check_out && check_in < self.check_out
    }

    /// Whether any night of the stay falls inside the block.
    pub fn overlaps_block(&self, block: &OutOfOrderBlock) -> bool {
        self.check_in <= block.to && block.from < self.check_out
    }
}

// =============================================================================
// Out-of-Order Block
// =============================================================================

/// A maintenance window during which the room cannot be sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OutOfOrderBlock {
    pub id: String,
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
    pub reason: Option<String>,
}

impl OutOfOrderBlock {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// Whether the half-open stay range `[check_in, check_out)` touches the block.
    pub fn blocks(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        check_in <= self.to && self.from < check_out
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.from, self.to)
    }
}

// =============================================================================
// Room
// =============================================================================

/// A sellable room. Owns its stays and maintenance blocks.
///
/// Occupancy is always derived from `stays` and `out_of_order`, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Room {
    pub id: String,
    pub hotel_id: String,
    /// Display number ("101", "PH-2").
    pub number: String,
    pub category: String,
    pub stays: Vec<Stay>,
    pub out_of_order: Vec<OutOfOrderBlock>,
}

impl Room {
    pub fn new(
        id: impl Into<String>,
        hotel_id: impl Into<String>,
        number: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Room {
            id: id.into(),
            hotel_id: hotel_id.into(),
            number: number.into(),
            category: category.into(),
            stays: Vec::new(),
            out_of_order: Vec::new(),
        }
    }

    /// Occupied by an active stay, or out of order, on `day`.
    pub fn is_occupied_on(&self, day: NaiveDate) -> bool {
        self.active_stays().any(|s| s.occupies(day))
            || self.out_of_order.iter().any(|b| b.contains(day))
    }

    pub fn stay(&self, stay_id: &str) -> Option<&Stay> {
        self.stays.iter().find(|s| s.id == stay_id)
    }

    pub fn active_stays(&self) -> impl Iterator<Item = &Stay> {
        self.stays.iter().filter(|s| s.is_active())
    }
}

// =============================================================================
// Service Request
// =============================================================================

/// Status of a guest service request.
///
/// Moves forward only: `Pending → InProgress → Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    InProgress,
    Completed,
}

impl ServiceStatus {
    fn rank(&self) -> u8 {
        match self {
            ServiceStatus::Pending => 0,
            ServiceStatus::InProgress => 1,
            ServiceStatus::Completed => 2,
        }
    }

    /// Forward moves only. Skipping `InProgress` is allowed.
    pub fn can_transition_to(&self, next: ServiceStatus) -> bool {
        next.rank() > self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::InProgress => "in_progress",
            ServiceStatus::Completed => "completed",
        }
    }
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::Pending
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guest service request charged to a stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceRequest {
    pub id: String,
    pub hotel_id: String,
    /// Weak reference to the owning stay.
    pub stay_id: String,
    /// Denormalized for display.
    pub room_number: String,
    pub service_name: String,
    /// `None` is a free request, billed as zero.
    pub price_cents: Option<i64>,
    pub status: ServiceStatus,
    /// Staff member or department handling the request.
    pub assigned_to: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ServiceRequest {
    /// Billed price; a missing price counts as zero.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents.unwrap_or(0))
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// A stocked consumable (linen, toiletries, minibar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,
    pub hotel_id: String,
    pub name: String,
    /// Cached sum of every movement for this item.
    pub stock: i64,
    /// Reorder threshold.
    pub par_level: i64,
    /// Unit of measure ("pcs", "bottles").
    pub unit: String,
}

impl InventoryItem {
    /// Strictly below par. Stock equal to par is not low.
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.par_level
    }
}

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Always positive.
    Restock,
    /// Always negative.
    Consumption,
    /// Either sign.
    Adjustment,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Restock => "restock",
            MovementKind::Consumption => "consumption",
            MovementKind::Adjustment => "adjustment",
        }
    }
}

/// One signed change to an item's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub item_id: String,
    pub kind: MovementKind,
    /// Signed delta.
    pub quantity: i64,
    pub note: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Settings
// =============================================================================

/// Fee rates applied to every folio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settings {
    pub gst_rate: FeeRate,
    pub service_charge_rate: FeeRate,
}

impl Settings {
    /// Builds settings from percentages (`10.0` = 10%).
    pub fn from_percentages(gst: f64, service_charge: f64) -> Self {
        Settings {
            gst_rate: FeeRate::from_percentage(gst),
            service_charge_rate: FeeRate::from_percentage(service_charge),
        }
    }
}

// =============================================================================
// Checkout History
// =============================================================================

/// What a closed stay leaves behind in the checkout archive.
///
/// Service requests travel with the stay and are immutable from here on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRecord {
    pub stay: Stay,
    pub room_id: String,
    pub room_number: String,
    /// `CheckedOut` or `Cancelled`.
    pub final_status: StayStatus,
    pub service_requests: Vec<ServiceRequest>,
    #[ts(as = "String")]
    pub archived_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
