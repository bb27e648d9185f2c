//! # Room & Stay Lifecycle
//!
//! [`RoomBook`] owns the canonical list of rooms together with their stays and
//! out-of-order blocks, and enforces the booking rules.
//!
//! ## Booking Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_stay ──► Reserved ──check_in_stay──► CheckedIn                  │
//! │                     │                           │                       │
//! │                     │ cancel_stay               │ check_out_stay        │
//! │                     ▼                           ▼                       │
//! │               ┌───────────────────────────────────────┐                 │
//! │               │ remove from room                      │                 │
//! │               │ take service requests from ledger     │                 │
//! │               │ CheckoutArchive::archive(record)      │                 │
//! │               │ tombstone stay id                     │                 │
//! │               └───────────────────────────────────────┘                 │
//! │                                                                         │
//! │  Closing a tombstoned stay again ──► Closure::AlreadyCheckedOut         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Overlap Rules
//! | New range vs.           | create / extend              | mark_out_of_order |
//! |-------------------------|------------------------------|-------------------|
//! | active stay, same room  | `Overlap`                    | `Overlap`         |
//! | out-of-order block      | `Overlap` unless overridden  | allowed           |
//!
//! Stays are half-open `[check_in, check_out)`, so a guest may arrive on the
//! day the previous one leaves.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::service::ServiceLedger;
use crate::types::{
    CheckoutRecord, DateRange, GuestInfo, OutOfOrderBlock, Room, Stay, StayStatus,
};
use crate::validation::{
    validate_block_dates, validate_charge_cents, validate_guest_name, validate_stay_dates,
};

// =============================================================================
// Archive Sink
// =============================================================================

/// Write-only sink for closed stays.
///
/// Closing is synchronous, so persistent storage collects into a
/// `Vec<CheckoutRecord>` and drains it afterwards (see
/// `CheckoutHistoryRepository::archive_all` in `hotelier-db`).
pub trait CheckoutArchive {
    fn archive(&mut self, record: CheckoutRecord);
}

impl CheckoutArchive for Vec<CheckoutRecord> {
    fn archive(&mut self, record: CheckoutRecord) {
        self.push(record);
    }
}

/// Outcome of closing a stay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Closure {
    /// The stay was removed and written to the archive.
    Archived {
        stay_id: String,
        status: StayStatus,
    },
    /// The stay was already closed; nothing changed.
    AlreadyCheckedOut,
}

// =============================================================================
// Inputs & Warnings
// =============================================================================

/// Input for [`RoomBook::create_stay`].
#[derive(Debug, Clone)]
pub struct NewStay {
    pub guest: GuestInfo,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub room_charge_cents: i64,
    pub paid_amount_cents: i64,
    /// Book over an out-of-order block instead of rejecting.
    pub override_out_of_order: bool,
}

impl NewStay {
    pub fn new(
        guest: GuestInfo,
        check_in: NaiveDate,
        check_out: NaiveDate,
        room_charge_cents: i64,
    ) -> Self {
        NewStay {
            guest,
            check_in,
            check_out,
            room_charge_cents,
            paid_amount_cents: 0,
            override_out_of_order: false,
        }
    }

    pub fn with_advance(mut self, paid_cents: i64) -> Self {
        self.paid_amount_cents = paid_cents;
        self
    }

    pub fn overriding_out_of_order(mut self) -> Self {
        self.override_out_of_order = true;
        self
    }
}

/// What a stay collides with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    Stay(String),
    Block(String),
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::Stay(id) => write!(f, "stay {}", id),
            Conflict::Block(id) => write!(f, "out-of-order block {}", id),
        }
    }
}

/// A same-room conflict found in data that was loaded, not booked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapWarning {
    pub room_id: String,
    pub room_number: String,
    pub stay_id: String,
    pub conflict: Conflict,
}

// =============================================================================
// Room Book
// =============================================================================

/// The Room & Stay store for one hotel.
pub struct RoomBook {
    hotel_id: String,
    rooms: Vec<Room>,
    /// Tombstones for closed stays: id → final status.
    closed: HashMap<String, StayStatus>,
    clock: Arc<dyn Clock>,
}

impl RoomBook {
    pub fn new(hotel_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self::from_rooms(hotel_id, Vec::new(), clock)
    }

    pub fn from_rooms(hotel_id: impl Into<String>, rooms: Vec<Room>, clock: Arc<dyn Clock>) -> Self {
        RoomBook {
            hotel_id: hotel_id.into(),
            rooms,
            closed: HashMap::new(),
            clock,
        }
    }

    /// Seeds the closed-stay tombstones, typically from checkout history, so
    /// closing those stays again reports [`Closure::AlreadyCheckedOut`].
    pub fn with_closed(mut self, closed: impl IntoIterator<Item = (String, StayStatus)>) -> Self {
        self.closed.extend(closed);
        self
    }

    pub fn hotel_id(&self) -> &str {
        &self.hotel_id
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    /// Inserts or replaces a room by id.
    pub fn upsert_room(&mut self, room: Room) {
        match self.rooms.iter_mut().find(|r| r.id == room.id) {
            Some(existing) => *existing = room,
            None => self.rooms.push(room),
        }
    }

    pub fn remove_room(&mut self, room_id: &str) -> Option<Room> {
        let idx = self.rooms.iter().position(|r| r.id == room_id)?;
        Some(self.rooms.remove(idx))
    }

    /// Finds an active stay and the room holding it.
    pub fn find_stay(&self, stay_id: &str) -> Option<(&Room, &Stay)> {
        self.rooms
            .iter()
            .find_map(|room| room.stay(stay_id).map(|stay| (room, stay)))
    }

    /// Final status of a closed stay, if it was closed through this book.
    pub fn closed_status(&self, stay_id: &str) -> Option<StayStatus> {
        self.closed.get(stay_id).copied()
    }

    /// Every stay (across all rooms) billed under `master_id`.
    pub fn group_members(&self, master_id: &str) -> Vec<&Stay> {
        self.rooms
            .iter()
            .flat_map(|r| r.stays.iter())
            .filter(|s| s.group_master_stay_id.as_deref() == Some(master_id))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Booking
    // -------------------------------------------------------------------------

    /// Books a new `Reserved` stay on a room.
    ///
    /// ## Errors
    /// - `Validation`: blank guest name, `check_out <= check_in`, negative amounts
    /// - `RoomNotFound`
    /// - `Overlap`: intersects an active stay, or a block without override
    pub fn create_stay(&mut self, room_id: &str, new: NewStay) -> CoreResult<Stay> {
        validate_guest_name(&new.guest.name)?;
        validate_stay_dates(new.check_in, new.check_out)?;
        validate_charge_cents("room charge", new.room_charge_cents)?;
        validate_charge_cents("paid amount", new.paid_amount_cents)?;

        let now = self.clock.now();
        let room = self.room_mut(room_id)?;
        check_room_conflicts(
            room,
            None,
            new.check_in,
            new.check_out,
            new.override_out_of_order,
        )?;

        let stay = Stay {
            id: Uuid::new_v4().to_string(),
            room_id: room.id.clone(),
            guest: new.guest,
            check_in: new.check_in,
            check_out: new.check_out,
            room_charge_cents: new.room_charge_cents,
            paid_amount_cents: new.paid_amount_cents,
            is_group_booking: false,
            group_master_stay_id: None,
            status: StayStatus::Reserved,
            created_at: now,
        };

        info!(
            stay_id = %stay.id,
            room = %room.number,
            check_in = %stay.check_in,
            check_out = %stay.check_out,
            "Stay created"
        );
        room.stays.push(stay.clone());
        Ok(stay)
    }

    /// Moves a `Reserved` stay to `CheckedIn`.
    pub fn check_in_stay(&mut self, stay_id: &str) -> CoreResult<Stay> {
        let stay = self.stay_mut(stay_id)?;
        transition(stay, StayStatus::CheckedIn)?;
        debug!(stay_id = %stay_id, "Guest checked in");
        Ok(stay.clone())
    }

    /// Adds a payment to the stay's cumulative paid amount.
    pub fn record_payment(&mut self, stay_id: &str, amount_cents: i64) -> CoreResult<Stay> {
        validate_charge_cents("payment", amount_cents)?;
        let stay = self.stay_mut(stay_id)?;
        stay.paid_amount_cents = stay
            .paid_amount_cents
            .checked_add(amount_cents)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "paid amount".to_string(),
                min: 0,
                max: i64::MAX,
            })?;
        debug!(stay_id = %stay_id, amount_cents, total = stay.paid_amount_cents, "Payment recorded");
        Ok(stay.clone())
    }

    /// Moves the check-out date and re-validates the new range against every
    /// other stay and block on the same room.
    pub fn extend_stay(
        &mut self,
        stay_id: &str,
        new_check_out: NaiveDate,
        override_out_of_order: bool,
    ) -> CoreResult<Stay> {
        let (room_idx, stay_idx) = self.locate(stay_id)?;
        let room = &mut self.rooms[room_idx];
        let check_in = room.stays[stay_idx].check_in;

        validate_stay_dates(check_in, new_check_out)?;
        check_room_conflicts(
            room,
            Some(stay_id),
            check_in,
            new_check_out,
            override_out_of_order,
        )?;

        let stay = &mut room.stays[stay_idx];
        stay.check_out = new_check_out;
        info!(stay_id = %stay_id, check_out = %new_check_out, "Stay extended");
        Ok(stay.clone())
    }

    // -------------------------------------------------------------------------
    // Groups
    // -------------------------------------------------------------------------

    /// Clubs stays into one billing unit under `master_id`.
    ///
    /// The master points to itself. Re-clubbing stays already in this group
    /// is a no-op for them. Nothing changes unless every stay qualifies.
    ///
    /// ## Errors
    /// - `StayNotFound`: master is not an active stay
    /// - `InvalidGroup`: a member is missing, or already belongs to another group
    pub fn club_stays(&mut self, master_id: &str, member_ids: &[&str]) -> CoreResult<Vec<String>> {
        let master = self
            .find_stay(master_id)
            .map(|(_, s)| s)
            .ok_or_else(|| CoreError::StayNotFound(master_id.to_string()))?;
        check_group_membership(master, master_id)?;

        let mut ids: Vec<String> = vec![master_id.to_string()];
        let mut seen: HashSet<&str> = HashSet::from([master_id]);
        for &member_id in member_ids {
            if !seen.insert(member_id) {
                continue;
            }
            let member = self
                .find_stay(member_id)
                .map(|(_, s)| s)
                .ok_or_else(|| CoreError::InvalidGroup {
                    stay_id: member_id.to_string(),
                    reason: "not an active stay".to_string(),
                })?;
            check_group_membership(member, master_id)?;
            ids.push(member_id.to_string());
        }

        for stay in self.rooms.iter_mut().flat_map(|r| r.stays.iter_mut()) {
            if ids.iter().any(|id| *id == stay.id) {
                stay.is_group_booking = true;
                stay.group_master_stay_id = Some(master_id.to_string());
            }
        }

        info!(master = %master_id, members = ids.len(), "Stays clubbed");
        Ok(ids)
    }

    // -------------------------------------------------------------------------
    // Closing
    // -------------------------------------------------------------------------

    /// Checks out a `CheckedIn` stay and archives it.
    ///
    /// Calling this again for the same stay returns
    /// [`Closure::AlreadyCheckedOut`] and leaves the archive untouched.
    pub fn check_out_stay(
        &mut self,
        stay_id: &str,
        services: &mut ServiceLedger,
        archive: &mut dyn CheckoutArchive,
    ) -> CoreResult<Closure> {
        self.close(stay_id, StayStatus::CheckedOut, services, archive)
    }

    /// Cancels a `Reserved` or `CheckedIn` stay and archives it.
    pub fn cancel_stay(
        &mut self,
        stay_id: &str,
        services: &mut ServiceLedger,
        archive: &mut dyn CheckoutArchive,
    ) -> CoreResult<Closure> {
        self.close(stay_id, StayStatus::Cancelled, services, archive)
    }

    fn close(
        &mut self,
        stay_id: &str,
        target: StayStatus,
        services: &mut ServiceLedger,
        archive: &mut dyn CheckoutArchive,
    ) -> CoreResult<Closure> {
        if self.closed.contains_key(stay_id) {
            debug!(stay_id = %stay_id, "Stay already closed");
            return Ok(Closure::AlreadyCheckedOut);
        }

        let (room_idx, stay_idx) = self.locate(stay_id)?;
        let room = &mut self.rooms[room_idx];

        // Loaded data can carry stays already closed elsewhere.
        let current = room.stays[stay_idx].status;
        if current.is_terminal() {
            debug!(stay_id = %stay_id, status = %current, "Loaded stay already closed");
            self.closed.insert(stay_id.to_string(), current);
            return Ok(Closure::AlreadyCheckedOut);
        }
        transition(&mut room.stays[stay_idx], target)?;

        let stay = room.stays.remove(stay_idx);
        let record = CheckoutRecord {
            room_id: room.id.clone(),
            room_number: room.number.clone(),
            final_status: target,
            service_requests: services.take_for_stay(stay_id),
            archived_at: self.clock.now(),
            stay,
        };

        info!(
            stay_id = %stay_id,
            room = %record.room_number,
            status = %target,
            requests = record.service_requests.len(),
            "Stay archived"
        );
        archive.archive(record);
        self.closed.insert(stay_id.to_string(), target);

        Ok(Closure::Archived {
            stay_id: stay_id.to_string(),
            status: target,
        })
    }

    // -------------------------------------------------------------------------
    // Maintenance Blocks
    // -------------------------------------------------------------------------

    /// Takes a room out of order for an inclusive date range.
    ///
    /// Rejected with `Overlap` when any active stay sleeps in the room during
    /// the range. Stays are never displaced.
    pub fn mark_out_of_order(
        &mut self,
        room_id: &str,
        range: DateRange,
        reason: Option<String>,
    ) -> CoreResult<OutOfOrderBlock> {
        validate_block_dates(range.start, range.end)?;
        let room = self.room_mut(room_id)?;

        let block = OutOfOrderBlock {
            id: Uuid::new_v4().to_string(),
            from: range.start,
            to: range.end,
            reason,
        };

        if let Some(stay) = room
            .active_stays()
            .find(|s| s.overlaps_block(&block))
        {
            return Err(CoreError::Overlap {
                room_number: room.number.clone(),
                from: range.start,
                to: range.end,
                conflict: Conflict::Stay(stay.id.clone()).to_string(),
            });
        }

        info!(room = %room.number, range = %range, "Room marked out of order");
        room.out_of_order.push(block.clone());
        Ok(block)
    }

    /// Removes a maintenance block.
    pub fn clear_out_of_order(&mut self, room_id: &str, block_id: &str) -> CoreResult<OutOfOrderBlock> {
        let room = self.room_mut(room_id)?;
        let idx = room
            .out_of_order
            .iter()
            .position(|b| b.id == block_id)
            .ok_or_else(|| CoreError::BlockNotFound {
                room_id: room_id.to_string(),
                block_id: block_id.to_string(),
            })?;

        info!(room = %room.number, block_id = %block_id, "Out-of-order block cleared");
        Ok(room.out_of_order.remove(idx))
    }

    // -------------------------------------------------------------------------
    // Data Quality
    // -------------------------------------------------------------------------

    /// Reports same-room conflicts already present in the loaded data.
    ///
    /// Nothing is rejected or repaired; each conflict is logged and returned.
    pub fn overlap_warnings(&self) -> Vec<OverlapWarning> {
        let mut warnings = Vec::new();

        for room in &self.rooms {
            let active: Vec<&Stay> = room.active_stays().collect();

            for (i, stay) in active.iter().enumerate() {
                for other in &active[i + 1..] {
                    if stay.overlaps_dates(other.check_in, other.check_out) {
                        warnings.push(OverlapWarning {
                            room_id: room.id.clone(),
                            room_number: room.number.clone(),
                            stay_id: stay.id.clone(),
                            conflict: Conflict::Stay(other.id.clone()),
                        });
                    }
                }
                for block in &room.out_of_order {
                    if stay.overlaps_block(block) {
                        warnings.push(OverlapWarning {
                            room_id: room.id.clone(),
                            room_number: room.number.clone(),
                            stay_id: stay.id.clone(),
                            conflict: Conflict::Block(block.id.clone()),
                        });
                    }
                }
            }
        }

        for w in &warnings {
            warn!(room = %w.room_number, stay_id = %w.stay_id, conflict = %w.conflict, "Overlapping booking in loaded data");
        }
        warnings
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn room_mut(&mut self, room_id: &str) -> CoreResult<&mut Room> {
        self.rooms
            .iter_mut()
            .find(|r| r.id == room_id)
            .ok_or_else(|| CoreError::RoomNotFound(room_id.to_string()))
    }

    fn locate(&self, stay_id: &str) -> CoreResult<(usize, usize)> {
        self.rooms
            .iter()
            .enumerate()
            .find_map(|(ri, room)| {
                room.stays
                    .iter()
                    .position(|s| s.id == stay_id)
                    .map(|si| (ri, si))
            })
            .ok_or_else(|| CoreError::StayNotFound(stay_id.to_string()))
    }

    fn stay_mut(&mut self, stay_id: &str) -> CoreResult<&mut Stay> {
        let (ri, si) = self.locate(stay_id)?;
        Ok(&mut self.rooms[ri].stays[si])
    }
}

/// Rejects `[check_in, check_out)` if it meets another active stay, or a
/// block unless overridden. `skip` excludes the stay being edited.
fn check_room_conflicts(
    room: &Room,
    skip: Option<&str>,
    check_in: NaiveDate,
    check_out: NaiveDate,
    override_out_of_order: bool,
) -> CoreResult<()> {
    let overlap = |conflict: Conflict| CoreError::Overlap {
        room_number: room.number.clone(),
        from: check_in,
        to: check_out,
        conflict: conflict.to_string(),
    };

    if let Some(other) = room
        .active_stays()
        .filter(|s| Some(s.id.as_str()) != skip)
        .find(|s| s.overlaps_dates(check_in, check_out))
    {
        return Err(overlap(Conflict::Stay(other.id.clone())));
    }

    if let Some(block) = room
        .out_of_order
        .iter()
        .find(|b| b.blocks(check_in, check_out))
    {
        if !override_out_of_order {
            return Err(overlap(Conflict::Block(block.id.clone())));
        }
        warn!(
            room = %room.number,
            block_id = %block.id,
            check_in = %check_in,
            check_out = %check_out,
            "Booking over out-of-order block by override"
        );
    }

    Ok(())
}

fn check_group_membership(stay: &Stay, master_id: &str) -> CoreResult<()> {
    match stay.group_master_stay_id.as_deref() {
        Some(existing) if existing != master_id => Err(CoreError::InvalidGroup {
            stay_id: stay.id.clone(),
            reason: format!("already clubbed under {}", existing),
        }),
        _ => Ok(()),
    }
}

fn transition(stay: &mut Stay, next: StayStatus) -> CoreResult<()> {
    if !stay.status.can_transition_to(next) {
        return Err(CoreError::InvalidTransition {
            entity: "Stay",
            id: stay.id.clone(),
            from: stay.status.to_string(),
            to: next.to_string(),
        });
    }
    stay.status = next;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
