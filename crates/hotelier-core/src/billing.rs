//! # Billing Aggregator
//!
//! Derives a stay's (or clubbed group's) outstanding balance from the current
//! snapshot. Pure: the same inputs always give the same [`BillSummary`], and
//! nothing is mutated. Callers re-run it whenever any input changes.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Resolve group   stay grouped? ──► every stay sharing the master     │
//! │                                  └──► otherwise just {stay}             │
//! │                                                                         │
//! │  2. Room charges    Σ room_charge × max(1, nights)                      │
//! │  3. Services        Σ price of requests whose stay is in the group      │
//! │  4. Subtotal        room charges + services                             │
//! │                                                                         │
//! │  5. Fees            service charge = subtotal × rate                    │
//! │                     GST            = subtotal × rate   (not compounded) │
//! │                                                                         │
//! │  6. Total           subtotal + service charge + GST                     │
//! │  7. Balance         total − Σ paid                                      │
//! │                                                                         │
//! │  Example: $100 × 2 nights + $20 service, SC 5%, GST 10%, paid $50       │
//! │    subtotal $220, SC $11, GST $22, total $253, balance $203             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Room, ServiceRequest, Settings, Stay};

/// Snapshot the aggregator reads from.
#[derive(Debug, Clone, Copy)]
pub struct BillingContext<'a> {
    pub rooms: &'a [Room],
    pub service_requests: &'a [ServiceRequest],
    pub settings: Settings,
}

impl<'a> BillingContext<'a> {
    pub fn new(rooms: &'a [Room], service_requests: &'a [ServiceRequest], settings: Settings) -> Self {
        BillingContext {
            rooms,
            service_requests,
            settings,
        }
    }

    /// Finds a stay and its room in the snapshot.
    pub fn find_stay(&self, stay_id: &str) -> Option<(&'a Room, &'a Stay)> {
        self.rooms
            .iter()
            .find_map(|room| room.stay(stay_id).map(|stay| (room, stay)))
    }

    /// Bill for a stay looked up by id; empty when the stay is unknown.
    pub fn bill_for(&self, stay_id: &str) -> BillSummary {
        match self.find_stay(stay_id) {
            Some((room, stay)) => get_bill_summary(Some(stay), Some(room), self),
            None => BillSummary::empty(),
        }
    }

    /// Bill for a whole group, addressed by its master stay id.
    pub fn group_bill(&self, master_id: &str) -> BillSummary {
        let member = self
            .rooms
            .iter()
            .flat_map(|room| room.stays.iter().map(move |stay| (room, stay)))
            .find(|(_, stay)| stay.group_master_stay_id.as_deref() == Some(master_id));

        match member {
            Some((room, stay)) => get_bill_summary(Some(stay), Some(room), self),
            None => self.bill_for(master_id),
        }
    }
}

/// Folio breakdown. `current_balance` is what the guest still owes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillSummary {
    /// Stays billed together (one entry unless clubbed).
    pub group_stay_ids: Vec<String>,
    pub nights: i64,
    pub total_room_charge: Money,
    pub total_services_charge: Money,
    pub subtotal: Money,
    pub service_charge_amount: Money,
    pub gst_amount: Money,
    pub total_with_taxes: Money,
    pub total_paid: Money,
    pub current_balance: Money,
}

impl BillSummary {
    /// All-zero summary returned when there is nothing to bill.
    pub fn empty() -> Self {
        BillSummary::default()
    }
}

/// Computes the bill for a stay, or for its whole group when clubbed.
///
/// An absent `stay` or `room` yields [`BillSummary::empty`] rather than an
/// error.
///
/// ## Example
/// ```rust
/// use hotelier_core::billing::{get_bill_summary, BillingContext};
/// use hotelier_core::types::{Room, Settings};
///
/// let rooms: Vec<Room> = Vec::new();
/// let ctx = BillingContext::new(&rooms, &[], Settings::default());
/// let bill = get_bill_summary(None, None, &ctx);
/// assert!(bill.current_balance.is_zero());
/// ```
pub fn get_bill_summary(stay: Option<&Stay>, room: Option<&Room>, ctx: &BillingContext<'_>) -> BillSummary {
    let (stay, _room) = match (stay, room) {
        (Some(stay), Some(room)) => (stay, room),
        _ => return BillSummary::empty(),
    };

    let group = resolve_group(stay, ctx.rooms);
    let ids: HashSet<&str> = group.iter().map(|s| s.id.as_str()).collect();

    let nights: i64 = group.iter().map(|s| s.nights()).sum();
    let total_room_charge: Money = group.iter().map(|s| s.total_room_charge()).sum();
    let total_services_charge: Money = ctx
        .service_requests
        .iter()
        .filter(|r| ids.contains(r.stay_id.as_str()))
        .map(|r| r.price())
        .sum();

    let subtotal = total_room_charge + total_services_charge;
    let service_charge_amount = subtotal.percentage_of(ctx.settings.service_charge_rate);
    let gst_amount = subtotal.percentage_of(ctx.settings.gst_rate);
    let total_with_taxes = subtotal + service_charge_amount + gst_amount;
    let total_paid: Money = group.iter().map(|s| s.paid_amount()).sum();

    BillSummary {
        group_stay_ids: group.iter().map(|s| s.id.clone()).collect(),
        nights,
        total_room_charge,
        total_services_charge,
        subtotal,
        service_charge_amount,
        gst_amount,
        total_with_taxes,
        total_paid,
        current_balance: total_with_taxes - total_paid,
    }
}

/// Every stay across all rooms sharing the stay's master, or just the stay.
fn resolve_group<'a>(stay: &'a Stay, rooms: &'a [Room]) -> Vec<&'a Stay> {
    let master = match (&stay.group_master_stay_id, stay.is_group_booking) {
        (Some(master), true) => master,
        _ => return vec![stay],
    };

    let mut group: Vec<&Stay> = rooms
        .iter()
        .flat_map(|r| r.stays.iter())
        .filter(|s| s.group_master_stay_id.as_ref() == Some(master))
        .collect();

    if !group.iter().any(|s| s.id == stay.id) {
        group.push(stay);
    }
    group
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::FeeRate;
    use crate::types::{GuestInfo, ServiceStatus, StayStatus};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn stay(id: &str, room_id: &str, nights: u32, charge: i64, paid: i64) -> Stay {
        Stay {
            id: id.to_string(),
            room_id: room_id.to_string(),
            guest: GuestInfo::named("Guest"),
            check_in: d(1),
            check_out: d(1 + nights),
            room_charge_cents: charge,
            paid_amount_cents: paid,
            is_group_booking: false,
            group_master_stay_id: None,
            status: StayStatus::CheckedIn,
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap(),
        }
    }

    fn request(id: &str, stay_id: &str, price: Option<i64>) -> ServiceRequest {
        ServiceRequest {
            id: id.to_string(),
            hotel_id: "h".to_string(),
            stay_id: stay_id.to_string(),
            room_number: "101".to_string(),
            service_name: "Laundry".to_string(),
            price_cents: price,
            status: ServiceStatus::Pending,
            assigned_to: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 13, 0, 0).unwrap(),
            completed_at: None,
        }
    }

    fn room_with(id: &str, stays: Vec<Stay>) -> Room {
        let mut room = Room::new(id, "h", id, "Deluxe");
        room.stays = stays;
        room
    }

    fn settings() -> Settings {
        Settings {
            gst_rate: FeeRate::from_bps(1000),
            service_charge_rate: FeeRate::from_bps(500),
        }
    }

    #[test]
    fn test_worked_example() {
        let rooms = vec![room_with("101", vec![stay("s-1", "101", 2, 10_000, 5_000)])];
        let requests = vec![request("q-1", "s-1", Some(2_000))];
        let ctx = BillingContext::new(&rooms, &requests, settings());

        let bill = ctx.bill_for("s-1");
        assert_eq!(bill.nights, 2);
        assert_eq!(bill.subtotal.cents(), 22_000);
        assert_eq!(bill.service_charge_amount.cents(), 1_100);
        assert_eq!(bill.gst_amount.cents(), 2_200);
        assert_eq!(bill.total_with_taxes.cents(), 25_300);
        assert_eq!(bill.total_paid.cents(), 5_000);
        assert_eq!(bill.current_balance.cents(), 20_300);
    }

    #[test]
    fn test_absent_inputs_give_zero_balance() {
        let rooms = vec![room_with("101", vec![stay("s-1", "101", 2, 10_000, 0)])];
        let ctx = BillingContext::new(&rooms, &[], settings());
        let s = &rooms[0].stays[0];

        assert_eq!(get_bill_summary(None, Some(&rooms[0]), &ctx), BillSummary::empty());
        assert_eq!(get_bill_summary(Some(s), None, &ctx), BillSummary::empty());
        assert!(ctx.bill_for("ghost").current_balance.is_zero());
    }

    #[test]
    fn test_same_day_stay_bills_one_night() {
        let rooms = vec![room_with("101", vec![stay("s-1", "101", 0, 10_000, 0)])];
        let ctx = BillingContext::new(&rooms, &[], Settings::default());
        let bill = ctx.bill_for("s-1");
        assert_eq!(bill.nights, 1);
        assert_eq!(bill.current_balance.cents(), 10_000);
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let rooms = vec![room_with("101", vec![stay("s-1", "101", 1, 10_000, 0)])];
        let requests = vec![request("q-1", "s-1", None)];
        let ctx = BillingContext::new(&rooms, &requests, Settings::default());
        assert_eq!(ctx.bill_for("s-1").total_services_charge, Money::zero());
    }

    #[test]
    fn test_additive_in_service_price() {
        let rooms = vec![room_with("101", vec![stay("s-1", "101", 2, 10_000, 5_000)])];
        let mut requests = vec![request("q-1", "s-1", Some(2_000))];

        let before = BillingContext::new(&rooms, &requests, settings()).bill_for("s-1");
        requests.push(request("q-2", "s-1", Some(4_000)));
        let after = BillingContext::new(&rooms, &requests, settings()).bill_for("s-1");

        // 4000 × (1 + 0.05 + 0.10)
        assert_eq!(
            (after.current_balance - before.current_balance).cents(),
            4_600
        );
    }

    #[test]
    fn test_clubbed_stays_bill_as_one() {
        let mut a = stay("s-a", "101", 2, 10_000, 5_000);
        let mut b = stay("s-b", "102", 1, 15_000, 1_000);
        for s in [&mut a, &mut b] {
            s.is_group_booking = true;
            s.group_master_stay_id = Some("s-a".to_string());
        }
        let rooms = vec![room_with("101", vec![a]), room_with("102", vec![b])];
        let requests = vec![
            request("q-1", "s-a", Some(2_000)),
            request("q-2", "s-b", Some(1_000)),
        ];
        let ctx = BillingContext::new(&rooms, &requests, settings());

        let via_a = ctx.bill_for("s-a");
        let via_b = ctx.bill_for("s-b");
        assert_eq!(via_a.current_balance, via_b.current_balance);
        assert_eq!(ctx.group_bill("s-a").current_balance, via_a.current_balance);

        // one combined stay: 35000 room + 3000 services, 6000 paid
        let combined = vec![room_with("101", vec![stay("c", "101", 1, 35_000, 6_000)])];
        let combined_requests = vec![request("q", "c", Some(3_000))];
        let expected = BillingContext::new(&combined, &combined_requests, settings()).bill_for("c");
        assert_eq!(via_a.current_balance, expected.current_balance);
        assert_eq!(via_a.group_stay_ids.len(), 2);
    }

    #[test]
    fn test_is_deterministic() {
        let rooms = vec![room_with("101", vec![stay("s-1", "101", 3, 12_345, 999)])];
        let requests = vec![request("q-1", "s-1", Some(777))];
        let ctx = BillingContext::new(&rooms, &requests, settings());
        assert_eq!(ctx.bill_for("s-1"), ctx.bill_for("s-1"));
    }
}
