//! # Occupancy Analytics
//!
//! Per-day occupancy over a date range, computed wholesale from a snapshot of
//! rooms. Never patched incrementally.
//!
//! ## Per-Day Rule
//! ```text
//!   day d counts a room as occupied when
//!     • a stay covers d            (check_in <= d < check_out), or
//!     • an out-of-order block covers d  (from <= d <= to)
//!
//!   percent(d) = occupied / total rooms × 100   (0 when there are no rooms)
//! ```

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::clock::Clock;
use crate::types::{DateRange, Room};

/// Occupancy for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OccupancyPoint {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub occupancy_percent: f64,
}

/// Series plus summary figures for a dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OccupancyReport {
    pub series: Vec<OccupancyPoint>,
    pub label: String,
    /// Mean of the series (0 when empty).
    pub average_percent: f64,
    /// Busiest day; the earliest one wins ties.
    pub peak: Option<OccupancyPoint>,
}

/// Computes occupancy for every day of `range` (inclusive).
///
/// Empty `rooms` gives 0% for every day; a reversed range gives an empty
/// series.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use hotelier_core::occupancy::compute_occupancy;
/// use hotelier_core::types::DateRange;
///
/// let day = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
/// let report = compute_occupancy(&[], &DateRange::single(day));
/// assert_eq!(report.series[0].occupancy_percent, 0.0);
/// ```
pub fn compute_occupancy(rooms: &[Room], range: &DateRange) -> OccupancyReport {
    build_report(rooms, range, range.to_string())
}

fn build_report(rooms: &[Room], range: &DateRange, label: String) -> OccupancyReport {
    let total = rooms.len();

    let series: Vec<OccupancyPoint> = range
        .days()
        .map(|date| {
            let occupied = rooms.iter().filter(|r| r.is_occupied_on(date)).count();
            let occupancy_percent = if total > 0 {
                occupied as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            OccupancyPoint {
                date,
                occupancy_percent,
            }
        })
        .collect();

    let average_percent = if series.is_empty() {
        0.0
    } else {
        series.iter().map(|p| p.occupancy_percent).sum::<f64>() / series.len() as f64
    };

    let peak = series.iter().copied().fold(None, |best: Option<OccupancyPoint>, p| match best {
        Some(b) if b.occupancy_percent >= p.occupancy_percent => Some(b),
        _ => Some(p),
    });

    OccupancyReport {
        series,
        label,
        average_percent,
        peak,
    }
}

/// Preset windows offered on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyWindow {
    Last7Days,
    Last30Days,
    Next7Days,
    Custom(DateRange),
}

impl OccupancyWindow {
    /// Resolves the window against today's date.
    pub fn resolve(&self, clock: &dyn Clock) -> DateRange {
        let today = clock.today();
        match self {
            OccupancyWindow::Last7Days => DateRange::new(today - Duration::days(6), today),
            OccupancyWindow::Last30Days => DateRange::new(today - Duration::days(29), today),
            OccupancyWindow::Next7Days => DateRange::new(today, today + Duration::days(6)),
            OccupancyWindow::Custom(range) => *range,
        }
    }

    pub fn label(&self) -> String {
        match self {
            OccupancyWindow::Last7Days => "Last 7 days".to_string(),
            OccupancyWindow::Last30Days => "Last 30 days".to_string(),
            OccupancyWindow::Next7Days => "Next 7 days".to_string(),
            OccupancyWindow::Custom(range) => range.to_string(),
        }
    }

    /// Resolves the window and computes the report for it.
    pub fn compute(&self, rooms: &[Room], clock: &dyn Clock) -> OccupancyReport {
        build_report(rooms, &self.resolve(clock), self.label())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::types::{GuestInfo, OutOfOrderBlock, Stay, StayStatus};
    use chrono::Utc;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn room_with_stay(id: &str, check_in: u32, check_out: u32) -> Room {
        let mut room = Room::new(id, "h", id, "Std");
        room.stays.push(Stay {
            id: format!("s-{}", id),
            room_id: id.to_string(),
            guest: GuestInfo::named("Guest"),
            check_in: d(check_in),
            check_out: d(check_out),
            room_charge_cents: 10_000,
            paid_amount_cents: 0,
            is_group_booking: false,
            group_master_stay_id: None,
            status: StayStatus::CheckedIn,
            created_at: Utc::now(),
        });
        room
    }

    fn percents(report: &OccupancyReport) -> Vec<f64> {
        report.series.iter().map(|p| p.occupancy_percent).collect()
    }

    #[test]
    fn test_empty_rooms_zero_every_day() {
        let report = compute_occupancy(&[], &DateRange::new(d(1), d(5)));
        assert_eq!(report.series.len(), 5);
        assert!(report.series.iter().all(|p| p.occupancy_percent == 0.0));
        assert_eq!(report.average_percent, 0.0);
    }

    #[test]
    fn test_checkout_day_not_counted() {
        let rooms = vec![room_with_stay("101", 1, 3), Room::new("102", "h", "102", "Std")];
        let report = compute_occupancy(&rooms, &DateRange::new(d(1), d(3)));
        assert_eq!(percents(&report), vec![50.0, 50.0, 0.0]);
        assert_eq!(report.label, "2026-10-01 to 2026-10-03");
    }

    #[test]
    fn test_out_of_order_counts_as_occupied() {
        let mut room = Room::new("101", "h", "101", "Std");
        room.out_of_order.push(OutOfOrderBlock {
            id: "b".to_string(),
            from: d(2),
            to: d(3),
            reason: None,
        });
        let report = compute_occupancy(&[room], &DateRange::new(d(1), d(4)));
        assert_eq!(percents(&report), vec![0.0, 100.0, 100.0, 0.0]);
    }

    #[test]
    fn test_closed_stays_not_counted() {
        let mut cancelled = room_with_stay("101", 1, 3);
        cancelled.stays[0].status = StayStatus::Cancelled;
        let mut departed = room_with_stay("102", 1, 3);
        departed.stays[0].status = StayStatus::CheckedOut;

        let report = compute_occupancy(&[cancelled, departed], &DateRange::new(d(1), d(2)));
        assert_eq!(percents(&report), vec![0.0, 0.0]);
        assert_eq!(report.average_percent, 0.0);
    }

    #[test]
    fn test_peak_and_average() {
        let rooms = vec![room_with_stay("101", 1, 3), room_with_stay("102", 2, 3)];
        let report = compute_occupancy(&rooms, &DateRange::new(d(1), d(4)));
        assert_eq!(percents(&report), vec![50.0, 100.0, 0.0, 0.0]);
        assert_eq!(report.peak.unwrap().date, d(2));
        assert_eq!(report.average_percent, 37.5);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let rooms = vec![room_with_stay("101", 1, 3)];
        let report = compute_occupancy(&rooms, &DateRange::new(d(5), d(1)));
        assert!(report.series.is_empty());
        assert!(report.peak.is_none());
    }

    #[test]
    fn test_windows_resolve_against_clock() {
        let clock = FixedClock::on(d(16));
        assert_eq!(
            OccupancyWindow::Last7Days.resolve(&clock),
            DateRange::new(d(10), d(16))
        );
        assert_eq!(
            OccupancyWindow::Next7Days.resolve(&clock),
            DateRange::new(d(16), d(22))
        );

        let report = OccupancyWindow::Last30Days.compute(&[], &clock);
        assert_eq!(report.series.len(), 30);
        assert_eq!(report.label, "Last 30 days");
    }
}
