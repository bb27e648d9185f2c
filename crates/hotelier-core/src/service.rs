//! # Service Request Ledger
//!
//! Append-mostly log of guest service requests, each scoped to a stay.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open_request ──► Pending ──► InProgress ──► Completed                 │
//! │                       │                          ▲                      │
//! │                       └──────────────────────────┘  (skip allowed)      │
//! │                                                                         │
//! │   Completed stamps `completed_at`. Nothing moves backwards.             │
//! │                                                                         │
//! │   Stay closes ──► take_for_stay ──► CheckoutRecord (immutable)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{ServiceRequest, ServiceStatus};
use crate::validation::{validate_charge_cents, validate_label};

/// Input for [`ServiceLedger::open_request`].
#[derive(Debug, Clone)]
pub struct NewServiceRequest {
    pub stay_id: String,
    pub room_number: String,
    pub service_name: String,
    pub price_cents: Option<i64>,
    pub assigned_to: Option<String>,
}

/// In-memory ledger of open service requests for one hotel.
pub struct ServiceLedger {
    hotel_id: String,
    requests: Vec<ServiceRequest>,
    clock: Arc<dyn Clock>,
}

impl ServiceLedger {
    pub fn new(hotel_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        ServiceLedger {
            hotel_id: hotel_id.into(),
            requests: Vec::new(),
            clock,
        }
    }

    /// Builds a ledger from records loaded upstream.
    pub fn from_requests(
        hotel_id: impl Into<String>,
        requests: Vec<ServiceRequest>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ServiceLedger {
            hotel_id: hotel_id.into(),
            requests,
            clock,
        }
    }

    /// All open requests in insertion order.
    pub fn requests(&self) -> &[ServiceRequest] {
        &self.requests
    }

    pub fn get(&self, id: &str) -> Option<&ServiceRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Opens a new `Pending` request stamped with the current time.
    pub fn open_request(&mut self, new: NewServiceRequest) -> CoreResult<ServiceRequest> {
        validate_label("service name", &new.service_name)?;
        if let Some(price) = new.price_cents {
            validate_charge_cents("price", price)?;
        }

        let request = ServiceRequest {
            id: Uuid::new_v4().to_string(),
            hotel_id: self.hotel_id.clone(),
            stay_id: new.stay_id,
            room_number: new.room_number,
            service_name: new.service_name.trim().to_string(),
            price_cents: new.price_cents,
            status: ServiceStatus::Pending,
            assigned_to: new.assigned_to,
            created_at: self.clock.now(),
            completed_at: None,
        };

        debug!(request_id = %request.id, stay_id = %request.stay_id, "Opened service request");
        self.requests.push(request.clone());
        Ok(request)
    }

    /// Inserts or replaces a request by id (upstream changes).
    pub fn upsert(&mut self, request: ServiceRequest) {
        match self.requests.iter_mut().find(|r| r.id == request.id) {
            Some(existing) => *existing = request,
            None => self.requests.push(request),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<ServiceRequest> {
        let idx = self.requests.iter().position(|r| r.id == id)?;
        Some(self.requests.remove(idx))
    }

    /// Moves a request forward.
    ///
    /// ## Rules
    /// - Same status: no-op
    /// - Backwards (including out of `Completed`): `InvalidTransition`
    /// - Entering `Completed` stamps `completed_at`
    pub fn transition(&mut self, id: &str, next: ServiceStatus) -> CoreResult<ServiceRequest> {
        let now = self.clock.now();
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::ServiceRequestNotFound(id.to_string()))?;

        if request.status == next {
            return Ok(request.clone());
        }

        if !request.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                entity: "Service request",
                id: id.to_string(),
                from: request.status.to_string(),
                to: next.to_string(),
            });
        }

        request.status = next;
        if next == ServiceStatus::Completed {
            request.completed_at = Some(now);
        }

        debug!(request_id = %id, status = %next, "Service request transitioned");
        Ok(request.clone())
    }

    /// Pending requests, oldest first.
    pub fn pending_queue(&self) -> Vec<&ServiceRequest> {
        let mut pending: Vec<&ServiceRequest> = self
            .requests
            .iter()
            .filter(|r| r.status == ServiceStatus::Pending)
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        pending
    }

    /// Requests belonging to any of the given stays.
    pub fn for_stays(&self, stay_ids: &HashSet<&str>) -> Vec<&ServiceRequest> {
        self.requests
            .iter()
            .filter(|r| stay_ids.contains(r.stay_id.as_str()))
            .collect()
    }

    /// Sum of prices for the given stays (missing price counts as zero).
    pub fn charges_for_stays(&self, stay_ids: &HashSet<&str>) -> Money {
        self.for_stays(stay_ids).into_iter().map(|r| r.price()).sum()
    }

    /// Removes and returns every request of a stay. Used when the stay is
    /// archived; the requests leave the ledger with it.
    pub fn take_for_stay(&mut self, stay_id: &str) -> Vec<ServiceRequest> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.requests)
            .into_iter()
            .partition(|r| r.stay_id == stay_id);
        self.requests = kept;
        taken
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, NaiveDate};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()))
    }

    fn new_request(stay_id: &str, price: Option<i64>) -> NewServiceRequest {
        NewServiceRequest {
            stay_id: stay_id.to_string(),
            room_number: "101".to_string(),
            service_name: "Laundry".to_string(),
            price_cents: price,
            assigned_to: Some("Housekeeping".to_string()),
        }
    }

    #[test]
    fn test_open_request_is_pending() {
        let mut ledger = ServiceLedger::new("h", clock());
        let req = ledger.open_request(new_request("s-1", Some(2000))).unwrap();
        assert_eq!(req.status, ServiceStatus::Pending);
        assert!(req.completed_at.is_none());
        assert_eq!(ledger.requests().len(), 1);
    }

    #[test]
    fn test_open_request_rejects_negative_price() {
        let mut ledger = ServiceLedger::new("h", clock());
        assert!(ledger.open_request(new_request("s-1", Some(-1))).is_err());
    }

    #[test]
    fn test_completion_stamps_timestamp() {
        let mut ledger = ServiceLedger::new("h", clock());
        let req = ledger.open_request(new_request("s-1", None)).unwrap();

        let req = ledger.transition(&req.id, ServiceStatus::InProgress).unwrap();
        assert!(req.completed_at.is_none());

        let req = ledger.transition(&req.id, ServiceStatus::Completed).unwrap();
        assert!(req.completed_at.is_some());
    }

    #[test]
    fn test_no_backward_transition() {
        let mut ledger = ServiceLedger::new("h", clock());
        let req = ledger.open_request(new_request("s-1", None)).unwrap();
        ledger.transition(&req.id, ServiceStatus::Completed).unwrap();

        let err = ledger
            .transition(&req.id, ServiceStatus::InProgress)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        // same status is a no-op, not an error
        assert!(ledger.transition(&req.id, ServiceStatus::Completed).is_ok());
    }

    #[test]
    fn test_pending_queue_oldest_first() {
        let base = clock().now();
        let mut ledger = ServiceLedger::new("h", clock());
        for (id, offset) in [("late", 30), ("early", 0), ("middle", 10)] {
            ledger.upsert(ServiceRequest {
                id: id.to_string(),
                hotel_id: "h".to_string(),
                stay_id: "s-1".to_string(),
                room_number: "101".to_string(),
                service_name: "Towels".to_string(),
                price_cents: None,
                status: ServiceStatus::Pending,
                assigned_to: None,
                created_at: base + Duration::minutes(offset),
                completed_at: None,
            });
        }
        ledger.transition("middle", ServiceStatus::InProgress).unwrap();

        let queue: Vec<&str> = ledger.pending_queue().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(queue, vec!["early", "late"]);
    }

    #[test]
    fn test_take_for_stay_and_charges() {
        let mut ledger = ServiceLedger::new("h", clock());
        ledger.open_request(new_request("s-1", Some(2000))).unwrap();
        ledger.open_request(new_request("s-1", None)).unwrap();
        ledger.open_request(new_request("s-2", Some(500))).unwrap();

        let ids: HashSet<&str> = ["s-1", "s-2"].into_iter().collect();
        assert_eq!(ledger.charges_for_stays(&ids).cents(), 2500);

        let taken = ledger.take_for_stay("s-1");
        assert_eq!(taken.len(), 2);
        assert_eq!(ledger.requests().len(), 1);
        assert_eq!(ledger.requests()[0].stay_id, "s-2");
    }
}
