//! # Hotel Store
//!
//! Snapshot of one hotel's records, kept current by the change feed. Every
//! read recomputes from the snapshot; nothing is patched incrementally.
//!
//! ## Readiness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Status(disconnected) ──► every read fails with Disconnected           │
//! │   Lagged(n)            ──► every collection marked stale                │
//! │   Snapshot(c)          ──► collection c replaced and marked hydrated    │
//! │   Changes(c)           ──► records in c upserted / removed              │
//! │                                                                         │
//! │   read ─► connected? ─► needed collections hydrated? ─► compute         │
//! │              │                    │                                     │
//! │              ▼                    ▼                                     │
//! │         Disconnected         NotHydrated                                │
//! │                                                                         │
//! │   Callers show a degraded state on either error; nothing is computed   │
//! │   against an empty or stale snapshot.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::feed::{FeedEvent, Subscription};
use crate::inbound::{
    decode_all, decode_checkout, decode_inventory_item, decode_room, decode_service_request,
    decode_settings, decode_stock_movement,
};
use crate::error::{SyncError, SyncResult};
use crate::protocol::{Collection, Document, DocumentChange, FeedMessage, FeedStatus};
use hotelier_core::{
    compute_occupancy, BillSummary, BillingContext, CheckoutRecord, Clock, DateRange,
    InventoryItem, InventoryLedger, NegativeStockPolicy, OccupancyReport, OccupancyWindow,
    OverlapWarning, Room, RoomBook, ServiceLedger, ServiceRequest, Settings, StayStatus,
    StockAlert, StockMovement,
};

/// One checked-in guest's running folio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folio {
    pub room_number: String,
    pub stay_id: String,
    pub guest_name: String,
    pub bill: BillSummary,
}

#[derive(Debug)]
struct StoreState {
    connected: bool,
    hydrated: HashSet<Collection>,
    rooms: Vec<Room>,
    service_requests: Vec<ServiceRequest>,
    items: Vec<InventoryItem>,
    movements: Vec<StockMovement>,
    checkouts: Vec<CheckoutRecord>,
    /// `None` until a settings document arrives; the fallback applies.
    settings: Option<Settings>,
}

impl Default for StoreState {
    fn default() -> Self {
        StoreState {
            connected: true,
            hydrated: HashSet::new(),
            rooms: Vec::new(),
            service_requests: Vec::new(),
            items: Vec::new(),
            movements: Vec::new(),
            checkouts: Vec::new(),
            settings: None,
        }
    }
}

/// Feed-backed snapshot for one hotel.
pub struct HotelStore {
    hotel_id: String,
    fallback_settings: Settings,
    policy: NegativeStockPolicy,
    clock: Arc<dyn Clock>,
    state: RwLock<StoreState>,
}

impl HotelStore {
    pub fn new(hotel_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        HotelStore {
            hotel_id: hotel_id.into(),
            fallback_settings: Settings::default(),
            policy: NegativeStockPolicy::default(),
            clock,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Fee rates used while the hotel has no settings document.
    pub fn with_fallback_settings(mut self, settings: Settings) -> Self {
        self.fallback_settings = settings;
        self
    }

    pub fn with_policy(mut self, policy: NegativeStockPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn hotel_id(&self) -> &str {
        &self.hotel_id
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    pub async fn is_hydrated(&self, collection: Collection) -> bool {
        self.state.read().await.hydrated.contains(&collection)
    }

    // =========================================================================
    // Feed Consumption
    // =========================================================================

    /// Consumes a subscription until the feed closes.
    pub async fn run(&self, mut subscription: Subscription) {
        info!(hotel_id = %self.hotel_id, "Hotel store following feed");
        while let Some(event) = subscription.next().await {
            self.handle(event).await;
        }
        info!(hotel_id = %self.hotel_id, "Feed ended");
    }

    pub async fn handle(&self, event: FeedEvent) {
        match event {
            FeedEvent::Message(msg) => self.apply(&msg).await,
            FeedEvent::Lagged(skipped) => self.mark_lagged(skipped).await,
        }
    }

    /// Applies one feed message. Messages for other hotels are ignored.
    pub async fn apply(&self, msg: &FeedMessage) {
        if msg.hotel_id() != self.hotel_id {
            debug!(hotel_id = %msg.hotel_id(), "Ignoring message for another hotel");
            return;
        }

        let mut state = self.state.write().await;
        match msg {
            FeedMessage::Snapshot(payload) => {
                self.replace(&mut state, payload.collection, &payload.documents);
                state.hydrated.insert(payload.collection);
                debug!(
                    collection = %payload.collection,
                    documents = payload.documents.len(),
                    "Snapshot applied"
                );
                if payload.collection == Collection::Rooms {
                    self.warn_overlaps(&state.rooms);
                }
            }
            FeedMessage::Changes(payload) => {
                for change in &payload.changes {
                    self.apply_change(&mut state, payload.collection, change);
                }
                debug!(
                    collection = %payload.collection,
                    changes = payload.changes.len(),
                    "Changes applied"
                );
                if payload.collection == Collection::Rooms {
                    self.warn_overlaps(&state.rooms);
                }
            }
            FeedMessage::Status { status, .. } => {
                let connected = *status == FeedStatus::Connected;
                if state.connected != connected {
                    info!(hotel_id = %self.hotel_id, ?status, "Feed status changed");
                }
                state.connected = connected;
            }
        }
    }

    /// Marks every collection stale after the subscriber fell behind. Reads
    /// fail until fresh snapshots arrive.
    pub async fn mark_lagged(&self, skipped: u64) {
        warn!(hotel_id = %self.hotel_id, skipped, "Store fell behind feed, awaiting snapshots");
        self.state.write().await.hydrated.clear();
    }

    fn replace(&self, state: &mut StoreState, collection: Collection, documents: &[Document]) {
        let hotel_id = self.hotel_id.as_str();
        match collection {
            Collection::Rooms => {
                state.rooms = decode_all(documents, |d| decode_room(d, hotel_id));
            }
            Collection::ServiceRequests => {
                state.service_requests =
                    decode_all(documents, |d| decode_service_request(d, hotel_id));
            }
            Collection::InventoryItems => {
                state.items = decode_all(documents, |d| decode_inventory_item(d, hotel_id));
            }
            Collection::StockMovements => {
                state.movements = decode_all(documents, decode_stock_movement);
            }
            Collection::CheckoutHistory => {
                state.checkouts = decode_all(documents, decode_checkout);
            }
            Collection::Settings => {
                state.settings = decode_all(documents, decode_settings).into_iter().next();
            }
        }
    }

    fn apply_change(&self, state: &mut StoreState, collection: Collection, change: &DocumentChange) {
        let hotel_id = self.hotel_id.as_str();
        let doc = match change {
            DocumentChange::Added { id, data } | DocumentChange::Modified { id, data } => {
                Document::new(id.as_str(), data.clone())
            }
            DocumentChange::Removed { id } => {
                remove_record(state, collection, id);
                return;
            }
        };

        let result = match collection {
            Collection::Rooms => {
                decode_room(&doc, hotel_id).map(|r| upsert(&mut state.rooms, r, |r| &r.id))
            }
            Collection::ServiceRequests => decode_service_request(&doc, hotel_id)
                .map(|r| upsert(&mut state.service_requests, r, |r| &r.id)),
            Collection::InventoryItems => decode_inventory_item(&doc, hotel_id)
                .map(|i| upsert(&mut state.items, i, |i| &i.id)),
            Collection::StockMovements => {
                decode_stock_movement(&doc).map(|m| upsert(&mut state.movements, m, |m| &m.id))
            }
            Collection::CheckoutHistory => decode_checkout(&doc)
                .map(|c| upsert(&mut state.checkouts, c, |c| &c.stay.id)),
            Collection::Settings => decode_settings(&doc).map(|s| state.settings = Some(s)),
        };

        if let Err(e) = result {
            warn!(collection = %collection, id = %doc.id, error = %e, "Skipping malformed change");
        }
    }

    fn warn_overlaps(&self, rooms: &[Room]) {
        RoomBook::from_rooms(self.hotel_id.as_str(), rooms.to_vec(), self.clock.clone())
            .overlap_warnings();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    fn ready(state: &StoreState, needs: &[Collection]) -> SyncResult<()> {
        if !state.connected {
            return Err(SyncError::Disconnected);
        }
        match needs.iter().find(|c| !state.hydrated.contains(*c)) {
            Some(missing) => Err(SyncError::NotHydrated(missing.as_str())),
            None => Ok(()),
        }
    }

    fn effective_settings(&self, state: &StoreState) -> Settings {
        state.settings.unwrap_or(self.fallback_settings)
    }

    /// Fee settings in force: the hotel's settings document, else the
    /// configured fallback.
    pub async fn settings(&self) -> SyncResult<Settings> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::Settings])?;
        Ok(self.effective_settings(&state))
    }

    pub async fn rooms(&self) -> SyncResult<Vec<Room>> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::Rooms])?;
        Ok(state.rooms.clone())
    }

    /// Current bill for a stay (or its whole group). Unknown stays give an
    /// empty summary.
    pub async fn bill_summary(&self, stay_id: &str) -> SyncResult<BillSummary> {
        let state = self.state.read().await;
        Self::ready(&state, &BILLING_INPUTS)?;
        let ctx = BillingContext::new(
            &state.rooms,
            &state.service_requests,
            self.effective_settings(&state),
        );
        Ok(ctx.bill_for(stay_id))
    }

    pub async fn group_bill(&self, master_id: &str) -> SyncResult<BillSummary> {
        let state = self.state.read().await;
        Self::ready(&state, &BILLING_INPUTS)?;
        let ctx = BillingContext::new(
            &state.rooms,
            &state.service_requests,
            self.effective_settings(&state),
        );
        Ok(ctx.group_bill(master_id))
    }

    /// Folios for every checked-in guest, ordered by room number.
    pub async fn active_folios(&self) -> SyncResult<Vec<Folio>> {
        let state = self.state.read().await;
        Self::ready(&state, &BILLING_INPUTS)?;
        let ctx = BillingContext::new(
            &state.rooms,
            &state.service_requests,
            self.effective_settings(&state),
        );

        let mut folios: Vec<Folio> = state
            .rooms
            .iter()
            .flat_map(|room| room.stays.iter().map(move |stay| (room, stay)))
            .filter(|(_, stay)| stay.status == StayStatus::CheckedIn)
            .map(|(room, stay)| Folio {
                room_number: room.number.clone(),
                stay_id: stay.id.clone(),
                guest_name: stay.guest.name.clone(),
                bill: ctx.bill_for(&stay.id),
            })
            .collect();
        folios.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(folios)
    }

    pub async fn occupancy(&self, window: OccupancyWindow) -> SyncResult<OccupancyReport> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::Rooms])?;
        Ok(window.compute(&state.rooms, self.clock.as_ref()))
    }

    pub async fn occupancy_range(&self, range: &DateRange) -> SyncResult<OccupancyReport> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::Rooms])?;
        Ok(compute_occupancy(&state.rooms, range))
    }

    pub async fn overlap_warnings(&self) -> SyncResult<Vec<OverlapWarning>> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::Rooms])?;
        Ok(
            RoomBook::from_rooms(self.hotel_id.as_str(), state.rooms.clone(), self.clock.clone())
                .overlap_warnings(),
        )
    }

    /// Pending service requests, oldest first.
    pub async fn pending_services(&self) -> SyncResult<Vec<ServiceRequest>> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::ServiceRequests])?;
        let ledger = ServiceLedger::from_requests(
            self.hotel_id.as_str(),
            state.service_requests.clone(),
            self.clock.clone(),
        );
        Ok(ledger.pending_queue().into_iter().cloned().collect())
    }

    /// Items strictly below par level.
    pub async fn low_stock(&self) -> SyncResult<Vec<InventoryItem>> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::InventoryItems])?;
        Ok(self.ledger(&state).low_stock().into_iter().cloned().collect())
    }

    pub async fn stock_alerts(&self) -> SyncResult<Vec<StockAlert>> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::InventoryItems])?;
        Ok(self.ledger(&state).alerts())
    }

    /// Movements newest first, optionally for one item.
    pub async fn movement_log(&self, item_id: Option<&str>) -> SyncResult<Vec<StockMovement>> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::StockMovements])?;
        Ok(self
            .ledger(&state)
            .movement_log(item_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Archived checkouts, newest first.
    pub async fn checkout_history(&self) -> SyncResult<Vec<CheckoutRecord>> {
        let state = self.state.read().await;
        Self::ready(&state, &[Collection::CheckoutHistory])?;
        let mut records = state.checkouts.clone();
        records.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
        Ok(records)
    }

    fn ledger(&self, state: &StoreState) -> InventoryLedger {
        InventoryLedger::from_parts(
            self.hotel_id.as_str(),
            state.items.clone(),
            state.movements.clone(),
            self.policy,
            self.clock.clone(),
        )
    }
}

const BILLING_INPUTS: [Collection; 3] = [
    Collection::Rooms,
    Collection::ServiceRequests,
    Collection::Settings,
];

fn upsert<T>(records: &mut Vec<T>, record: T, id: impl Fn(&T) -> &String) {
    match records.iter_mut().find(|r| id(r) == id(&record)) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

fn remove_record(state: &mut StoreState, collection: Collection, id: &str) {
    match collection {
        Collection::Rooms => state.rooms.retain(|r| r.id != id),
        Collection::ServiceRequests => state.service_requests.retain(|r| r.id != id),
        Collection::InventoryItems => state.items.retain(|i| i.id != id),
        Collection::StockMovements => state.movements.retain(|m| m.id != id),
        Collection::CheckoutHistory => state.checkouts.retain(|c| c.stay.id != id),
        Collection::Settings => state.settings = None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{BroadcastFeed, ChangeFeed};
    use crate::inbound::{
        encode_inventory_item, encode_room, encode_service_request, encode_settings,
    };
    use chrono::{Duration, NaiveDate};
    use hotelier_core::{
        FixedClock, GuestInfo, Money, NewServiceRequest, NewStay, Stay,
    };

    const HOTEL: &str = "h";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 5).unwrap()
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::on(today()))
    }

    /// Room 101 with a checked-in 2-night stay at $100/night, $50 paid.
    fn booked_room() -> (Room, Stay) {
        let mut book = RoomBook::new(HOTEL, clock());
        book.upsert_room(Room::new("room-101", HOTEL, "101", "Standard"));
        let stay = book
            .create_stay(
                "room-101",
                NewStay::new(
                    GuestInfo::named("Asha Rao"),
                    today(),
                    today() + Duration::days(2),
                    10_000,
                )
                .with_advance(5_000),
            )
            .unwrap();
        let stay = book.check_in_stay(&stay.id).unwrap();
        (book.room("room-101").unwrap().clone(), stay)
    }

    fn laundry(stay: &Stay) -> ServiceRequest {
        ServiceLedger::new(HOTEL, clock())
            .open_request(NewServiceRequest {
                stay_id: stay.id.clone(),
                room_number: "101".to_string(),
                service_name: "Laundry".to_string(),
                price_cents: Some(2_000),
                assigned_to: None,
            })
            .unwrap()
    }

    async fn hydrated_store(room: &Room, requests: &[ServiceRequest]) -> HotelStore {
        let store = HotelStore::new(HOTEL, clock());
        store
            .apply(&FeedMessage::snapshot(HOTEL, Collection::Rooms, vec![encode_room(room)]))
            .await;
        store
            .apply(&FeedMessage::snapshot(
                HOTEL,
                Collection::ServiceRequests,
                requests.iter().map(encode_service_request).collect(),
            ))
            .await;
        store
            .apply(&FeedMessage::snapshot(
                HOTEL,
                Collection::Settings,
                vec![encode_settings(HOTEL, &Settings::from_percentages(10.0, 5.0))],
            ))
            .await;
        store
    }

    #[tokio::test]
    async fn test_reads_fail_until_hydrated() {
        let store = HotelStore::new(HOTEL, clock());

        let err = store.bill_summary("any").await.unwrap_err();
        assert!(matches!(err, SyncError::NotHydrated("rooms")));
        assert!(err.is_unavailable());

        store
            .apply(&FeedMessage::snapshot(HOTEL, Collection::Rooms, vec![]))
            .await;
        assert!(matches!(
            store.bill_summary("any").await,
            Err(SyncError::NotHydrated("service_requests"))
        ));
        assert!(store.occupancy(OccupancyWindow::Next7Days).await.is_ok());
    }

    #[tokio::test]
    async fn test_bill_from_snapshot() {
        let (room, stay) = booked_room();
        let store = hydrated_store(&room, &[laundry(&stay)]).await;

        let bill = store.bill_summary(&stay.id).await.unwrap();
        assert_eq!(bill.subtotal, Money::from_cents(22_000));
        assert_eq!(bill.service_charge_amount, Money::from_cents(1_100));
        assert_eq!(bill.gst_amount, Money::from_cents(2_200));
        assert_eq!(bill.current_balance, Money::from_cents(20_300));

        let folios = store.active_folios().await.unwrap();
        assert_eq!(folios.len(), 1);
        assert_eq!(folios[0].guest_name, "Asha Rao");
        assert_eq!(folios[0].bill, bill);
    }

    #[tokio::test]
    async fn test_changes_recompute_bill() {
        let (mut room, stay) = booked_room();
        let request = laundry(&stay);
        let store = hydrated_store(&room, &[request.clone()]).await;

        store
            .apply(&FeedMessage::changes(
                HOTEL,
                Collection::ServiceRequests,
                vec![DocumentChange::Removed { id: request.id.clone() }],
            ))
            .await;
        let bill = store.bill_summary(&stay.id).await.unwrap();
        assert_eq!(bill.total_services_charge, Money::zero());

        room.stays[0].paid_amount_cents = 23_000;
        let doc = encode_room(&room);
        store
            .apply(&FeedMessage::changes(
                HOTEL,
                Collection::Rooms,
                vec![DocumentChange::Modified { id: doc.id, data: doc.data }],
            ))
            .await;
        let bill = store.bill_summary(&stay.id).await.unwrap();
        assert_eq!(bill.current_balance, Money::zero());
    }

    #[tokio::test]
    async fn test_disconnect_is_degraded_not_empty() {
        let (room, stay) = booked_room();
        let store = hydrated_store(&room, &[]).await;

        store.apply(&FeedMessage::status(HOTEL, FeedStatus::Disconnected)).await;
        assert!(matches!(
            store.bill_summary(&stay.id).await,
            Err(SyncError::Disconnected)
        ));
        assert!(store.occupancy(OccupancyWindow::Last7Days).await.is_err());

        store.apply(&FeedMessage::status(HOTEL, FeedStatus::Connected)).await;
        assert!(store.bill_summary(&stay.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_lag_clears_hydration() {
        let (room, _) = booked_room();
        let store = hydrated_store(&room, &[]).await;
        assert!(store.is_hydrated(Collection::Rooms).await);

        store.handle(FeedEvent::Lagged(12)).await;
        assert!(!store.is_hydrated(Collection::Rooms).await);
        assert!(store.rooms().await.unwrap_err().is_unavailable());
    }

    #[tokio::test]
    async fn test_other_hotel_ignored() {
        let store = HotelStore::new(HOTEL, clock());
        store
            .apply(&FeedMessage::snapshot("elsewhere", Collection::Rooms, vec![]))
            .await;
        store
            .apply(&FeedMessage::status("elsewhere", FeedStatus::Disconnected))
            .await;

        assert!(!store.is_hydrated(Collection::Rooms).await);
        assert!(store.is_connected().await);
    }

    #[tokio::test]
    async fn test_settings_fallback() {
        let store = HotelStore::new(HOTEL, clock())
            .with_fallback_settings(Settings::from_percentages(12.0, 0.0));
        store
            .apply(&FeedMessage::snapshot(HOTEL, Collection::Settings, vec![]))
            .await;
        assert_eq!(store.settings().await.unwrap().gst_rate.bps(), 1200);

        store
            .apply(&FeedMessage::changes(
                HOTEL,
                Collection::Settings,
                vec![DocumentChange::Added {
                    id: HOTEL.to_string(),
                    data: serde_json::json!({ "gstRate": 18, "serviceChargeRate": 5 }),
                }],
            ))
            .await;
        assert_eq!(store.settings().await.unwrap().gst_rate.bps(), 1800);
    }

    #[tokio::test]
    async fn test_occupancy_and_stock_reads() {
        let (room, _) = booked_room();
        let store = hydrated_store(&room, &[]).await;

        let report = store.occupancy(OccupancyWindow::Next7Days).await.unwrap();
        assert_eq!(report.series.len(), 7);
        assert_eq!(report.series[0].occupancy_percent, 100.0);
        assert_eq!(report.series[2].occupancy_percent, 0.0);

        let mut ledger = InventoryLedger::new(HOTEL, NegativeStockPolicy::Flag, clock());
        let (towels, _) = ledger.add_item("Towels", "pcs", 10, 4).unwrap();
        let (soap, _) = ledger.add_item("Soap", "pcs", 10, 20).unwrap();
        store
            .apply(&FeedMessage::snapshot(
                HOTEL,
                Collection::InventoryItems,
                vec![encode_inventory_item(&towels), encode_inventory_item(&soap)],
            ))
            .await;

        let low = store.low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Towels");
        assert!(matches!(
            store.stock_alerts().await.unwrap()[0],
            StockAlert::Low { stock: 4, .. }
        ));
        assert!(matches!(
            store.movement_log(None).await,
            Err(SyncError::NotHydrated("stock_movements"))
        ));
    }

    #[tokio::test]
    async fn test_run_follows_feed_until_closed() {
        let (room, stay) = booked_room();
        let feed = BroadcastFeed::new(16);
        let store = HotelStore::new(HOTEL, clock());
        let sub = feed.subscribe(HOTEL);

        feed.publish(FeedMessage::snapshot(HOTEL, Collection::Rooms, vec![encode_room(&room)]))
            .unwrap();
        feed.publish(FeedMessage::snapshot(HOTEL, Collection::ServiceRequests, vec![]))
            .unwrap();
        feed.publish(FeedMessage::snapshot(HOTEL, Collection::Settings, vec![]))
            .unwrap();
        drop(feed);

        store.run(sub).await;

        let bill = store.bill_summary(&stay.id).await.unwrap();
        assert_eq!(bill.current_balance, Money::from_cents(15_000));
        assert!(store.overlap_warnings().await.unwrap().is_empty());
    }
}
