//! # Database Source
//!
//! Publishes a hotel's records from `hotelier-db` into a change feed, one
//! snapshot per collection.
//!
//! ```text
//! ┌──────────────┐   load_collection   ┌──────────────┐   publish   ┌──────────┐
//! │ hotelier-db  │ ──────────────────► │ DatabaseSrc  │ ──────────► │   Feed   │
//! │  (SQLite)    │   typed records     │  encode_*    │  Snapshot   │          │
//! └──────────────┘                     └──────────────┘             └──────────┘
//! ```
//!
//! A database that cannot be reached publishes `Status(disconnected)` so
//! subscribers enter a degraded state instead of keeping stale data.

use tracing::{info, warn};

use crate::error::SyncResult;
use crate::feed::{BroadcastFeed, Subscription};
use crate::inbound::{
    encode_checkout, encode_inventory_item, encode_room, encode_service_request, encode_settings,
    encode_stock_movement,
};
use crate::protocol::{Collection, Document, FeedMessage, FeedStatus};
use crate::store::HotelStore;
use hotelier_db::Database;

/// Reads one hotel from the database and turns it into feed messages.
#[derive(Debug, Clone)]
pub struct DatabaseSource {
    db: Database,
    hotel_id: String,
}

impl DatabaseSource {
    pub fn new(db: Database, hotel_id: impl Into<String>) -> Self {
        DatabaseSource {
            db,
            hotel_id: hotel_id.into(),
        }
    }

    /// Snapshot message for a single collection.
    pub async fn load_collection(&self, collection: Collection) -> SyncResult<FeedMessage> {
        let hotel_id = self.hotel_id.as_str();
        let documents: Vec<Document> = match collection {
            Collection::Rooms => self
                .db
                .rooms()
                .list(hotel_id)
                .await?
                .iter()
                .map(encode_room)
                .collect(),
            Collection::ServiceRequests => self
                .db
                .services()
                .list(hotel_id)
                .await?
                .iter()
                .map(encode_service_request)
                .collect(),
            Collection::InventoryItems => self
                .db
                .inventory()
                .items(hotel_id)
                .await?
                .iter()
                .map(encode_inventory_item)
                .collect(),
            Collection::StockMovements => self
                .db
                .inventory()
                .movements(hotel_id, None)
                .await?
                .iter()
                .map(encode_stock_movement)
                .collect(),
            Collection::CheckoutHistory => self
                .db
                .checkouts()
                .list(hotel_id, None)
                .await?
                .iter()
                .map(encode_checkout)
                .collect::<SyncResult<_>>()?,
            Collection::Settings => self
                .db
                .settings()
                .get(hotel_id)
                .await?
                .map(|s| encode_settings(hotel_id, &s))
                .into_iter()
                .collect(),
        };

        Ok(FeedMessage::snapshot(hotel_id, collection, documents))
    }

    /// Snapshot messages for every collection.
    pub async fn load_snapshot(&self) -> SyncResult<Vec<FeedMessage>> {
        let mut messages = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            messages.push(self.load_collection(collection).await?);
        }
        Ok(messages)
    }

    /// Publishes `Status(connected)` followed by a full snapshot.
    ///
    /// When the database is unreachable, publishes `Status(disconnected)` and
    /// returns the `Unavailable` error.
    pub async fn publish_snapshot(&self, feed: &BroadcastFeed) -> SyncResult<()> {
        match self.load_snapshot().await {
            Ok(messages) => {
                feed.publish(FeedMessage::status(&self.hotel_id, FeedStatus::Connected))?;
                let count = messages.len();
                for msg in messages {
                    feed.publish(msg)?;
                }
                info!(hotel_id = %self.hotel_id, collections = count, "Published snapshot");
                Ok(())
            }
            Err(e) => {
                warn!(hotel_id = %self.hotel_id, error = %e, "Snapshot load failed");
                if e.is_unavailable() {
                    // Nobody listening is fine here; the error below is what matters.
                    let _ = feed.publish(FeedMessage::status(&self.hotel_id, FeedStatus::Disconnected));
                }
                Err(e)
            }
        }
    }

    /// Publishes a snapshot while `store` follows `subscription`, then closes
    /// the feed so the store returns once it has drained every message.
    ///
    /// The source must be the feed's only publisher.
    pub async fn hydrate(
        &self,
        feed: BroadcastFeed,
        subscription: Subscription,
        store: &HotelStore,
    ) -> SyncResult<()> {
        let publish = async move {
            let result = self.publish_snapshot(&feed).await;
            drop(feed);
            result
        };
        let (published, ()) = tokio::join!(publish, store.run(subscription));
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::feed::{ChangeFeed, FeedEvent};
    use chrono::NaiveDate;
    use hotelier_core::{
        FixedClock, GuestInfo, InventoryLedger, NegativeStockPolicy, NewStay, Room, RoomBook,
        Settings,
    };
    use hotelier_db::DbConfig;
    use std::sync::Arc;

    const HOTEL: &str = "h";

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap()));

        let mut book = RoomBook::new(HOTEL, clock.clone());
        book.upsert_room(Room::new("room-101", HOTEL, "101", "Standard"));
        book.upsert_room(Room::new("room-102", HOTEL, "102", "Standard"));
        let stay = book
            .create_stay(
                "room-101",
                NewStay::new(
                    GuestInfo::named("Asha Rao"),
                    NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
                    NaiveDate::from_ymd_opt(2026, 10, 7).unwrap(),
                    10_000,
                ),
            )
            .unwrap();
        book.check_in_stay(&stay.id).unwrap();
        for room in book.rooms() {
            db.rooms().insert(room).await.unwrap();
        }

        let mut inventory = InventoryLedger::new(HOTEL, NegativeStockPolicy::Flag, clock);
        let (item, opening) = inventory.add_item("Towels", "pcs", 10, 3).unwrap();
        db.inventory().create_item(&item, opening.as_ref()).await.unwrap();

        db.settings()
            .upsert(HOTEL, &Settings::from_percentages(10.0, 5.0))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_load_snapshot_covers_every_collection() {
        let source = DatabaseSource::new(seeded_db().await, HOTEL);
        let messages = source.load_snapshot().await.unwrap();

        assert_eq!(messages.len(), Collection::ALL.len());
        let rooms = messages[0].clone();
        match rooms {
            FeedMessage::Snapshot(payload) => {
                assert_eq!(payload.collection, Collection::Rooms);
                assert_eq!(payload.documents.len(), 2);
            }
            other => panic!("unexpected message: {}", other.message_type()),
        }
    }

    #[tokio::test]
    async fn test_published_snapshot_hydrates_store() {
        let source = DatabaseSource::new(seeded_db().await, HOTEL);
        let feed = BroadcastFeed::new(32);
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap());
        let store = HotelStore::new(HOTEL, Arc::new(clock));
        let sub = feed.subscribe(HOTEL);

        source.publish_snapshot(&feed).await.unwrap();
        drop(feed);
        store.run(sub).await;

        let folios = store.active_folios().await.unwrap();
        assert_eq!(folios.len(), 1);
        // 2 nights at $100 + 5% + 10%
        assert_eq!(folios[0].bill.current_balance.cents(), 23_000);
        assert_eq!(store.low_stock().await.unwrap().len(), 1);
        assert_eq!(store.movement_log(None).await.unwrap().len(), 1);
        assert!(store.checkout_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_with_smallest_valid_capacity() {
        let source = DatabaseSource::new(seeded_db().await, HOTEL);
        let feed = BroadcastFeed::new(Collection::ALL.len() + 1);
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2026, 10, 5).unwrap());
        let store = HotelStore::new(HOTEL, Arc::new(clock));
        let sub = feed.subscribe(HOTEL);

        source.hydrate(feed, sub, &store).await.unwrap();

        assert_eq!(store.active_folios().await.unwrap().len(), 1);
        assert_eq!(store.low_stock().await.unwrap().len(), 1);
        assert!(store.checkout_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_database_publishes_disconnect() {
        let db = seeded_db().await;
        db.close().await;
        let source = DatabaseSource::new(db, HOTEL);
        let feed = BroadcastFeed::new(8);
        let mut sub = feed.subscribe(HOTEL);

        let err = source.publish_snapshot(&feed).await.unwrap_err();
        assert!(matches!(err, SyncError::Unavailable(_)));
        assert_eq!(
            sub.next().await,
            Some(FeedEvent::Message(FeedMessage::status(HOTEL, FeedStatus::Disconnected)))
        );
    }
}
