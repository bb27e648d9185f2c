//! # Inbound Document Conversion
//!
//! Validates loosely-typed feed documents and converts them into the strongly
//! typed entities of `hotelier-core`. Nothing past this module sees raw JSON.
//!
//! ## Document Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Inbound Document Fields (camelCase)                  │
//! │                                                                         │
//! │  rooms             number, category, stays[], outOfOrder[]             │
//! │    stays[]         id, guestName, checkInDate, checkOutDate,           │
//! │                    roomCharge, paidAmount, isGroupBooking,             │
//! │                    groupMasterStayId, status, createdAt                │
//! │    outOfOrder[]    id, from, to, reason                                │
//! │  service_requests  stayId, roomNumber, serviceName, price, status,     │
//! │                    assignedTo, createdAt, completedAt                  │
//! │  inventory_items   name, stock, parLevel, unit                         │
//! │  stock_movements   itemId, type, quantity, note, timestamp             │
//! │  settings          gstRate, serviceChargeRate   (percent)              │
//! │  checkout_history  archived CheckoutRecord                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recovery Rules
//! - Amounts arrive in currency units (`123.45`) and are rounded to cents.
//! - Dates are re-parsed from whatever representation arrived, see
//!   [`parse_date`]. A stay or block whose dates cannot be recovered is
//!   skipped with a warning; the rest of its room still loads.
//! - A document that cannot be converted at all is skipped by
//!   [`decode_all`] with a warning; the batch continues.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::{SyncError, SyncResult};
use crate::protocol::Document;
use hotelier_core::{
    CheckoutRecord, FeeRate, GuestInfo, InventoryItem, MovementKind, OutOfOrderBlock, Room,
    ServiceRequest, ServiceStatus, Settings, Stay, StayStatus, StockMovement,
};

// =============================================================================
// Batch Helper
// =============================================================================

/// Converts every document, skipping (and logging) the ones that fail.
pub fn decode_all<T>(
    documents: &[Document],
    decode: impl Fn(&Document) -> SyncResult<T>,
) -> Vec<T> {
    documents
        .iter()
        .filter_map(|doc| match decode(doc) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "Skipping malformed document");
                None
            }
        })
        .collect()
}

// =============================================================================
// Decoders
// =============================================================================

/// Room document (with embedded stays and blocks) → [`Room`].
pub fn decode_room(doc: &Document, hotel_id: &str) -> SyncResult<Room> {
    let data = object(doc, "rooms")?;
    let number = text(data, &["number", "roomNumber"])
        .ok_or_else(|| SyncError::invalid_record("rooms", &doc.id, "missing room number"))?;
    let category = text(data, &["category", "type"]).unwrap_or_default();

    let mut room = Room::new(&doc.id, hotel_id, number, category);

    for raw in array(data, "stays") {
        match decode_stay(raw, &doc.id) {
            Ok(stay) => room.stays.push(stay),
            Err(e) => warn!(room = %room.number, error = %e, "Skipping unreadable stay"),
        }
    }

    for raw in array(data, "outOfOrder") {
        match decode_block(raw) {
            Ok(block) => room.out_of_order.push(block),
            Err(e) => warn!(room = %room.number, error = %e, "Skipping unreadable out-of-order block"),
        }
    }

    Ok(room)
}

fn decode_stay(raw: &Value, room_id: &str) -> SyncResult<Stay> {
    let data = raw
        .as_object()
        .ok_or_else(|| SyncError::invalid_record("stays", "?", "not an object"))?;
    let id = text(data, &["id"])
        .ok_or_else(|| SyncError::invalid_record("stays", "?", "missing id"))?;
    let invalid = |reason: &str| SyncError::invalid_record("stays", &id, reason);

    let check_in = field(data, &["checkInDate", "checkIn"])
        .and_then(parse_date)
        .ok_or_else(|| invalid("unrecoverable check-in date"))?;
    let check_out = field(data, &["checkOutDate", "checkOut"])
        .and_then(parse_date)
        .ok_or_else(|| invalid("unrecoverable check-out date"))?;

    let room_charge_cents = amount(data, &["roomCharge"]).unwrap_or(0);
    let paid_amount_cents = amount(data, &["paidAmount"]).unwrap_or(0);
    if room_charge_cents < 0 {
        return Err(invalid("negative room charge"));
    }

    let status = match text(data, &["status"]) {
        Some(s) => parse_stay_status(&s).ok_or_else(|| invalid("unknown status"))?,
        None => StayStatus::Reserved,
    };

    Ok(Stay {
        room_id: text(data, &["roomId"]).unwrap_or_else(|| room_id.to_string()),
        guest: GuestInfo {
            name: text(data, &["guestName", "name"]).unwrap_or_default(),
            phone: text(data, &["guestPhone", "phone"]),
            email: text(data, &["guestEmail", "email"]),
        },
        check_in,
        check_out,
        room_charge_cents,
        paid_amount_cents,
        is_group_booking: flag(data, "isGroupBooking"),
        group_master_stay_id: text(data, &["groupMasterStayId"]),
        status,
        created_at: field(data, &["createdAt"])
            .and_then(parse_timestamp)
            .unwrap_or_default(),
        id,
    })
}

fn decode_block(raw: &Value) -> SyncResult<OutOfOrderBlock> {
    let data = raw
        .as_object()
        .ok_or_else(|| SyncError::invalid_record("outOfOrder", "?", "not an object"))?;
    let from = field(data, &["from"]).and_then(parse_date);
    let to = field(data, &["to"]).and_then(parse_date);

    match (from, to) {
        (Some(from), Some(to)) => Ok(OutOfOrderBlock {
            // older documents carry no block id; derive a stable one
            id: text(data, &["id"]).unwrap_or_else(|| format!("ooo-{}-{}", from, to)),
            from,
            to,
            reason: text(data, &["reason"]),
        }),
        _ => Err(SyncError::invalid_record(
            "outOfOrder",
            text(data, &["id"]).unwrap_or_default(),
            "unrecoverable block dates",
        )),
    }
}

pub fn decode_service_request(doc: &Document, hotel_id: &str) -> SyncResult<ServiceRequest> {
    let data = object(doc, "service_requests")?;
    let invalid = |reason: &str| SyncError::invalid_record("service_requests", &doc.id, reason);

    let stay_id = text(data, &["stayId"]).ok_or_else(|| invalid("missing stayId"))?;
    let service_name = text(data, &["serviceName", "service"])
        .ok_or_else(|| invalid("missing serviceName"))?;
    let price_cents = amount(data, &["price"]);
    if price_cents.map_or(false, |p| p < 0) {
        return Err(invalid("negative price"));
    }

    let status = match text(data, &["status"]) {
        Some(s) => parse_service_status(&s).ok_or_else(|| invalid("unknown status"))?,
        None => ServiceStatus::Pending,
    };

    Ok(ServiceRequest {
        id: doc.id.clone(),
        hotel_id: hotel_id.to_string(),
        stay_id,
        room_number: text(data, &["roomNumber"]).unwrap_or_default(),
        service_name,
        price_cents,
        status,
        assigned_to: text(data, &["assignedTo"]),
        created_at: field(data, &["createdAt"])
            .and_then(parse_timestamp)
            .unwrap_or_default(),
        completed_at: field(data, &["completedAt"]).and_then(parse_timestamp),
    })
}

pub fn decode_inventory_item(doc: &Document, hotel_id: &str) -> SyncResult<InventoryItem> {
    let data = object(doc, "inventory_items")?;
    let name = text(data, &["name"])
        .ok_or_else(|| SyncError::invalid_record("inventory_items", &doc.id, "missing name"))?;

    Ok(InventoryItem {
        id: doc.id.clone(),
        hotel_id: hotel_id.to_string(),
        name,
        stock: integer(data, &["stock", "currentStock"]).unwrap_or(0),
        par_level: integer(data, &["parLevel"]).unwrap_or(0),
        unit: text(data, &["unit"]).unwrap_or_else(|| "pcs".to_string()),
    })
}

pub fn decode_stock_movement(doc: &Document) -> SyncResult<StockMovement> {
    let data = object(doc, "stock_movements")?;
    let invalid = |reason: &str| SyncError::invalid_record("stock_movements", &doc.id, reason);

    let item_id = text(data, &["itemId"]).ok_or_else(|| invalid("missing itemId"))?;
    let kind = text(data, &["type", "kind"])
        .and_then(|k| parse_movement_kind(&k))
        .ok_or_else(|| invalid("unknown movement type"))?;
    let quantity = integer(data, &["quantity"]).ok_or_else(|| invalid("missing quantity"))?;

    Ok(StockMovement {
        id: doc.id.clone(),
        item_id,
        kind,
        quantity,
        note: text(data, &["note", "notes"]).unwrap_or_default(),
        created_at: field(data, &["timestamp", "createdAt"])
            .and_then(parse_timestamp)
            .unwrap_or_default(),
    })
}

/// Settings document (rates in percent) → [`Settings`].
pub fn decode_settings(doc: &Document) -> SyncResult<Settings> {
    let data = object(doc, "settings")?;
    let rate = |key: &str| -> SyncResult<FeeRate> {
        let pct = data.get(key).and_then(number).unwrap_or(0.0);
        if !(0.0..=100.0).contains(&pct) {
            return Err(SyncError::invalid_record(
                "settings",
                &doc.id,
                format!("{} out of range: {}", key, pct),
            ));
        }
        Ok(FeeRate::from_percentage(pct))
    };

    Ok(Settings {
        gst_rate: rate("gstRate")?,
        service_charge_rate: rate("serviceChargeRate")?,
    })
}

pub fn decode_checkout(doc: &Document) -> SyncResult<CheckoutRecord> {
    serde_json::from_value(doc.data.clone())
        .map_err(|e| SyncError::invalid_record("checkout_history", &doc.id, e.to_string()))
}

// =============================================================================
// Encoders (used when publishing from a typed source)
// =============================================================================

pub fn encode_room(room: &Room) -> Document {
    let stays: Vec<Value> = room
        .stays
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "roomId": s.room_id,
                "guestName": s.guest.name,
                "guestPhone": s.guest.phone,
                "guestEmail": s.guest.email,
                "checkInDate": s.check_in.to_string(),
                "checkOutDate": s.check_out.to_string(),
                "roomCharge": units(s.room_charge_cents),
                "paidAmount": units(s.paid_amount_cents),
                "isGroupBooking": s.is_group_booking,
                "groupMasterStayId": s.group_master_stay_id,
                "status": s.status.as_str(),
                "createdAt": s.created_at.to_rfc3339(),
            })
        })
        .collect();

    let blocks: Vec<Value> = room
        .out_of_order
        .iter()
        .map(|b| {
            json!({
                "id": b.id,
                "from": b.from.to_string(),
                "to": b.to.to_string(),
                "reason": b.reason,
            })
        })
        .collect();

    Document::new(
        &room.id,
        json!({
            "number": room.number,
            "category": room.category,
            "stays": stays,
            "outOfOrder": blocks,
        }),
    )
}

pub fn encode_service_request(request: &ServiceRequest) -> Document {
    Document::new(
        &request.id,
        json!({
            "stayId": request.stay_id,
            "roomNumber": request.room_number,
            "serviceName": request.service_name,
            "price": request.price_cents.map(units),
            "status": request.status.as_str(),
            "assignedTo": request.assigned_to,
            "createdAt": request.created_at.to_rfc3339(),
            "completedAt": request.completed_at.map(|t| t.to_rfc3339()),
        }),
    )
}

pub fn encode_inventory_item(item: &InventoryItem) -> Document {
    Document::new(
        &item.id,
        json!({
            "name": item.name,
            "stock": item.stock,
            "parLevel": item.par_level,
            "unit": item.unit,
        }),
    )
}

pub fn encode_stock_movement(movement: &StockMovement) -> Document {
    Document::new(
        &movement.id,
        json!({
            "itemId": movement.item_id,
            "type": movement.kind.as_str(),
            "quantity": movement.quantity,
            "note": movement.note,
            "timestamp": movement.created_at.to_rfc3339(),
        }),
    )
}

pub fn encode_settings(hotel_id: &str, settings: &Settings) -> Document {
    Document::new(
        hotel_id,
        json!({
            "gstRate": settings.gst_rate.percentage(),
            "serviceChargeRate": settings.service_charge_rate.percentage(),
        }),
    )
}

pub fn encode_checkout(record: &CheckoutRecord) -> SyncResult<Document> {
    Ok(Document::new(&record.stay.id, serde_json::to_value(record)?))
}

// =============================================================================
// Lenient Parsing
// =============================================================================

/// Recovers a calendar date from any representation seen in stored documents.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, RFC 3339 timestamps, a date-time
/// string without offset, epoch milliseconds, and `{ seconds, nanoseconds }`
/// timestamp objects. Timestamps resolve to their UTC date.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    if let Some(s) = value.as_str() {
        let s = s.trim();
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc).date_naive()))
            .or_else(|| s.get(..10).and_then(|p| NaiveDate::parse_from_str(p, "%Y-%m-%d").ok()));
    }

    parse_timestamp(value).map(|dt| dt.date_naive())
}

/// Recovers an instant. Date-only strings resolve to midnight UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
                        .ok()
                        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
                })
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
        }
        _ => None,
    }
}

/// `"checked-in"`, `"CheckedIn"`, `"checked_in"` all map to the same status.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn parse_stay_status(s: &str) -> Option<StayStatus> {
    match normalize(s).as_str() {
        "reserved" | "booked" => Some(StayStatus::Reserved),
        "checkedin" => Some(StayStatus::CheckedIn),
        "checkedout" => Some(StayStatus::CheckedOut),
        "cancelled" | "canceled" => Some(StayStatus::Cancelled),
        _ => None,
    }
}

fn parse_service_status(s: &str) -> Option<ServiceStatus> {
    match normalize(s).as_str() {
        "pending" => Some(ServiceStatus::Pending),
        "inprogress" => Some(ServiceStatus::InProgress),
        "completed" | "done" => Some(ServiceStatus::Completed),
        _ => None,
    }
}

fn parse_movement_kind(s: &str) -> Option<MovementKind> {
    match normalize(s).as_str() {
        "restock" => Some(MovementKind::Restock),
        "consumption" | "consume" => Some(MovementKind::Consumption),
        "adjustment" | "adjust" => Some(MovementKind::Adjustment),
        _ => None,
    }
}

// =============================================================================
// Field Access
// =============================================================================

fn object<'a>(doc: &'a Document, collection: &'static str) -> SyncResult<&'a Map<String, Value>> {
    doc.data
        .as_object()
        .ok_or_else(|| SyncError::invalid_record(collection, &doc.id, "document is not an object"))
}

/// First present, non-null field among `keys`.
fn field<'a>(data: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| data.get(*k))
        .find(|v| !v.is_null())
}

/// Non-blank string; numbers are accepted and stringified.
fn text(data: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match field(data, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Currency units → cents, rounded.
fn amount(data: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    field(data, keys)
        .and_then(number)
        .filter(|n| n.is_finite())
        .map(|n| (n * 100.0).round() as i64)
}

fn integer(data: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    field(data, keys)
        .and_then(number)
        .filter(|n| n.is_finite())
        .map(|n| n.round() as i64)
}

fn flag(data: &Map<String, Value>, key: &str) -> bool {
    data.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn array<'a>(data: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn units(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[test]
    fn test_parse_date_representations() {
        assert_eq!(parse_date(&json!("2026-10-05")), Some(d(5)));
        assert_eq!(parse_date(&json!("2026/10/05")), Some(d(5)));
        assert_eq!(parse_date(&json!("2026-10-05T22:30:00Z")), Some(d(5)));
        assert_eq!(parse_date(&json!("2026-10-05T10:00:00")), Some(d(5)));

        let millis = Utc.with_ymd_and_hms(2026, 10, 5, 12, 0, 0).unwrap().timestamp_millis();
        assert_eq!(parse_date(&json!(millis)), Some(d(5)));

        let seconds = Utc.with_ymd_and_hms(2026, 10, 5, 0, 0, 0).unwrap().timestamp();
        assert_eq!(
            parse_date(&json!({ "seconds": seconds, "nanoseconds": 0 })),
            Some(d(5))
        );

        assert_eq!(parse_date(&json!("next tuesday")), None);
        assert_eq!(parse_date(&json!(true)), None);
    }

    #[test]
    fn test_decode_room_with_stays_and_blocks() {
        let doc = Document::new(
            "r-101",
            json!({
                "number": 101,
                "category": "Deluxe",
                "stays": [
                    {
                        "id": "s-1",
                        "guestName": "Asha Rao",
                        "checkInDate": "2026-10-01",
                        "checkOutDate": { "seconds": 1_790_985_600, "nanoseconds": 0 },
                        "roomCharge": 100.0,
                        "paidAmount": "50",
                        "isGroupBooking": true,
                        "groupMasterStayId": "s-1",
                        "status": "checked-in"
                    },
                    { "id": "s-bad", "guestName": "Nobody", "checkInDate": "??", "checkOutDate": "2026-10-09" }
                ],
                "outOfOrder": [ { "from": "2026-10-20", "to": "2026-10-21", "reason": "Paint" } ]
            }),
        );

        let room = decode_room(&doc, "h").unwrap();
        assert_eq!(room.number, "101");
        assert_eq!(room.stays.len(), 1);

        let stay = &room.stays[0];
        assert_eq!(stay.room_id, "r-101");
        assert_eq!(stay.check_in, d(1));
        assert_eq!(stay.check_out, d(3));
        assert_eq!(stay.room_charge_cents, 10_000);
        assert_eq!(stay.paid_amount_cents, 5_000);
        assert_eq!(stay.status, StayStatus::CheckedIn);
        assert!(stay.is_grouped());

        assert_eq!(room.out_of_order.len(), 1);
        assert_eq!(room.out_of_order[0].id, "ooo-2026-10-20-2026-10-21");
    }

    #[test]
    fn test_decode_all_skips_bad_documents() {
        let docs = vec![
            Document::new("r-1", json!({ "number": "101" })),
            Document::new("r-2", json!({ "category": "Suite" })),
            Document::new("r-3", json!("not an object")),
        ];
        let rooms = decode_all(&docs, |doc| decode_room(doc, "h"));
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, "r-1");
    }

    #[test]
    fn test_decode_service_request() {
        let doc = Document::new(
            "q-1",
            json!({
                "stayId": "s-1",
                "roomNumber": "101",
                "serviceName": "Laundry",
                "price": null,
                "status": "InProgress",
                "createdAt": "2026-10-01T09:00:00Z"
            }),
        );
        let req = decode_service_request(&doc, "h").unwrap();
        assert_eq!(req.price_cents, None);
        assert_eq!(req.status, ServiceStatus::InProgress);
        assert_eq!(req.created_at, Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap());

        let bad = Document::new("q-2", json!({ "stayId": "s-1", "serviceName": "Spa", "price": -5 }));
        assert!(decode_service_request(&bad, "h").is_err());
    }

    #[test]
    fn test_decode_stock_movement_and_settings() {
        let movement = decode_stock_movement(&Document::new(
            "m-1",
            json!({ "itemId": "soap", "type": "consumption", "quantity": -3, "timestamp": 1_790_000_000_000i64 }),
        ))
        .unwrap();
        assert_eq!(movement.kind, MovementKind::Consumption);
        assert_eq!(movement.quantity, -3);

        let settings = decode_settings(&Document::new(
            "h",
            json!({ "gstRate": 10, "serviceChargeRate": "5" }),
        ))
        .unwrap();
        assert_eq!(settings.gst_rate.bps(), 1000);
        assert_eq!(settings.service_charge_rate.bps(), 500);

        assert!(decode_settings(&Document::new("h", json!({ "gstRate": 140 }))).is_err());
    }

    #[test]
    fn test_encoded_room_decodes_to_same_room() {
        let mut room = Room::new("r-101", "h", "101", "Deluxe");
        room.stays.push(Stay {
            id: "s-1".to_string(),
            room_id: "r-101".to_string(),
            guest: GuestInfo::named("Asha Rao"),
            check_in: d(1),
            check_out: d(3),
            room_charge_cents: 12_345,
            paid_amount_cents: 999,
            is_group_booking: false,
            group_master_stay_id: None,
            status: StayStatus::Reserved,
            created_at: Utc.with_ymd_and_hms(2026, 9, 30, 8, 0, 0).unwrap(),
        });
        room.out_of_order.push(OutOfOrderBlock {
            id: "b-1".to_string(),
            from: d(10),
            to: d(11),
            reason: None,
        });

        assert_eq!(decode_room(&encode_room(&room), "h").unwrap(), room);
    }
}
