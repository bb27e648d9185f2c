//! # Seed Data Generator
//!
//! Populates the database with a small demo hotel for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default hotel
//! cargo run -p hotelier-db --bin seed
//!
//! # Specify database path and hotel id
//! cargo run -p hotelier-db --bin seed -- --db ./data/hotelier.db --hotel my-hotel
//! ```
//!
//! ## Generated Data
//! - Rooms 101-104 (Standard), 201-203 (Deluxe), 301 (Suite)
//! - Four stays around today, two of them clubbed into one group
//! - An out-of-order block on 301
//! - A few service requests and minibar/linen inventory
//! - GST 12%, service charge 5%
//!
//! Every booking goes through `RoomBook`, so the seeded data obeys the same
//! overlap rules as live bookings.

use std::env;
use std::sync::Arc;

use chrono::Duration;
use hotelier_core::{
    Clock, DateRange, GuestInfo, InventoryLedger, NegativeStockPolicy, NewServiceRequest,
    NewStay, Room, RoomBook, ServiceLedger, Settings, SystemClock, DEFAULT_HOTEL_ID,
};
use hotelier_db::{Database, DbConfig};

/// (number, category, nightly rate in cents)
const ROOMS: &[(&str, &str, i64)] = &[
    ("101", "Standard", 3_500_00),
    ("102", "Standard", 3_500_00),
    ("103", "Standard", 3_500_00),
    ("104", "Standard", 3_500_00),
    ("201", "Deluxe", 5_200_00),
    ("202", "Deluxe", 5_200_00),
    ("203", "Deluxe", 5_200_00),
    ("301", "Suite", 9_800_00),
];

/// (name, unit, par level, opening stock)
const INVENTORY: &[(&str, &str, i64, i64)] = &[
    ("Bath towels", "pcs", 40, 64),
    ("Bed sheets", "pcs", 30, 22),
    ("Soap bars", "pcs", 100, 180),
    ("Mineral water", "bottles", 120, 96),
    ("Minibar snacks", "packs", 50, 75),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./hotelier_dev.db");
    let mut hotel_id = String::from(DEFAULT_HOTEL_ID);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--hotel" => {
                if i + 1 < args.len() {
                    hotel_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Hotelier Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./hotelier_dev.db)");
                println!("      --hotel <ID>    Hotel id to seed (default: {})", DEFAULT_HOTEL_ID);
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Hotelier Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Hotel:    {}", hotel_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.rooms().count(&hotel_id).await?;
    if existing > 0 {
        println!("⚠ Hotel already has {} rooms", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let today = clock.today();

    // Rooms and bookings
    let mut book = RoomBook::new(hotel_id.clone(), clock.clone());
    for (number, category, _) in ROOMS {
        book.upsert_room(Room::new(
            format!("room-{}", number),
            hotel_id.clone(),
            *number,
            *category,
        ));
    }

    let rate = |number: &str| {
        ROOMS
            .iter()
            .find(|(n, _, _)| *n == number)
            .map_or(0, |(_, _, cents)| *cents)
    };

    let asha = book.create_stay(
        "room-101",
        NewStay::new(
            GuestInfo {
                name: "Asha Rao".to_string(),
                phone: Some("+91 98450 12345".to_string()),
                email: None,
            },
            today - Duration::days(2),
            today + Duration::days(1),
            rate("101"),
        )
        .with_advance(5_000_00),
    )?;
    book.check_in_stay(&asha.id)?;

    let lead = book.create_stay(
        "room-201",
        NewStay::new(
            GuestInfo::named("Daniel Okafor"),
            today - Duration::days(1),
            today + Duration::days(3),
            rate("201"),
        )
        .with_advance(10_000_00),
    )?;
    let companion = book.create_stay(
        "room-202",
        NewStay::new(
            GuestInfo::named("Mei Okafor"),
            today - Duration::days(1),
            today + Duration::days(3),
            rate("202"),
        ),
    )?;
    book.check_in_stay(&lead.id)?;
    book.check_in_stay(&companion.id)?;
    book.club_stays(&lead.id, &[companion.id.as_str()])?;

    book.create_stay(
        "room-103",
        NewStay::new(
            GuestInfo::named("Lucía Fernández"),
            today + Duration::days(2),
            today + Duration::days(5),
            rate("103"),
        ),
    )?;

    book.mark_out_of_order(
        "room-301",
        DateRange::new(today, today + Duration::days(2)),
        Some("Bathroom retiling".to_string()),
    )?;

    for room in book.rooms() {
        db.rooms().insert(room).await?;
    }
    println!("✓ Created {} rooms", book.rooms().len());

    // Service requests
    let mut services = ServiceLedger::new(hotel_id.clone(), clock.clone());
    let requests = [
        (&asha, "101", "Laundry", Some(450_00)),
        (&asha, "101", "Extra pillows", None),
        (&lead, "201", "Airport transfer", Some(1_800_00)),
        (&companion, "202", "In-room dining", Some(1_250_00)),
    ];
    for (stay, room_number, service_name, price_cents) in requests {
        let request = services.open_request(NewServiceRequest {
            stay_id: stay.id.clone(),
            room_number: room_number.to_string(),
            service_name: service_name.to_string(),
            price_cents,
            assigned_to: None,
        })?;
        db.services().upsert(&request).await?;
    }
    println!("✓ Opened {} service requests", services.requests().len());

    // Inventory
    let mut inventory = InventoryLedger::new(hotel_id.clone(), NegativeStockPolicy::Flag, clock);
    for (name, unit, par_level, opening_stock) in INVENTORY {
        let (item, opening) = inventory.add_item(name, unit, *par_level, *opening_stock)?;
        db.inventory().create_item(&item, opening.as_ref()).await?;
    }
    println!("✓ Stocked {} inventory items", INVENTORY.len());

    db.settings()
        .upsert(&hotel_id, &Settings::from_percentages(12.0, 5.0))
        .await?;
    println!("✓ Saved fee settings");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
