//! Plain-text rendering of the dashboard sections.

use hotelier_core::{OccupancyReport, OccupancyWindow, StockAlert};
use hotelier_sync::{Folio, HotelStore, SyncError};

const BAR_WIDTH: usize = 20;

pub async fn print_report(hotel_name: &str, store: &HotelStore, window: OccupancyWindow) {
    println!("🏨 {}", hotel_name);
    println!("{}", "=".repeat(hotel_name.chars().count() + 3));

    section("Occupancy");
    match store.occupancy(window).await {
        Ok(report) => print_occupancy(&report),
        Err(e) => degraded(&e),
    }

    section("Open folios");
    match store.active_folios().await {
        Ok(folios) if folios.is_empty() => println!("  No guests checked in"),
        Ok(folios) => folios.iter().for_each(|f| println!("{}", folio_line(f))),
        Err(e) => degraded(&e),
    }

    section("Stock alerts");
    match store.stock_alerts().await {
        Ok(alerts) if alerts.is_empty() => println!("  All items at or above par"),
        Ok(alerts) => alerts.iter().for_each(|a| println!("{}", alert_line(a))),
        Err(e) => degraded(&e),
    }

    section("Pending services");
    match store.pending_services().await {
        Ok(queue) if queue.is_empty() => println!("  Queue is empty"),
        Ok(queue) => {
            for request in queue {
                let price = request
                    .price_cents
                    .map(|_| request.price().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  Room {:<5} {:<24} {:>10}  since {}",
                    request.room_number,
                    request.service_name,
                    price,
                    request.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Err(e) => degraded(&e),
    }

    if let Ok(warnings) = store.overlap_warnings().await {
        if !warnings.is_empty() {
            section("Data warnings");
            for w in warnings {
                println!("  Room {}: stay {} overlaps {}", w.room_number, w.stay_id, w.conflict);
            }
        }
    }
}

fn section(title: &str) {
    println!();
    println!("{}", title);
    println!("{}", "-".repeat(title.len()));
}

fn degraded(err: &SyncError) {
    if err.is_unavailable() {
        println!("  ⚠ Unavailable: {}", err);
    } else {
        println!("  ✗ Error: {}", err);
    }
}

fn print_occupancy(report: &OccupancyReport) {
    println!("  {}", report.label);
    for point in &report.series {
        println!(
            "  {}  {} {:>5.1}%",
            point.date,
            bar(point.occupancy_percent),
            point.occupancy_percent
        );
    }
    println!("  Average: {:.1}%", report.average_percent);
    if let Some(peak) = report.peak {
        println!("  Peak:    {:.1}% on {}", peak.occupancy_percent, peak.date);
    }
}

fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn folio_line(folio: &Folio) -> String {
    let group = if folio.bill.group_stay_ids.len() > 1 {
        format!(" (group of {})", folio.bill.group_stay_ids.len())
    } else {
        String::new()
    };
    format!(
        "  Room {:<5} {:<24} {:>2} nights  total {:>12}  paid {:>12}  due {:>12}{}",
        folio.room_number,
        folio.guest_name,
        folio.bill.nights,
        folio.bill.total_with_taxes.to_string(),
        folio.bill.total_paid.to_string(),
        folio.bill.current_balance.to_string(),
        group
    )
}

fn alert_line(alert: &StockAlert) -> String {
    match alert {
        StockAlert::Low {
            name,
            stock,
            par_level,
            ..
        } => format!("  LOW       {:<24} {} / par {}", name, stock, par_level),
        StockAlert::Negative { name, stock, .. } => {
            format!("  NEGATIVE  {:<24} {} (more consumed than recorded)", name, stock)
        }
    }
}
