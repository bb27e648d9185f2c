//! # Validation Module
//!
//! Input validation utilities for Hotelier.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storage boundary (hotelier-sync::inbound)                    │
//! │  ├── Document shape, lenient date recovery                             │
//! │  └── Skips records that cannot be recovered                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine operations                                            │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hotelier_core::validation::{validate_guest_name, validate_charge_cents};
//!
//! validate_guest_name("Asha Rao").unwrap();
//! validate_charge_cents("room charge", 10_000).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::MAX_STAY_NIGHTS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a guest name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use hotelier_core::validation::validate_guest_name;
///
/// assert!(validate_guest_name("Asha Rao").is_ok());
/// assert!(validate_guest_name("   ").is_err());
/// ```
pub fn validate_guest_name(name: &str) -> ValidationResult<()> {
    validate_required_text("guest name", name, 200)
}

/// Validates an inventory item or service name.
pub fn validate_label(field: &str, value: &str) -> ValidationResult<()> {
    validate_required_text(field, value, 200)
}

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a stay's date range.
///
/// ## Rules
/// - `check_out` must be strictly after `check_in`
/// - At most [`MAX_STAY_NIGHTS`] nights
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use hotelier_core::validation::validate_stay_dates;
///
/// let d = |day| NaiveDate::from_ymd_opt(2026, 10, day).unwrap();
/// assert!(validate_stay_dates(d(1), d(3)).is_ok());
/// assert!(validate_stay_dates(d(3), d(3)).is_err());
/// ```
pub fn validate_stay_dates(check_in: NaiveDate, check_out: NaiveDate) -> ValidationResult<()> {
    if check_out <= check_in {
        return Err(ValidationError::InvalidDateRange {
            field: "stay".to_string(),
            start: check_in,
            end: check_out,
        });
    }

    if (check_out - check_in).num_days() > MAX_STAY_NIGHTS {
        return Err(ValidationError::OutOfRange {
            field: "nights".to_string(),
            min: 1,
            max: MAX_STAY_NIGHTS,
        });
    }

    Ok(())
}

/// Validates an inclusive block range (`to` may equal `from`).
pub fn validate_block_dates(from: NaiveDate, to: NaiveDate) -> ValidationResult<()> {
    if to < from {
        return Err(ValidationError::InvalidDateRange {
            field: "out-of-order block".to_string(),
            start: from,
            end: to,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a charge or payment in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (complimentary rooms, free requests)
///
/// ## Example
/// ```rust
/// use hotelier_core::validation::validate_charge_cents;
///
/// assert!(validate_charge_cents("price", 0).is_ok());
/// assert!(validate_charge_cents("price", -100).is_err());
/// ```
pub fn validate_charge_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a positive movement quantity (restock, consumption).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a signed adjustment delta.
pub fn validate_adjustment(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::MustBeNonZero {
            field: "adjustment".to_string(),
        });
    }

    Ok(())
}

/// Validates a fee rate in basis points (0% to 100%).
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a percentage as written in config files and documents.
pub fn validate_rate_percent(field: &str, pct: f64) -> ValidationResult<()> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use hotelier_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
