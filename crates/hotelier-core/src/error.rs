//! # Error Types
//!
//! Domain-specific error types for hotelier-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  hotelier-core errors (this file)                                      │
//! │  ├── CoreError        - Lifecycle / ledger rule violations             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  hotelier-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  hotelier-sync errors (separate crate)                                 │
//! │  └── SyncError        - Feed failures, Unavailable (degraded state)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → caller                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `AlreadyCheckedOut` is deliberately NOT an error: closing a closed stay is
//! reported through [`crate::stay::Closure::AlreadyCheckedOut`].

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested date range conflicts with an existing stay or block on the room.
    ///
    /// ## When This Occurs
    /// - `create_stay` / `extend_stay` intersecting another active stay
    /// - `create_stay` intersecting an out-of-order block without override
    /// - `mark_out_of_order` intersecting an active stay
    #[error("Room {room_number}: {from} to {to} overlaps {conflict}")]
    Overlap {
        room_number: String,
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
        conflict: String,
    },

    /// Clubbing request conflicts with existing group membership.
    #[error("Cannot club stay {stay_id}: {reason}")]
    InvalidGroup { stay_id: String, reason: String },

    /// Status change not allowed by the lifecycle state machine.
    #[error("{entity} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// Room not found in the book.
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Stay is neither active nor closed.
    #[error("Stay not found: {0}")]
    StayNotFound(String),

    /// Out-of-order block not found on the room.
    #[error("Out-of-order block {block_id} not found on room {room_id}")]
    BlockNotFound { room_id: String, block_id: String },

    /// Service request not found (or already archived with its stay).
    #[error("Service request not found: {0}")]
    ServiceRequestNotFound(String),

    /// Inventory item not found.
    #[error("Inventory item not found: {0}")]
    ItemNotFound(String),

    /// Consumption would drive stock below zero under the `Reject` policy.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be non-zero.
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Date range is empty or reversed.
    #[error("{field}: end {end} must be after start {start}")]
    InvalidDateRange {
        field: String,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Invalid format (e.g., invalid UUID, unparseable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_overlap_message() {
        let err = CoreError::Overlap {
            room_number: "101".to_string(),
            from: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2026, 10, 3).unwrap(),
            conflict: "stay s-1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Room 101: 2026-10-01 to 2026-10-03 overlaps stay s-1"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "guest name".to_string(),
        };
        assert_eq!(validation_err.to_string(), "guest name is required");

        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
