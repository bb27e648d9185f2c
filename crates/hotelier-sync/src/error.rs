//! # Sync Error Types
//!
//! Error types for the change feed, the snapshot store, and configuration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Availability  │  │     Storage boundary    │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Unavailable    │  │  InvalidRecord          │ │
//! │  │  ConfigLoad...  │  │  NotHydrated    │  │  Serialization          │ │
//! │  │                 │  │  Disconnected   │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Core / Db errors pass through unchanged, except database connection   │
//! │  failures, which become Unavailable.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use hotelier_core::CoreError;
use hotelier_db::DbError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering feed, store, and config failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Availability Errors
    // =========================================================================
    /// Upstream data cannot be trusted right now. Callers show a degraded
    /// state instead of computing against stale or empty data.
    #[error("Hotel data unavailable: {0}")]
    Unavailable(String),

    /// A collection the read needs has not received its first snapshot.
    #[error("Collection '{0}' has not been loaded yet")]
    NotHydrated(&'static str),

    /// The feed reported a disconnect.
    #[error("Disconnected from change feed")]
    Disconnected,

    /// Broadcast channel failure (closed, no receivers).
    #[error("Channel error: {0}")]
    ChannelError(String),

    // =========================================================================
    // Storage Boundary Errors
    // =========================================================================
    /// A document could not be converted into a typed entity.
    #[error("Invalid {collection} record {id}: {reason}")]
    InvalidRecord {
        collection: &'static str,
        id: String,
        reason: String,
    },

    /// JSON encode/decode failure.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    // =========================================================================
    // Pass-through
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(DbError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for SyncError {
    fn from(err: DbError) -> Self {
        if err.is_connection_error() {
            SyncError::Unavailable(err.to_string())
        } else {
            SyncError::Db(err)
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl SyncError {
    /// Builds an `InvalidRecord` error.
    pub fn invalid_record(
        collection: &'static str,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SyncError::InvalidRecord {
            collection,
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true when the caller should show a degraded state and retry
    /// later rather than treat the failure as a bug.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            SyncError::Unavailable(_) | SyncError::NotHydrated(_) | SyncError::Disconnected
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_) | SyncError::ConfigLoadFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_errors() {
        assert!(SyncError::Unavailable("feed lagged".into()).is_unavailable());
        assert!(SyncError::NotHydrated("rooms").is_unavailable());
        assert!(SyncError::Disconnected.is_unavailable());

        assert!(!SyncError::InvalidConfig("bad".into()).is_unavailable());
        assert!(SyncError::InvalidConfig("bad".into()).is_config_error());
    }

    #[test]
    fn test_db_connection_failure_becomes_unavailable() {
        let err: SyncError = DbError::ConnectionFailed("Pool is closed".into()).into();
        assert!(err.is_unavailable());

        let err: SyncError = DbError::not_found("Room", "r-1").into();
        assert!(matches!(err, SyncError::Db(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::invalid_record("rooms", "abc-123", "missing number");
        assert!(err.to_string().contains("rooms"));
        assert!(err.to_string().contains("abc-123"));
    }
}
