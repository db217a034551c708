//! The module contains the errors the engine can throw.
//!
//! Every error belongs to one [`ErrorKind`], which is what the boundary layer
//! uses to decide how a failure is surfaced:
//!
//! - [`Validation`]: malformed or out-of-range input, never retried.
//! - [`NotFound`]: a referenced row does not exist.
//! - [`Conflict`]: a business rule refused the operation
//!   ([`DuplicateInWarehouse`], [`InsufficientStock`], [`WouldGoNegative`]).
//! - [`Unavailable`]: the store could not be reached or locked in time, safe
//!   to retry.
//! - [`Internal`]: unexpected storage failure. The transaction was rolled back.
//!
//!  [`Validation`]: ErrorKind::Validation
//!  [`NotFound`]: ErrorKind::NotFound
//!  [`Conflict`]: ErrorKind::Conflict
//!  [`Unavailable`]: ErrorKind::Unavailable
//!  [`Internal`]: ErrorKind::Internal
//!  [`DuplicateInWarehouse`]: EngineError::DuplicateInWarehouse
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`WouldGoNegative`]: EngineError::WouldGoNegative
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use thiserror::Error;

/// Error taxonomy exposed to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unavailable,
    Internal,
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error(
        "item {item_id} already exists in warehouse {warehouse_id}; update the existing stocking instead"
    )]
    DuplicateInWarehouse { item_id: i32, warehouse_id: i32 },
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },
    #[error("Reversal would result in negative stock: current {current}, restored {restored}")]
    WouldGoNegative { current: i64, restored: i64 },
    #[error("Stocking in use: {0}")]
    StockingInUse(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::ExistingKey(_)
            | Self::DuplicateInWarehouse { .. }
            | Self::InsufficientStock { .. }
            | Self::WouldGoNegative { .. }
            | Self::StockingInUse(_) => ErrorKind::Conflict,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// `true` when the same request may succeed if retried later.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Unavailable
    }
}

/// Driver codes for a lock that could not be taken in time or a transaction
/// that lost a race: SQLite `BUSY`/`LOCKED` and their extended codes, Postgres
/// serialization failure and deadlock.
const CONTENTION_CODES: &[&str] = &["5", "6", "261", "262", "517", "773", "40001", "40P01"];

fn is_contention(err: &DbErr) -> bool {
    let (DbErr::Exec(RuntimeErr::SqlxError(inner)) | DbErr::Query(RuntimeErr::SqlxError(inner))) =
        err
    else {
        return false;
    };
    inner
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| CONTENTION_CODES.iter().any(|known| *known == code))
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(inner) => Self::Unavailable(inner.to_string()),
            DbErr::Conn(inner) => Self::Unavailable(inner.to_string()),
            other if is_contention(&other) => Self::Unavailable(other.to_string()),
            other => Self::Database(other),
        }
    }
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (
                Self::DuplicateInWarehouse {
                    item_id: a,
                    warehouse_id: b,
                },
                Self::DuplicateInWarehouse {
                    item_id: c,
                    warehouse_id: d,
                },
            ) => a == c && b == d,
            (
                Self::InsufficientStock {
                    available: a,
                    requested: b,
                },
                Self::InsufficientStock {
                    available: c,
                    requested: d,
                },
            ) => a == c && b == d,
            (
                Self::WouldGoNegative {
                    current: a,
                    restored: b,
                },
                Self::WouldGoNegative {
                    current: c,
                    restored: d,
                },
            ) => a == c && b == d,
            (Self::StockingInUse(a), Self::StockingInUse(b)) => a == b,
            (Self::Unavailable(a), Self::Unavailable(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::ConnAcquireErr;

    use super::*;

    #[test]
    fn business_rules_are_conflicts() {
        let err = EngineError::InsufficientStock {
            available: 30,
            requested: 50,
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            EngineError::WouldGoNegative {
                current: 5,
                restored: -15
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::DuplicateInWarehouse {
                item_id: 1,
                warehouse_id: 2
            }
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn pool_timeout_is_retryable() {
        let err = EngineError::from(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout));
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(err.is_retryable());
    }

    #[test]
    fn other_storage_errors_are_internal() {
        let err = EngineError::from(DbErr::Custom("boom".to_string()));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_retryable());
    }

    #[test]
    fn insufficient_stock_reports_available() {
        let err = EngineError::InsufficientStock {
            available: 30,
            requested: 50,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: available 30, requested 50"
        );
    }
}
