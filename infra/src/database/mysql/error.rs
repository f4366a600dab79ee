//! Translation of SQLx failures into storage contract errors.

use se_core::errors::StorageError;
use sqlx::mysql::MySqlDatabaseError;

/// ER_DUP_ENTRY
const DUPLICATE_ENTRY: u16 = 1062;
/// ER_LOCK_WAIT_TIMEOUT
const LOCK_WAIT_TIMEOUT: u16 = 1205;
/// ER_LOCK_DEADLOCK
const DEADLOCK: u16 = 1213;

/// Map a SQLx error onto the storage contract
///
/// Duplicate keys, deadlocks and lock wait timeouts become
/// [`StorageError::Conflict`] so callers may retry the whole unit of work.
pub fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Database(db_err) => {
            let number = db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(MySqlDatabaseError::number);
            match number {
                Some(DUPLICATE_ENTRY | LOCK_WAIT_TIMEOUT | DEADLOCK) => StorageError::Conflict {
                    message: db_err.message().to_string(),
                },
                _ => StorageError::Query {
                    message: db_err.to_string(),
                },
            }
        }
        sqlx::Error::PoolTimedOut => StorageError::Timeout,
        sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Protocol(_) => StorageError::Connection {
            message: err.to_string(),
        },
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StorageError::Corrupt {
            message: err.to_string(),
        },
        other => StorageError::Query {
            message: other.to_string(),
        },
    }
}
