//! Row decoding for the sessions and signing key tables.

use se_core::domain::entities::{Payload, SessionDataRecord, SessionRecord, SigningKey};
use se_core::errors::{StorageError, StorageResult};
use sqlx::mysql::MySqlRow;
use sqlx::Row;

use super::map_sqlx_error;

fn millis(row: &MySqlRow, column: &str) -> StorageResult<i64> {
    let value: u64 = row.try_get(column).map_err(map_sqlx_error)?;
    i64::try_from(value).map_err(|_| StorageError::Corrupt {
        message: format!("{} out of range: {}", column, value),
    })
}

fn payload(row: &MySqlRow, column: &str) -> StorageResult<Option<Payload>> {
    let raw: Option<String> = row.try_get(column).map_err(map_sqlx_error)?;
    raw.map(|text| {
        Payload::from_json_str(&text).map_err(|e| StorageError::Corrupt {
            message: format!("{} is not valid JSON: {}", column, e),
        })
    })
    .transpose()
}

pub(super) fn session_from_row(row: &MySqlRow) -> StorageResult<SessionRecord> {
    Ok(SessionRecord {
        session_handle_hash1: row.try_get("session_handle_hash1").map_err(map_sqlx_error)?,
        user_id: row.try_get("user_id").map_err(map_sqlx_error)?,
        refresh_token_hash2: row.try_get("refresh_token_hash2").map_err(map_sqlx_error)?,
        session_data: payload(row, "session_info")?,
        jwt_payload: payload(row, "jwt_payload")?.unwrap_or_default(),
        expires_at: millis(row, "expires_at")?,
    })
}

pub(super) fn session_data_from_row(row: &MySqlRow) -> StorageResult<SessionDataRecord> {
    Ok(SessionDataRecord {
        session_data: payload(row, "session_info")?,
        expires_at: millis(row, "expires_at")?,
    })
}

pub(super) fn signing_key_from_row(row: &MySqlRow) -> StorageResult<SigningKey> {
    Ok(SigningKey {
        key_name: row.try_get("key_name").map_err(map_sqlx_error)?,
        key_value: row.try_get("key_value").map_err(map_sqlx_error)?,
        created_at_time: millis(row, "created_at_time")?,
    })
}
