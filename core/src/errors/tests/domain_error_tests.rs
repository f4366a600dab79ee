//! Unit tests for engine error types

use std::error::Error;

use crate::errors::{DomainError, StorageError, TokenError};

#[test]
fn test_error_codes() {
    assert_eq!(DomainError::general("boom").code(), "GENERAL_ERROR");
    assert_eq!(DomainError::unauthorised("gone").code(), "UNAUTHORISED");
    assert_eq!(
        DomainError::try_refresh_token("expired").code(),
        "TRY_REFRESH_TOKEN"
    );
}

#[test]
fn test_storage_error_becomes_general() {
    let err: DomainError = StorageError::Connection {
        message: "refused".to_string(),
    }
    .into();

    assert!(err.is_general());
    let source = err.source().expect("storage cause is kept");
    assert!(source.to_string().contains("refused"));
}

#[test]
fn test_general_with_token_error_source() {
    let err = DomainError::general_with("could not sign", TokenError::EncodingFailed {
        message: "bad key".to_string(),
    });

    assert!(err.is_general());
    assert!(err.to_string().contains("could not sign"));
    assert!(err.source().is_some());
}

#[test]
fn test_kind_predicates() {
    let err = DomainError::unauthorised("session does not exist");
    assert!(err.is_unauthorised());
    assert!(!err.is_general());
    assert!(!err.is_try_refresh_token());
    assert!(err.to_string().contains("session does not exist"));
}

#[test]
fn test_storage_conflict_predicate() {
    assert!(StorageError::Conflict {
        message: "Duplicate entry".to_string()
    }
    .is_conflict());
    assert!(!StorageError::Timeout.is_conflict());
}
