//! Unit tests for signed access tokens

use serde_json::json;

use crate::domain::entities::{AccessTokenPayload, Payload};
use crate::errors::TokenError;
use crate::services::token::{access_token, generate_signing_secret, sha256_hex};

fn sample_payload() -> AccessTokenPayload {
    AccessTokenPayload {
        session_handle: "handle-1".to_string(),
        user_id: "u1".to_string(),
        refresh_token_hash1: sha256_hex("refresh"),
        parent_refresh_token_hash1: Some(sha256_hex("parent")),
        expiry_time: 1_700_000_000_000,
        user_payload: Payload::from_value(json!({"role": "admin"})),
    }
}

#[test]
fn test_encode_then_verify() {
    let key = generate_signing_secret();
    let payload = sample_payload();

    let token = access_token::encode(&payload, &key).unwrap();
    assert_eq!(token.split('.').count(), 3);

    let decoded: AccessTokenPayload = access_token::verify_as(&token, &key).unwrap();
    assert_eq!(decoded, payload);
}

#[test]
fn test_signature_is_hex_hmac() {
    let token = access_token::encode(&json!({"a": 1}), "key").unwrap();
    let signature = token.rsplit('.').next().unwrap();

    assert_eq!(signature.len(), 64);
    assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_any_flipped_signature_byte_is_rejected() {
    let key = "secret";
    let token = access_token::encode(&json!({"a": 1}), key).unwrap();
    let signature_start = token.rfind('.').unwrap() + 1;

    for i in signature_start..token.len() {
        let mut bytes = token.clone().into_bytes();
        bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(
            access_token::verify(&tampered, key),
            Err(TokenError::SignatureMismatch),
            "flipped byte {} was accepted",
            i
        );
    }
}

#[test]
fn test_wrong_key_is_rejected() {
    let token = access_token::encode(&sample_payload(), "old-key").unwrap();
    assert_eq!(
        access_token::verify(&token, "new-key"),
        Err(TokenError::SignatureMismatch)
    );
}

#[test]
fn test_malformed_tokens() {
    assert_eq!(access_token::verify("a.b", "k"), Err(TokenError::InvalidFormat));
    assert_eq!(access_token::verify("a.b.c.d", "k"), Err(TokenError::InvalidFormat));

    let token = access_token::encode(&json!({"a": 1}), "k").unwrap();
    let swapped_header = format!("eyJhbGciOiJub25lIn0{}", &token[token.find('.').unwrap()..]);
    assert_eq!(
        access_token::verify(&swapped_header, "k"),
        Err(TokenError::HeaderMismatch)
    );
}

#[test]
fn test_non_object_payload_is_rejected() {
    assert_eq!(
        access_token::encode(&json!([1, 2, 3]), "k"),
        Err(TokenError::NonObjectPayload)
    );
    assert_eq!(
        access_token::encode(&"just a string", "k"),
        Err(TokenError::NonObjectPayload)
    );
}

#[test]
fn test_verify_as_reports_missing_fields() {
    let token = access_token::encode(&json!({"userId": "u1"}), "k").unwrap();
    let result = access_token::verify_as::<AccessTokenPayload>(&token, "k");
    assert!(matches!(result, Err(TokenError::InvalidPayload { .. })));
}
