//! Signed access tokens
//!
//! Format: `base64url(header).base64url(payload).hex(hmac_sha256(header.payload))`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::errors::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// The only header this codec emits or accepts
static HEADER: Lazy<String> =
    Lazy::new(|| URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#));

fn sign(signing_input: &str, key: &str) -> Result<String, TokenError> {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| TokenError::EncodingFailed {
            message: e.to_string(),
        })?;
    mac.update(signing_input.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sign a payload; it must serialize to a JSON object
pub fn encode<T: Serialize>(payload: &T, key: &str) -> Result<String, TokenError> {
    let value = serde_json::to_value(payload).map_err(|e| TokenError::EncodingFailed {
        message: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(TokenError::NonObjectPayload);
    }

    let body = URL_SAFE_NO_PAD.encode(value.to_string());
    let signing_input = format!("{}.{}", HEADER.as_str(), body);
    let signature = sign(&signing_input, key)?;
    Ok(format!("{}.{}", signing_input, signature))
}

/// Verify a token and return its payload object
pub fn verify(token: &str, key: &str) -> Result<Map<String, Value>, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::InvalidFormat);
    }
    if parts[0] != HEADER.as_str() {
        return Err(TokenError::HeaderMismatch);
    }

    let expected = sign(&format!("{}.{}", parts[0], parts[1]), key)?;
    if !constant_time_eq(expected.as_bytes(), parts[2].as_bytes()) {
        return Err(TokenError::SignatureMismatch);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| TokenError::InvalidFormat)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TokenError::NonObjectPayload),
        Err(_) => Err(TokenError::InvalidFormat),
    }
}

/// Verify a token and deserialize its payload
pub fn verify_as<T: DeserializeOwned>(token: &str, key: &str) -> Result<T, TokenError> {
    let map = verify(token, key)?;
    serde_json::from_value(Value::Object(map)).map_err(|e| TokenError::InvalidPayload {
        message: e.to_string(),
    })
}
