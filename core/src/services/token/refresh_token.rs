//! Encrypted refresh tokens
//!
//! A token is `base64(salt || iv || tag || ciphertext) + "." + nonce`. The AES
//! key is derived per token from the signing secret and the random salt, and
//! the plaintext repeats the nonce so a swapped suffix is detected.

use aes_gcm::{
    aead::{generic_array::GenericArray, AeadInPlace, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};

use crate::domain::entities::RefreshTokenPayload;
use crate::errors::TokenError;

use super::crypto::derive_key;

const SALT_LEN: usize = 64;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under a key derived from `secret`
pub fn encrypt(plaintext: &str, secret: &str) -> Result<String, TokenError> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let key = derive_key(secret.as_bytes(), &salt);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| TokenError::EncodingFailed {
        message: e.to_string(),
    })?;

    let mut buffer = plaintext.as_bytes().to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| TokenError::EncodingFailed {
            message: e.to_string(),
        })?;

    let mut out = Vec::with_capacity(SALT_LEN + IV_LEN + TAG_LEN + buffer.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&iv);
    out.extend_from_slice(tag.as_slice());
    out.extend_from_slice(&buffer);
    Ok(BASE64.encode(out))
}

/// Decrypt and authenticate a value produced by [`encrypt`]
pub fn decrypt(encoded: &str, secret: &str) -> Result<String, TokenError> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|_| TokenError::InvalidRefreshTokenFormat)?;
    if raw.len() < SALT_LEN + IV_LEN + TAG_LEN {
        return Err(TokenError::InvalidRefreshTokenFormat);
    }

    let (salt, rest) = raw.split_at(SALT_LEN);
    let (iv, rest) = rest.split_at(IV_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let key = derive_key(secret.as_bytes(), salt);
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|_| TokenError::RefreshTokenDecryptionFailed)?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(iv),
            b"",
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| TokenError::RefreshTokenDecryptionFailed)?;

    String::from_utf8(buffer).map_err(|_| TokenError::RefreshTokenDecryptionFailed)
}

/// Serialize and encrypt a refresh token payload
pub fn encode(payload: &RefreshTokenPayload, secret: &str) -> Result<String, TokenError> {
    let plaintext = serde_json::to_string(payload).map_err(|e| TokenError::EncodingFailed {
        message: e.to_string(),
    })?;
    Ok(format!("{}.{}", encrypt(&plaintext, secret)?, payload.nonce))
}

/// Decrypt a refresh token and check its nonce against the plaintext suffix
pub fn decode(token: &str, secret: &str) -> Result<RefreshTokenPayload, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(TokenError::InvalidRefreshTokenFormat);
    }

    let plaintext = decrypt(parts[0], secret)?;
    let payload: RefreshTokenPayload =
        serde_json::from_str(&plaintext).map_err(|e| TokenError::InvalidPayload {
            message: e.to_string(),
        })?;

    if payload.nonce != parts[1] {
        return Err(TokenError::NonceMismatch);
    }
    Ok(payload)
}
