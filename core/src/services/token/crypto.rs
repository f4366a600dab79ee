//! Hashing and random secret helpers.

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256, Sha512};

/// Rounds used whenever a key is derived with PBKDF2
pub const PBKDF2_ROUNDS: u32 = 100;

/// Length of a derived AES-256 key in bytes
pub const DERIVED_KEY_LEN: usize = 32;

/// Hex-encoded SHA-256 of a string
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// `len` bytes from the OS random source, hex-encoded
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Derive a 32-byte key from a secret and salt with PBKDF2-HMAC-SHA512
pub fn derive_key(secret: &[u8], salt: &[u8]) -> [u8; DERIVED_KEY_LEN] {
    let mut key = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha512>(secret, salt, PBKDF2_ROUNDS, &mut key);
    key
}

/// Generate a new signing secret (256 bits, hex-encoded)
pub fn generate_signing_secret() -> String {
    let mut secret = [0u8; 64];
    let mut salt = [0u8; 64];
    OsRng.fill_bytes(&mut secret);
    OsRng.fill_bytes(&mut salt);
    hex::encode(derive_key(&secret, &salt))
}
