//! PIN hashing.
//!
//! Stored hashes look like `<salt>$<mac>`: a random 16-byte salt and the
//! HMAC-SHA256 of `mobile:pin` keyed by that salt, both hex encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SALT_LEN: usize = 16;

fn mac(salt: &[u8], mobile: &str, pin: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC can take key of any size");
    mac.update(mobile.as_bytes());
    mac.update(b":");
    mac.update(pin.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Hashes a PIN for the account identified by `mobile` under a fresh salt.
pub fn hash_pin(mobile: &str, pin: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    format!("{}${}", hex::encode(salt), mac(&salt, mobile, pin))
}

/// Verifies a PIN against a stored hash using constant-time comparison.
///
/// Malformed stored hashes never verify.
pub fn verify_pin(mobile: &str, pin: &str, stored_hash: &str) -> bool {
    let Some((salt, expected)) = stored_hash.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };
    mac(&salt, mobile, pin)
        .as_bytes()
        .ct_eq(expected.as_bytes())
        .into()
}
