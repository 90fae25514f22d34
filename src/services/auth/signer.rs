/*
 * Responsibility
 * - HMAC-SHA256 over the encoded `header.payload` signing input
 * - verification compares in constant time (hmac's verify_slice)
 */
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of an HS256 MAC in bytes.
pub const MAC_LEN: usize = 32;

fn keyed(secret: &[u8]) -> HmacSha256 {
    // HMAC is defined for keys of any length (long keys are hashed, short ones padded),
    // so this constructor cannot fail for Hmac<Sha256>.
    match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    }
}

pub fn sign(message: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = keyed(secret);
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Recomputes the MAC and compares it with `candidate` without early exit.
pub fn verify(message: &[u8], secret: &[u8], candidate: &[u8]) -> bool {
    let mut mac = keyed(secret);
    mac.update(message);
    mac.verify_slice(candidate).is_ok()
}
