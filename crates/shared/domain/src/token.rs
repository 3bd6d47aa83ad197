//! Random tokens: remember-me auth keys and password reset tokens.
//!
//! A password reset token has the shape `<random>_<unix seconds>`. The random
//! part may itself contain `_`, so the timestamp is always the text after the
//! final separator.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

use crate::constants::{AUTH_KEY_LENGTH, RESET_TOKEN_RANDOM_LENGTH, RESET_TOKEN_SEPARATOR};

/// Generate a cryptographically random URL-safe string of exactly `len` characters.
pub fn random_string(len: usize) -> String {
    // 4 output characters per 3 input bytes
    let mut bytes = vec![0u8; (len * 3).div_ceil(4)];
    rand::thread_rng().fill_bytes(&mut bytes);

    let mut encoded = URL_SAFE_NO_PAD.encode(&bytes);
    encoded.truncate(len);
    encoded
}

/// Generate a new remember-me authentication key.
pub fn generate_auth_key() -> String {
    random_string(AUTH_KEY_LENGTH)
}

/// Generate a password reset token stamped with `issued_at` (unix seconds).
pub fn generate_password_reset_token(issued_at: i64) -> String {
    format!(
        "{}{}{}",
        random_string(RESET_TOKEN_RANDOM_LENGTH),
        RESET_TOKEN_SEPARATOR,
        issued_at
    )
}

/// Extract the issue timestamp from a password reset token.
///
/// Returns `None` when there is no separator or the text after the last
/// separator is not a plain non-negative decimal number.
pub fn reset_token_timestamp(token: &str) -> Option<i64> {
    let (_, suffix) = token.rsplit_once(RESET_TOKEN_SEPARATOR)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Check whether a password reset token is well formed and not yet expired.
///
/// A token issued at `t` is valid while `t + expire_seconds >= now`.
pub fn is_password_reset_token_valid(token: &str, expire_seconds: i64, now: i64) -> bool {
    match reset_token_timestamp(token) {
        Some(issued_at) => issued_at.saturating_add(expire_seconds) >= now,
        None => false,
    }
}

/// Compare two strings without short-circuiting on the first differing byte.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
