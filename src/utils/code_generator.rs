//! Short code generation.
//!
//! Codes are drawn uniformly at random from a fixed 62-character alphanumeric
//! alphabet using the operating system's cryptographically secure random
//! source. Collision resistance under concurrent callers matters more here
//! than raw throughput, so a statistical PRNG is not used.

use crate::error::AppError;
use serde_json::json;

/// Alphabet the short codes are drawn from.
pub const CODE_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest byte value usable without modulo bias (floor(256 / 62) * 62).
const UNBIASED_LIMIT: u8 = 248;

/// Generates a random short code of the given length.
///
/// Uses rejection sampling so every alphabet character is equally likely.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random source fails.
pub fn generate_code(length: usize) -> Result<String, AppError> {
    let mut code = String::with_capacity(length);
    let mut buffer = [0u8; 64];

    while code.len() < length {
        getrandom::fill(&mut buffer).map_err(|e| {
            AppError::internal(
                "System random source failed",
                json!({ "reason": e.to_string() }),
            )
        })?;

        for &byte in buffer.iter() {
            if byte < UNBIASED_LIMIT {
                code.push(CODE_ALPHABET[(byte % CODE_ALPHABET.len() as u8) as usize] as char);
                if code.len() == length {
                    break;
                }
            }
        }
    }

    Ok(code)
}

/// Returns true if every character of `code` belongs to the code alphabet.
pub fn is_alphabet_code(code: &str) -> bool {
    code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}
