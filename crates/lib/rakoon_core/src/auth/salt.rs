//! Password salt generation.

use rand::{Rng, rng};

/// Salt length used for stored credentials.
pub const SALT_LENGTH: usize = 10;

const LETTERS: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate `length` characters drawn uniformly from `[a-zA-Z]`.
pub fn generate_salt(length: usize) -> String {
    let mut rng = rng();
    (0..length)
        .map(|_| char::from(LETTERS[rng.random_range(0..LETTERS.len())]))
        .collect()
}
