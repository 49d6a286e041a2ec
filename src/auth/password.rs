use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
// rand_core 0.6 is what password-hash/argon2 depends on; must match that version.
use rand_core::OsRng;
use sha2::{Digest, Sha256};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Valid,
    /// Matched a cleartext record; the caller should store a hash instead.
    ValidLegacy,
    Invalid,
}

/// Hash a password with argon2id and return the PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?
        .to_string();
    Ok(hash)
}

/// Check `password` against a stored value. Anything that does not parse as a
/// PHC string is treated as a legacy cleartext password.
pub fn verify_password(password: &str, stored: &str) -> Verification {
    match PasswordHash::new(stored) {
        Ok(parsed) => {
            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
            {
                Verification::Valid
            } else {
                Verification::Invalid
            }
        }
        Err(_) if secrets_match(password, stored) => Verification::ValidLegacy,
        Err(_) => Verification::Invalid,
    }
}

/// Exact equality of two secrets without an early exit on the first
/// differing byte. Both sides are digested first so lengths do not leak.
pub fn secrets_match(a: &str, b: &str) -> bool {
    let da = Sha256::digest(a.as_bytes());
    let db = Sha256::digest(b.as_bytes());
    da.iter().zip(db.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
