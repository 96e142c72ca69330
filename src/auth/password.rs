use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

pub type HashError = argon2::password_hash::Error;

/// Outcome of checking a password against a stored digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Valid,
    /// Matched an unsalted sha256 digest; the caller should store a fresh hash.
    ValidLegacy,
    Invalid,
}

pub fn hash_password(password: &str) -> Result<String, HashError> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

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
        Err(_) if is_legacy_digest(stored) => {
            if legacy_digest(password).eq_ignore_ascii_case(stored) {
                Verification::ValidLegacy
            } else {
                Verification::Invalid
            }
        }
        Err(_) => Verification::Invalid,
    }
}

/// Argon2 hash of a throwaway password, built on first use.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_password("not-a-real-password").unwrap_or_default());

/// Spends one argon2 verification for a login whose email is unknown, so
/// response time does not tell registered emails apart.
pub fn verify_against_dummy(password: &str) {
    let _ = verify_password(password, &DUMMY_HASH);
}

/// Rows written by the earlier deployment hold a bare sha256 hex digest.
fn is_legacy_digest(stored: &str) -> bool {
    stored.len() == 64 && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
