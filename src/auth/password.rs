//! Password hashing and verification.
//!
//! Stored credentials are Argon2id PHC strings. Rows written before hashing
//! was introduced still hold plaintext; those are reported as legacy so the
//! caller can rehash them. Every verification spends exactly one Argon2
//! verification, whatever the stored form, so response time does not tell
//! hashed rows, plaintext rows and unknown users apart.

use crate::error::AppError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use subtle::ConstantTimeEq;

#[derive(Debug, PartialEq, Eq)]
pub enum Verification {
    Valid,
    /// Matched a plaintext credential; should be rehashed.
    ValidLegacy,
    Invalid,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Credential(format!("password hashing failed: {}", e)))
}

pub fn is_password_hash(s: &str) -> bool {
    s.starts_with("$argon2") && PasswordHash::new(s).is_ok()
}

fn argon2_matches(candidate: &str, hash: &PasswordHash<'_>) -> bool {
    Argon2::default().verify_password(candidate.as_bytes(), hash).is_ok()
}

/// Fixed-length comparison, so neither length nor common prefix leaks.
fn digests_match(a: &str, b: &str) -> bool {
    let (a, b) = (Sha256::digest(a.as_bytes()), Sha256::digest(b.as_bytes()));
    bool::from(a.as_slice().ct_eq(b.as_slice()))
}

/// An empty candidate never verifies.
pub fn verify_stored(candidate: &str, stored: &str) -> Verification {
    let verdict = match PasswordHash::new(stored).ok().filter(|_| stored.starts_with("$argon2")) {
        Some(parsed) => {
            if argon2_matches(candidate, &parsed) {
                Verification::Valid
            } else {
                Verification::Invalid
            }
        }
        None => {
            verify_dummy(candidate);
            if !stored.is_empty() && digests_match(candidate, stored) {
                Verification::ValidLegacy
            } else {
                Verification::Invalid
            }
        }
    };
    if candidate.is_empty() {
        Verification::Invalid
    } else {
        verdict
    }
}

/// Spend the same work as a real verification when there is no stored hash.
pub fn verify_dummy(candidate: &str) {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    let dummy = DUMMY.get_or_init(|| hash_password("pantry-console-dummy").ok());
    if let Some(parsed) = dummy.as_deref().and_then(|h| PasswordHash::new(h).ok()) {
        let _ = argon2_matches(candidate, &parsed);
    }
}
