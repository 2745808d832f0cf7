//! Argon2id password hashes stored in `users.password_hash`.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Well-formed hash of a random secret nobody knows. Logins for unknown
/// emails are checked against it so they cost as much as real ones.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$Agh2Wr4I4LGUh5T66BmxvA$wMf9LEfLl+nS73g5us6CC5tByf+3smI1Ouk6zkcQ5bo";

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!("hash password: {e}")
        })
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is corrupt.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "stored password hash unreadable");
        anyhow::anyhow!("parse password hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Spends one full verification and always reports a mismatch.
pub fn verify_dummy(plain: &str) -> bool {
    matches!(verify_password(plain, DUMMY_HASH), Ok(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_is_argon2id_and_checks_out() {
        let hash = hash_password("testpass123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("testpass123", &hash).unwrap());
        assert!(!verify_password("testpass124", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        assert_ne!(hash_password("samepass1").unwrap(), hash_password("samepass1").unwrap());
    }

    #[test]
    fn corrupt_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("anything", "plaintext-password").is_err());
    }

    #[test]
    fn dummy_hash_parses_and_never_matches() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        assert!(!verify_password("testpass123", DUMMY_HASH).unwrap());
        assert!(!verify_dummy(""));
    }
}
