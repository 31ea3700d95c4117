//! Password hashing with Argon2id.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use blogbench_core::{CoreError, CoreResult};
use rand::rngs::OsRng;

/// Hashes a plaintext password into a PHC-format Argon2id string.
pub fn hash_password(password: &str) -> CoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| CoreError::internal(format!("password hashing failed: {err}")))?;
    Ok(hash.to_string())
}

/// Checks a plaintext password against a stored PHC-format hash.
///
/// A malformed stored hash is an error; a non-matching password is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> CoreResult<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| CoreError::internal(format!("stored password hash is invalid: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let first = hash_password("hunter2").expect("hashing should succeed");
        let second = hash_password("hunter2").expect("hashing should succeed");

        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second);

        assert!(verify_password("hunter2", &first).expect("verification should succeed"));
        assert!(verify_password("hunter2", &second).expect("verification should succeed"));
        assert!(!verify_password("wrong", &first).expect("verification should succeed"));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("hunter2", "not-a-phc-string").is_err());
    }
}
