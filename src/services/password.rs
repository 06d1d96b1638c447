use argon2::{
    Algorithm, Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::error::{AppError, AppResult};

/// Hashes a password for storage. Values that already are complete argon2
/// PHC strings are returned untouched so a hash is never hashed twice.
pub fn hash_password(password: &str) -> AppResult<String> {
    if looks_hashed(password) {
        return Ok(password.to_string());
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// A real argon2 variant with an actual hash part. `$argon2$Abcdefg1` is a
/// valid password, not a hash.
fn looks_hashed(value: &str) -> bool {
    PasswordHash::new(value)
        .is_ok_and(|h| Algorithm::new(h.algorithm.as_str()).is_ok() && h.hash.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Password123!").unwrap();
        assert_ne!(hash, "Password123!");
        assert!(verify_password("Password123!", &hash).unwrap());
        assert!(!verify_password("Wrong123!", &hash).unwrap());
    }

    #[test]
    fn hashing_is_idempotent() {
        let hash = hash_password("Password123!").unwrap();
        assert_eq!(hash_password(&hash).unwrap(), hash);
    }

    #[test]
    fn dollar_prefixed_plain_text_is_still_hashed() {
        let hash = hash_password("$argon2-not-really").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("$argon2-not-really", &hash).unwrap());
    }

    #[test]
    fn password_shaped_like_phc_prefix_is_hashed() {
        let hash = hash_password("$argon2$Abcdefg1").unwrap();
        assert_ne!(hash, "$argon2$Abcdefg1");
        assert!(verify_password("$argon2$Abcdefg1", &hash).unwrap());
    }
}
