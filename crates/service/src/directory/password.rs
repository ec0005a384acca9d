use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use rand::rngs::OsRng;
use tracing::warn;

use crate::errors::DirectoryError;

/// Hash a plaintext password with argon2 and a fresh random salt.
///
/// The result is a PHC string (`$argon2id$v=19$...`) carrying its own
/// parameters and salt.
pub fn hash_password(plain: &str) -> Result<String, DirectoryError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| DirectoryError::Hash(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Constant-time check of `plain` against a stored PHC hash.
///
/// Empty or unparseable stored values never verify. Those come from records
/// written before hashing was enforced; they are reported and left untouched.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    if stored.is_empty() {
        return false;
    }
    let parsed = match PasswordHash::new(stored) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored password is not a recognised hash");
            return false;
        }
    };
    Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_never_equals_plaintext_and_verifies() -> Result<(), DirectoryError> {
        let hash = hash_password("secret12")?;
        assert_ne!(hash, "secret12");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret12", &hash));
        assert!(!verify_password("secret13", &hash));
        assert!(!verify_password("", &hash));
        Ok(())
    }

    #[test]
    fn salts_differ_between_hashes() -> Result<(), DirectoryError> {
        assert_ne!(hash_password("same-password")?, hash_password("same-password")?);
        Ok(())
    }

    #[test]
    fn legacy_values_do_not_verify() {
        assert!(!verify_password("secret12", ""));
        assert!(!verify_password("secret12", "secret12"));
    }
}
