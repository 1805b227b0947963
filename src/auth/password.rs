//! Argon2id password hashing.
//!
//! Rows written by the old site hold bcrypt hashes (`$2y$` and friends). Those
//! still verify, and [`needs_rehash`] tells the login flow to upgrade them.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid Argon2 parameters: {0}")]
    InvalidParams(String),
    #[error("password hashing error: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Work factor for the adaptive hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashes new passwords and verifies stored PHC strings.
#[derive(Clone, Debug)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// # Errors
    /// Returns [`PasswordError::InvalidParams`] if argon2 rejects the cost.
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// Returns [`PasswordError::Hash`] if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Check `password` against a stored hash.
    ///
    /// The cost parameters embedded in the stored hash are used, so hashes
    /// written with an older work factor keep verifying.
    ///
    /// # Errors
    /// Returns [`PasswordError::MalformedHash`] if `stored` is neither an
    /// Argon2 PHC string nor a bcrypt hash.
    pub fn verify(&self, stored: &str, password: &str) -> Result<bool, PasswordError> {
        if is_bcrypt_hash(stored) {
            return bcrypt::verify(password, stored)
                .map_err(|e| PasswordError::MalformedHash(e.to_string()));
        }

        let parsed =
            PasswordHash::new(stored).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }
}

/// True if `value` looks like an Argon2 PHC string.
fn is_phc_hash(value: &str) -> bool {
    value.starts_with("$argon2")
}

fn is_bcrypt_hash(value: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

/// True if `value` is a hash [`CredentialHasher::verify`] understands.
pub(crate) fn is_password_hash(value: &str) -> bool {
    is_phc_hash(value) || is_bcrypt_hash(value)
}

/// True if a verified hash should be replaced with a fresh Argon2id one.
#[must_use]
pub fn needs_rehash(stored: &str) -> bool {
    !is_phc_hash(stored)
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    // Smallest cost argon2 accepts; keeps the suite fast.
    let cost = HashCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    match CredentialHasher::new(cost) {
        Ok(hasher) => hasher,
        Err(e) => panic!("test hasher: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() -> Result<(), PasswordError> {
        let hasher = test_hasher();
        for password in ["password1", "contraseña segura", "12345678"] {
            let hash = hasher.hash(password)?;
            assert!(is_phc_hash(&hash));
            assert!(hasher.verify(&hash, password)?);
        }
        Ok(())
    }

    #[test]
    fn verify_rejects_other_password() -> Result<(), PasswordError> {
        let hasher = test_hasher();
        let hash = hasher.hash("password1")?;
        assert!(!hasher.verify(&hash, "password2")?);
        assert!(!hasher.verify(&hash, "password1 ")?);
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<(), PasswordError> {
        let hasher = test_hasher();
        assert_ne!(hasher.hash("password1")?, hasher.hash("password1")?);
        Ok(())
    }

    #[test]
    fn verify_reports_malformed_hash() {
        let hasher = test_hasher();
        let result = hasher.verify("not-a-hash", "password1");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[test]
    fn verify_accepts_hash_with_different_cost() -> Result<(), PasswordError> {
        let stronger = CredentialHasher::new(HashCost {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })?;
        let hash = stronger.hash("password1")?;
        assert!(test_hasher().verify(&hash, "password1")?);
        Ok(())
    }

    // Output of PHP `password_hash("rasmuslerdorf", PASSWORD_BCRYPT)`.
    const PHP_BCRYPT: &str = "$2y$10$.vGA1O9wmRjrwAVXD98HNOgsNpDczlqm3Jq7KnEd1rVAGv3Fykk1a";

    #[test]
    fn verify_accepts_php_bcrypt_hash() -> Result<(), PasswordError> {
        let hasher = test_hasher();
        assert!(hasher.verify(PHP_BCRYPT, "rasmuslerdorf")?);
        assert!(!hasher.verify(PHP_BCRYPT, "rasmuslerdorf2")?);
        assert!(is_password_hash(PHP_BCRYPT));
        assert!(needs_rehash(PHP_BCRYPT));
        Ok(())
    }

    #[test]
    fn argon2_hashes_do_not_need_rehash() -> Result<(), PasswordError> {
        let hash = test_hasher().hash("password1")?;
        assert!(!needs_rehash(&hash));
        Ok(())
    }

    #[test]
    fn verify_reports_truncated_bcrypt_hash() {
        let result = test_hasher().verify("$2y$10$short", "password1");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[test]
    fn invalid_cost_is_rejected() {
        let result = CredentialHasher::new(HashCost {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(PasswordError::InvalidParams(_))));
    }
}
