//! Password and PIN hashing
//!
//! Services only see the [`CredentialHasher`] trait; [`Argon2Hasher`] is the
//! production implementation (Argon2id, PHC string format).

use crate::error::{BusinessError, BusinessResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

/// Hashes secrets and verifies candidates against stored hashes
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, secret: &str) -> BusinessResult<String>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable
    fn verify(&self, candidate: &str, hash: &str) -> BusinessResult<bool>;
}

/// Argon2id hasher
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with explicit cost parameters (memory KiB, iterations, lanes)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> BusinessResult<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| BusinessError::Hashing(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> BusinessResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| BusinessError::Hashing(e.to_string()))
    }

    fn verify(&self, candidate: &str, hash: &str) -> BusinessResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| BusinessError::Hashing(format!("stored hash is invalid: {e}")))?;

        match self.argon2.verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(other) => Err(BusinessError::Hashing(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("s3cret!").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("s3cret!", &hash).unwrap());
        assert!(!hasher.verify("s3cret?", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = hasher();
        assert_ne!(hasher.hash("1234").unwrap(), hasher.hash("1234").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(hasher().verify("x", "not-a-phc-string").is_err());
    }
}
