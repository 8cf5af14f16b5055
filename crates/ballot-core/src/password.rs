//! One-way password hashing.
//!
//! The core never sees plaintext after registration: it stores whatever
//! [`PasswordHasher::hash`] returns and later asks [`PasswordHasher::verify`].
//! [`Argon2Hasher`] is the default implementation. It also verifies the
//! werkzeug `pbkdf2:` and `scrypt:` hashes found in data files written by
//! earlier deployments, but never produces them.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::{BallotError, Result};
use crate::werkzeug::WerkzeugHash;

/// Opaque one-way hash-and-verify capability.
pub trait PasswordHasher: Send + Sync {
    /// Hash a secret into a self-describing string.
    fn hash(&self, secret: &str) -> Result<String>;

    /// Check a secret against a stored hash. A malformed hash never matches.
    fn verify(&self, secret: &str, hash: &str) -> bool;

    /// Whether `hash` is in a format [`verify`](Self::verify) can match.
    fn recognizes(&self, hash: &str) -> bool;
}

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$...`).
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Argon2id with the crate's recommended parameters.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Argon2id with explicit cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<String> {
        let salt_bytes: [u8; 16] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| BallotError::PasswordHash(e.to_string()))?;
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| BallotError::PasswordHash(e.to_string()))
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        if let Ok(parsed) = PasswordHash::new(hash) {
            return self
                .argon2
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok();
        }
        WerkzeugHash::parse(hash).is_some_and(|legacy| legacy.verify(secret))
    }

    fn recognizes(&self, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => parsed.algorithm.as_str().starts_with("argon2"),
            Err(_) => WerkzeugHash::parse(hash).is_some(),
        }
    }
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> Argon2Hasher {
    let params = Params::new(8, 1, 1, None).expect("valid argon2 params");
    Argon2Hasher::with_params(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_original_secret() {
        let hasher = cheap_hasher();
        let hash = hasher.hash("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("wrong horse", &hash));
    }

    #[test]
    fn hash_never_contains_plaintext() {
        let hasher = cheap_hasher();
        let hash = hasher.hash("plaintext-secret").unwrap();
        assert!(!hash.contains("plaintext-secret"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let hasher = cheap_hasher();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_does_not_verify() {
        let hasher = cheap_hasher();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn werkzeug_hashes_verify() {
        let hasher = cheap_hasher();
        let pbkdf2 = "pbkdf2:sha256:1000$Nq3pXyZbL0vRk2Ds$56bbe78b942388b946cda27866e4c6cdaff9c6ceab3f9ef3fdb296f2d5c4b67f";
        let scrypt = "scrypt:1024:8:1$Nq3pXyZbL0vRk2Ds$939de57b2e4e982db180b7a93aeb92f180ba7b95dcd2fe9e5219cec560b0db700e3acd3eeedc51170c593c065d12ef7a1b93426b81c7775f22cc6882fafaf036";
        for stored in [pbkdf2, scrypt] {
            assert!(hasher.recognizes(stored));
            assert!(hasher.verify("pw", stored));
            assert!(!hasher.verify("wrong", stored));
        }
    }

    #[test]
    fn recognizes_only_verifiable_formats() {
        let hasher = cheap_hasher();
        assert!(hasher.recognizes(&hasher.hash("x").unwrap()));
        assert!(!hasher.recognizes("not-a-phc-string"));
        assert!(!hasher.recognizes("$scrypt$ln=10,r=8,p=1$c2FsdA$aGFzaA"));
        assert!(!hasher.recognizes("md5$salt$00"));
    }

    #[test]
    fn default_params_verify_cheap_hashes() {
        // Parameters are encoded in the hash, so any Argon2 instance verifies.
        let hash = cheap_hasher().hash("secret").unwrap();
        assert!(Argon2Hasher::new().verify("secret", &hash));
    }
}
