//! Verification of hashes written by werkzeug's `generate_password_hash`.
//!
//! Layout: `<method>$<salt>$<hex digest>` where `method` is
//! `pbkdf2:<sha256|sha512>:<iterations>` or `scrypt:<n>:<r>:<p>`. The salt is
//! used as its raw UTF-8 bytes. These hashes are verified, never produced.

use sha2::{Sha256, Sha512};

#[derive(Debug)]
enum Kdf {
    Pbkdf2Sha256 { iterations: u32 },
    Pbkdf2Sha512 { iterations: u32 },
    Scrypt(scrypt::Params),
}

/// A parsed werkzeug hash, borrowing its salt from the stored string.
#[derive(Debug)]
pub(crate) struct WerkzeugHash<'a> {
    kdf: Kdf,
    salt: &'a str,
    digest: Vec<u8>,
}

impl<'a> WerkzeugHash<'a> {
    /// `None` unless `hash` is a werkzeug hash with parameters this module
    /// can evaluate.
    pub(crate) fn parse(hash: &'a str) -> Option<Self> {
        let mut parts = hash.splitn(3, '$');
        let method = parts.next()?;
        let salt = parts.next()?;
        let digest = hex::decode(parts.next()?).ok()?;
        if salt.is_empty() {
            return None;
        }
        let kdf = parse_method(method, digest.len())?;
        Some(Self { kdf, salt, digest })
    }

    pub(crate) fn verify(&self, secret: &str) -> bool {
        let mut derived = vec![0u8; self.digest.len()];
        let (secret, salt) = (secret.as_bytes(), self.salt.as_bytes());
        match &self.kdf {
            Kdf::Pbkdf2Sha256 { iterations } => {
                pbkdf2::pbkdf2_hmac::<Sha256>(secret, salt, *iterations, &mut derived)
            }
            Kdf::Pbkdf2Sha512 { iterations } => {
                pbkdf2::pbkdf2_hmac::<Sha512>(secret, salt, *iterations, &mut derived)
            }
            Kdf::Scrypt(params) => {
                if scrypt::scrypt(secret, salt, params, &mut derived).is_err() {
                    return false;
                }
            }
        }
        constant_time_eq(&derived, &self.digest)
    }
}

/// The digest length must match what werkzeug emits for the method:
/// the hash size for pbkdf2, 64 bytes for scrypt.
fn parse_method(method: &str, digest_len: usize) -> Option<Kdf> {
    let mut fields = method.split(':');
    let kdf = match (fields.next()?, fields.next()?, fields.next()?) {
        ("pbkdf2", "sha256", iterations) if digest_len == 32 => Kdf::Pbkdf2Sha256 {
            iterations: positive(iterations)?,
        },
        ("pbkdf2", "sha512", iterations) if digest_len == 64 => Kdf::Pbkdf2Sha512 {
            iterations: positive(iterations)?,
        },
        ("scrypt", n, r) if digest_len == 64 => {
            let n: u64 = n.parse().ok()?;
            if n < 2 || !n.is_power_of_two() {
                return None;
            }
            let log_n = u8::try_from(n.trailing_zeros()).ok()?;
            let p = positive(fields.next()?)?;
            Kdf::Scrypt(scrypt::Params::new(log_n, positive(r)?, p, digest_len).ok()?)
        }
        _ => return None,
    };
    fields.next().is_none().then_some(kdf)
}

fn positive(field: &str) -> Option<u32> {
    field.parse().ok().filter(|&n| n > 0)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // Produced by werkzeug 3.1 `generate_password_hash("pw", ...)` with a
    // fixed salt and low cost.
    const PBKDF2_SHA256: &str = "pbkdf2:sha256:1000$Nq3pXyZbL0vRk2Ds$56bbe78b942388b946cda27866e4c6cdaff9c6ceab3f9ef3fdb296f2d5c4b67f";
    const PBKDF2_SHA512: &str = "pbkdf2:sha512:1000$Nq3pXyZbL0vRk2Ds$bc98538995354ea131a1cd48bce48aafdcb662da4b540c7701181d3635ef68a6dd55a075516e2d485cc39c07ecc1cdd1fcd7798fe964ec4cb627450c7045bea2";
    const SCRYPT: &str = "scrypt:1024:8:1$Nq3pXyZbL0vRk2Ds$939de57b2e4e982db180b7a93aeb92f180ba7b95dcd2fe9e5219cec560b0db700e3acd3eeedc51170c593c065d12ef7a1b93426b81c7775f22cc6882fafaf036";

    #[test]
    fn pbkdf2_hashes_verify() {
        for stored in [PBKDF2_SHA256, PBKDF2_SHA512] {
            let parsed = WerkzeugHash::parse(stored).unwrap();
            assert!(parsed.verify("pw"), "{stored}");
            assert!(!parsed.verify("pw2"), "{stored}");
        }
    }

    #[test]
    fn scrypt_hashes_verify() {
        let parsed = WerkzeugHash::parse(SCRYPT).unwrap();
        assert!(parsed.verify("pw"));
        assert!(!parsed.verify(""));
    }

    #[test]
    fn tampered_digest_does_not_verify() {
        let tampered = PBKDF2_SHA256.replace("$56bb", "$57bb");
        assert!(!WerkzeugHash::parse(&tampered).unwrap().verify("pw"));
    }

    #[test]
    fn unsupported_layouts_are_not_parsed() {
        let d32 = "00".repeat(32);
        let d64 = "00".repeat(64);
        for stored in [
            String::new(),
            "plain".to_string(),
            format!("pbkdf2:sha256$salt${d32}"),
            format!("pbkdf2:sha1:1000$salt${}", "00".repeat(20)),
            format!("pbkdf2:sha256:0$salt${d32}"),
            format!("pbkdf2:sha256:1000$${d32}"),
            format!("pbkdf2:sha256:1000$salt${d64}"),
            "pbkdf2:sha256:1000$salt$not-hex".to_string(),
            format!("scrypt:1000:8:1$salt${d64}"),
            format!("scrypt:1024:8$salt${d64}"),
            format!("scrypt:1024:8:1:9$salt${d64}"),
        ] {
            assert!(WerkzeugHash::parse(&stored).is_none(), "{stored:?}");
        }
    }
}
