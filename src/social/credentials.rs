//! Credential verification seam.
//!
//! Group passwords are hashed and checked by a collaborator. The crate ships
//! [`SaltedSha256Verifier`]; hosts with their own password scheme plug in a
//! different [`CredentialVerifier`].

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::error::Result;

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Hashes and verifies group passwords.
pub trait CredentialVerifier {
    /// Produces the stored form of a raw password.
    ///
    /// # Errors
    ///
    /// Returns `SocialError::Credential` if hashing fails.
    fn hash(&self, raw: &str) -> Result<String>;

    /// Checks a raw password against its stored form.
    fn verify(&self, raw: &str, stored: &str) -> bool;
}

impl<T: CredentialVerifier + ?Sized> CredentialVerifier for std::sync::Arc<T> {
    fn hash(&self, raw: &str) -> Result<String> {
        (**self).hash(raw)
    }

    fn verify(&self, raw: &str, stored: &str) -> bool {
        (**self).verify(raw, stored)
    }
}

/// Random-salted SHA-256, stored as `sha256$<salt hex>$<digest hex>`.
///
/// Comparison is constant-time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedSha256Verifier;

impl SaltedSha256Verifier {
    fn digest(salt: &[u8], raw: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(raw.as_bytes());
        hasher.finalize().into()
    }
}

impl CredentialVerifier for SaltedSha256Verifier {
    fn hash(&self, raw: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let digest = Self::digest(&salt, raw);
        Ok(format!(
            "{SCHEME}${}${}",
            hex::encode(salt),
            hex::encode(digest)
        ))
    }

    fn verify(&self, raw: &str, stored: &str) -> bool {
        let mut parts = stored.splitn(3, '$');
        let (Some(SCHEME), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
            return false;
        };

        let actual = Self::digest(&salt, raw);
        actual.as_slice().ct_eq(expected.as_slice()).into()
    }
}
