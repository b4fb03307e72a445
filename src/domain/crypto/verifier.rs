//! Seam to the platform signature primitives.

use super::public_key::{EcPublicKey, RsaPublicKey};
use super::HashAlgorithm;

/// Checks a signature over a precomputed digest.
///
/// Implementations return `false` for any failure, including keys or
/// signatures the provider cannot import.
pub trait SignatureVerifier: Send + Sync {
    /// RSASSA-PKCS1-v1_5 over `digest`, which was produced by `algorithm`.
    fn verify_rsa(
        &self,
        key: &RsaPublicKey,
        algorithm: HashAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> bool;

    /// ECDSA over `digest`. `signature` is fixed-width `r || s`.
    fn verify_ecdsa(&self, key: &EcPublicKey, digest: &[u8], signature: &[u8]) -> bool;
}
