//! Hash algorithm domain type.
//!
//! The `HashAlgorithm` enumeration lives at the crate root; this module adds
//! the digest OID mapping and RustCrypto hasher construction.

pub use crate::HashAlgorithm;

use crate::domain::constants::{MD5_OID, SHA1_OID, SHA256_OID, SHA384_OID, SHA512_OID};
use crate::infra::error::{VerifyError, VerifyResult};
use sha2::digest::DynDigest;
use sha2::Digest;

impl HashAlgorithm {
    /// Maps a digest algorithm OID. Unknown OIDs are an error.
    pub fn from_oid(oid: &str) -> VerifyResult<Self> {
        match oid {
            MD5_OID => Ok(HashAlgorithm::Md5),
            SHA1_OID => Ok(HashAlgorithm::Sha1),
            SHA256_OID => Ok(HashAlgorithm::Sha256),
            SHA384_OID => Ok(HashAlgorithm::Sha384),
            SHA512_OID => Ok(HashAlgorithm::Sha512),
            other => Err(VerifyError::UnsupportedAlgorithm(format!(
                "digest algorithm {other}"
            ))),
        }
    }

    #[must_use]
    pub fn oid(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => MD5_OID,
            HashAlgorithm::Sha1 => SHA1_OID,
            HashAlgorithm::Sha256 => SHA256_OID,
            HashAlgorithm::Sha384 => SHA384_OID,
            HashAlgorithm::Sha512 => SHA512_OID,
        }
    }

    /// Fresh incremental hasher for this algorithm.
    #[must_use]
    pub fn hasher(&self) -> Box<dyn DynDigest + Send> {
        match self {
            HashAlgorithm::Md5 => Box::new(md5::Md5::new()),
            HashAlgorithm::Sha1 => Box::new(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => Box::new(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => Box::new(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => Box::new(sha2::Sha512::new()),
        }
    }

    /// One-shot digest for small inputs such as signed attributes.
    #[must_use]
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize().into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_round_trip_for_every_algorithm() {
        for algorithm in [
            HashAlgorithm::Md5,
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            assert_eq!(HashAlgorithm::from_oid(algorithm.oid()).unwrap(), algorithm);
            assert_eq!(algorithm.digest(b"abc").len(), algorithm.digest_size());
        }
    }

    #[test]
    fn test_unknown_oid_rejected() {
        assert!(matches!(
            HashAlgorithm::from_oid("1.2.3.4"),
            Err(VerifyError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            hex::encode(HashAlgorithm::Sha256.digest(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
