use std::fmt;

use super::HashAlgorithm;

/// Computed digest paired with the algorithm that produced it.
///
/// Invariant: `bytes.len() == algo.digest_size()`.
#[derive(Clone, Eq, PartialEq)]
pub struct DigestBytes {
    algo: HashAlgorithm,
    bytes: Box<[u8]>,
}

impl DigestBytes {
    pub fn new(algo: HashAlgorithm, bytes: Vec<u8>) -> Result<Self, DigestBytesError> {
        if bytes.len() != algo.digest_size() {
            return Err(DigestBytesError::LengthMismatch {
                expected: algo.digest_size(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            algo,
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Digest of `data` computed in one pass.
    #[must_use]
    pub fn compute(algo: HashAlgorithm, data: &[u8]) -> Self {
        Self {
            algo,
            bytes: algo.digest(data).into_boxed_slice(),
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algo
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether an encoded digest value (e.g. `messageDigest`) equals this one.
    #[must_use]
    pub fn matches(&self, expected: &[u8]) -> bool {
        *self.bytes == *expected
    }
}

impl fmt::Debug for DigestBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DigestBytes(algo={:?}, len={})",
            self.algo,
            self.bytes.len()
        )
    }
}

impl fmt::Display for DigestBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algo.as_str(), hex::encode(&self.bytes))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DigestBytesError {
    #[error("digest length mismatch (expected {expected}, actual {actual})")]
    LengthMismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_invariant() {
        assert!(DigestBytes::new(HashAlgorithm::Sha256, vec![0; 32]).is_ok());
        assert_eq!(
            DigestBytes::new(HashAlgorithm::Sha1, vec![0; 32]).unwrap_err(),
            DigestBytesError::LengthMismatch {
                expected: 20,
                actual: 32
            }
        );
    }

    #[test]
    fn test_matches_and_display() {
        let digest = DigestBytes::compute(HashAlgorithm::Md5, b"");
        assert!(digest.matches(&hex::decode("d41d8cd98f00b204e9800998ecf8427e").unwrap()));
        assert!(!digest.matches(&[0u8; 16]));
        assert_eq!(digest.to_string(), "md5:d41d8cd98f00b204e9800998ecf8427e");
    }
}
