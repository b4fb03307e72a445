//! Authenticode Verifier Library
//!
//! A self-contained library for decoding BER/DER encoded ASN.1 and verifying
//! Authenticode PKCS#7 signatures embedded in PE images, including nested
//! signatures, RFC 3161 timestamps and PKCS#9 countersignatures.
//!
//! Organized in layers:
//! - `domain`: ASN.1 decoder, CMS object model, PE layout, hashing
//! - `services`: signature graph traversal and the verification engine
//! - `pipelines`: high-level workflows
//! - `adapters`: OpenSSL signature primitives
//! - `infra`: configuration and error types

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use domain::pkcs7::CmsSignature;
pub use domain::verification::VerificationReport;
pub use infra::config::{ConfigManager, VerifierConfiguration};
pub use infra::error::{VerifyError, VerifyResult};
pub use pipelines::verify::VerifyWorkflow;
pub use services::verification::VerificationService;

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    #[must_use]
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(VerifyError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Verify a signed PE file with the default configuration.
///
/// Returns `Ok(false)` for unsigned images and for any failed check; decoding
/// problems are errors.
pub fn verify_pe_file<P: AsRef<Path>>(path: P) -> VerifyResult<bool> {
    let file_data = std::fs::read(&path)
        .map_err(|e| VerifyError::IoError(format!("Failed to read file: {e}")))?;

    let report = VerificationService::default().verify(file_data)?;
    Ok(report.success())
}
