//! Error types for signature decoding and verification.
//!
//! Structural problems surface as [`VerifyError`]. A cryptographic mismatch is
//! never an error: it is reported as a `false` verification outcome.

use crate::domain::asn1::Asn1Error;
use thiserror::Error;

/// Result type for decoding and verification operations
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Error types for decoding and verification
#[derive(Error, Debug, miette::Diagnostic)]
pub enum VerifyError {
    #[error(transparent)]
    Asn1(#[from] Asn1Error),

    #[error("{structure}: missing required field '{field}'")]
    MissingField {
        structure: &'static str,
        field: &'static str,
    },

    #[error("{structure}: field '{field}' has unexpected type (expected {expected}, found {found})")]
    UnexpectedElement {
        structure: &'static str,
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("CMS structure error: {0}")]
    Cms(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("PE file parsing error: {0}")]
    PeParsingError(String),

    #[error("Cryptographic error: {0}")]
    CryptographicError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<goblin::error::Error> for VerifyError {
    fn from(error: goblin::error::Error) -> Self {
        VerifyError::PeParsingError(error.to_string())
    }
}

impl From<std::io::Error> for VerifyError {
    fn from(error: std::io::Error) -> Self {
        VerifyError::IoError(error.to_string())
    }
}

impl From<toml::de::Error> for VerifyError {
    fn from(error: toml::de::Error) -> Self {
        VerifyError::ConfigurationError(error.to_string())
    }
}
