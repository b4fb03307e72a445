//! Verification domain types for Authenticode signatures.
//!
//! Cryptographic and integrity outcomes are carried as booleans; malformed
//! input is reported through `VerifyError` instead. Reports are built by the
//! verification engine and aggregated per file by `VerificationService`.

use std::fmt;

/// Outcome of the checks applied to one `SignerInfo`.
///
/// - `algorithm_ok`: the signer's digest algorithm is declared by the
///   enclosing `SignedData` and the signature algorithm is supported
/// - `digest_ok`: the digest of the signed content matches the
///   `messageDigest` attribute
/// - `certificate_ok`: the signer's certificate was found in the certificate
///   set (and matches a signing-certificate attribute when one is present)
/// - `signature_ok`: the signature verifies over the authenticated attributes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SignerReport {
    pub algorithm_ok: bool,
    pub digest_ok: bool,
    pub certificate_ok: bool,
    pub signature_ok: bool,
}

impl SignerReport {
    #[must_use]
    pub fn success(&self) -> bool {
        self.algorithm_ok && self.digest_ok && self.certificate_ok && self.signature_ok
    }
}

/// Where a signature sits in the signature graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    Primary,
    Nested,
    Timestamp,
    CounterSignature,
}

impl fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignatureKind::Primary => "primary signature",
            SignatureKind::Nested => "nested signature",
            SignatureKind::Timestamp => "RFC 3161 timestamp",
            SignatureKind::CounterSignature => "countersignature",
        })
    }
}

/// Result of evaluating one signature reached during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureOutcome {
    pub kind: SignatureKind,
    pub depth: usize,
    /// Subject of the first signer's certificate, when it resolved.
    pub signer: Option<String>,
    pub signer_reports: Vec<SignerReport>,
    /// For timestamp tokens: whether the `TSTInfo` imprint covers the
    /// countersigned signature value.
    pub timestamp_binding_ok: Option<bool>,
    /// Set when the branch could not be decoded or evaluated.
    pub error: Option<String>,
}

impl SignatureOutcome {
    /// Every signer verified, at least one signer exists, and any timestamp
    /// binding holds.
    #[must_use]
    pub fn success(&self) -> bool {
        self.error.is_none()
            && !self.signer_reports.is_empty()
            && self.signer_reports.iter().all(SignerReport::success)
            && self.timestamp_binding_ok.unwrap_or(true)
    }
}

impl fmt::Display for SignatureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success() { "OK" } else { "FAILED" };
        write!(f, "{:indent$}{} [{status}]", "", self.kind, indent = self.depth * 2)?;
        if let Some(signer) = &self.signer {
            write!(f, " signer: {signer}")?;
        }
        if let Some(error) = &self.error {
            write!(f, " error: {error}")?;
        }
        for (index, report) in self.signer_reports.iter().enumerate() {
            if !report.success() {
                write!(
                    f,
                    "\n{:indent$}signer #{index}: algorithm={} digest={} certificate={} signature={}",
                    "",
                    report.algorithm_ok,
                    report.digest_ok,
                    report.certificate_ok,
                    report.signature_ok,
                    indent = self.depth * 2 + 2
                )?;
            }
        }
        if self.timestamp_binding_ok == Some(false) {
            write!(
                f,
                "\n{:indent$}timestamp imprint does not match the countersigned signature",
                "",
                indent = self.depth * 2 + 2
            )?;
        }
        Ok(())
    }
}

/// Result of verifying a signed PE file.
///
/// - `image_hash_ok`: the recomputed image digest matches the
///   `SpcIndirectData` digest of every primary signature (true when image
///   hashing is disabled)
/// - `signature_ok`: every primary signature verifies
/// - `nested_ok`: every nested signature, timestamp and countersignature
///   reached by traversal verifies
/// - `timestamp_ok`: false only when a timestamp is required and none
///   verified
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct VerificationReport {
    pub image_hash_ok: bool,
    pub signature_ok: bool,
    pub nested_ok: bool,
    pub timestamp_ok: bool,
    pub outcomes: Vec<SignatureOutcome>,
}

impl VerificationReport {
    /// Report for an image carrying no signature.
    #[must_use]
    pub fn unsigned() -> Self {
        Self {
            image_hash_ok: false,
            signature_ok: false,
            nested_ok: false,
            timestamp_ok: false,
            outcomes: Vec::new(),
        }
    }

    /// Overall success indicator - true only if all checks passed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.image_hash_ok && self.signature_ok && self.nested_ok && self.timestamp_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing() -> SignerReport {
        SignerReport {
            algorithm_ok: true,
            digest_ok: true,
            certificate_ok: true,
            signature_ok: true,
        }
    }

    fn outcome(reports: Vec<SignerReport>) -> SignatureOutcome {
        SignatureOutcome {
            kind: SignatureKind::Primary,
            depth: 0,
            signer: None,
            signer_reports: reports,
            timestamp_binding_ok: None,
            error: None,
        }
    }

    #[test]
    fn test_outcome_requires_signers() {
        assert!(!outcome(Vec::new()).success());
        assert!(outcome(vec![passing()]).success());
    }

    #[test]
    fn test_outcome_fails_on_any_signer() {
        let failing = SignerReport {
            signature_ok: false,
            ..passing()
        };
        let result = outcome(vec![passing(), failing]);
        assert!(!result.success());
        assert!(result.to_string().contains("signature=false"));
    }

    #[test]
    fn test_timestamp_binding_counts() {
        let mut result = outcome(vec![passing()]);
        result.timestamp_binding_ok = Some(false);
        assert!(!result.success());
    }

    #[test]
    fn test_report_success() {
        let mut report = VerificationReport::unsigned();
        assert!(!report.success());
        report.image_hash_ok = true;
        report.signature_ok = true;
        report.nested_ok = true;
        report.timestamp_ok = true;
        assert!(report.success());
    }
}
