//! Verification service: orchestrates validation of a signed PE file.
//!
//! Extracts the PKCS#7 blobs from the security directory, runs the signature
//! engine over each signature graph, recomputes the image digest for every
//! primary and nested signature, and aggregates the outcomes into a domain
//! `VerificationReport`.

use crate::adapters::openssl::OpenSslVerifier;
use crate::domain::asn1::{ByteWindow, Element};
use crate::domain::crypto::SignatureVerifier;
use crate::domain::pe::PeImage;
use crate::domain::pkcs7::CmsSignature;
use crate::domain::verification::{SignatureKind, SignatureOutcome, VerificationReport};
use crate::infra::config::VerifierConfiguration;
use crate::infra::error::VerifyResult;
use crate::services::signature::VerificationEngine;
use crate::HashAlgorithm;
use std::collections::HashMap;
use std::sync::Arc;

/// Service performing structural & cryptographic verification of signed files.
pub struct VerificationService {
    config: VerifierConfiguration,
    verifier: Box<dyn SignatureVerifier>,
}

impl Default for VerificationService {
    fn default() -> Self {
        Self::new(VerifierConfiguration::default())
    }
}

impl VerificationService {
    /// Service backed by the OpenSSL signature provider.
    #[must_use]
    pub fn new(config: VerifierConfiguration) -> Self {
        Self::with_verifier(config, Box::new(OpenSslVerifier::new()))
    }

    #[must_use]
    pub fn with_verifier(config: VerifierConfiguration, verifier: Box<dyn SignatureVerifier>) -> Self {
        Self { config, verifier }
    }

    #[must_use]
    pub fn config(&self) -> &VerifierConfiguration {
        &self.config
    }

    /// Verify a signed PE image.
    ///
    /// An image without a certificate table yields an all-false report rather
    /// than an error. Malformed headers, certificate tables or primary
    /// signatures are errors.
    pub fn verify(&self, pe_bytes: impl Into<Arc<[u8]>>) -> VerifyResult<VerificationReport> {
        let image = PeImage::parse(pe_bytes)?;
        let blobs = image.signatures()?;
        if blobs.is_empty() {
            log::info!("Image carries no PKCS#7 signature");
            return Ok(VerificationReport::unsigned());
        }

        let signatures = blobs
            .iter()
            .map(decode_signature)
            .collect::<VerifyResult<Vec<_>>>()?;
        self.build_report(&signatures, Some(&image))
    }

    /// Verify a bare PKCS#7 signature blob. No image digest is available, so
    /// `image_hash_ok` is reported as true.
    pub fn verify_blob(&self, der: impl Into<Arc<[u8]>>) -> VerifyResult<VerificationReport> {
        let signature = CmsSignature::from_der(der)?;
        self.build_report(std::slice::from_ref(&signature), None)
    }

    fn build_report(
        &self,
        signatures: &[CmsSignature],
        image: Option<&PeImage>,
    ) -> VerifyResult<VerificationReport> {
        self.config.validate()?;
        let engine = VerificationEngine::new(self.verifier.as_ref(), self.config.hash_block_size);

        let mut outcomes: Vec<SignatureOutcome> = Vec::new();
        for signature in signatures {
            outcomes.extend(signature.evaluate_all(&engine)?);
        }

        let image_hash_ok = match image {
            Some(image) if self.config.verify_image_hash => {
                self.image_hash_matches(signatures, image)?
            }
            _ => true,
        };

        let primary: Vec<&SignatureOutcome> = outcomes
            .iter()
            .filter(|outcome| outcome.kind == SignatureKind::Primary)
            .collect();
        let signature_ok = !primary.is_empty() && primary.iter().all(|outcome| outcome.success());
        let nested_ok = outcomes
            .iter()
            .filter(|outcome| outcome.kind != SignatureKind::Primary)
            .all(SignatureOutcome::success);
        let timestamped = outcomes.iter().any(|outcome| {
            matches!(
                outcome.kind,
                SignatureKind::Timestamp | SignatureKind::CounterSignature
            ) && outcome.success()
        });
        let timestamp_ok = timestamped || !self.config.require_timestamp;
        if !timestamp_ok {
            log::warn!("No verified timestamp present and one is required");
        }

        let report = VerificationReport {
            image_hash_ok,
            signature_ok,
            nested_ok,
            timestamp_ok,
            outcomes,
        };
        log::info!(
            "Verification {}: image_hash={} signature={} nested={} timestamp={}",
            if report.success() { "succeeded" } else { "failed" },
            report.image_hash_ok,
            report.signature_ok,
            report.nested_ok,
            report.timestamp_ok
        );
        Ok(report)
    }

    /// Compares the image digest with the `SpcIndirectData` digest of every
    /// primary and nested signature. Each algorithm is hashed once.
    fn image_hash_matches(
        &self,
        signatures: &[CmsSignature],
        image: &PeImage,
    ) -> VerifyResult<bool> {
        let mut digests: HashMap<HashAlgorithm, Vec<u8>> = HashMap::new();
        let mut all_match = true;

        for signature in signatures {
            for node in signature.visit_all() {
                if !matches!(node.kind(), SignatureKind::Primary | SignatureKind::Nested) {
                    continue;
                }
                let Some(cms) = node.signature() else {
                    continue;
                };
                let Some(spc) = cms.signed_data().content_info().spc_indirect_data() else {
                    log::warn!("{} does not carry SpcIndirectData", node.kind());
                    all_match = false;
                    continue;
                };
                let algorithm = match spc.hash_algorithm() {
                    Ok(algorithm) => algorithm,
                    Err(e) => {
                        log::warn!("Cannot hash image for {}: {e}", node.kind());
                        all_match = false;
                        continue;
                    }
                };
                if !digests.contains_key(&algorithm) {
                    let computed = image.image_digest(algorithm, self.config.hash_block_size)?;
                    digests.insert(algorithm, computed);
                }
                let digest = &digests[&algorithm];
                if digest.as_slice() != spc.digest() {
                    log::warn!(
                        "Image {} digest {} does not match signed digest {}",
                        algorithm.as_str(),
                        hex::encode(digest),
                        hex::encode(spc.digest())
                    );
                    all_match = false;
                }
            }
        }
        Ok(all_match)
    }
}

fn decode_signature(blob: &ByteWindow) -> VerifyResult<CmsSignature> {
    let element = Element::decode(blob)?;
    if element.element_data().len() != blob.len() {
        log::debug!(
            "Ignoring {} bytes of padding after signature",
            blob.len() - element.element_data().len()
        );
    }
    CmsSignature::from_element(&element)
}
