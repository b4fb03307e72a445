//! Signature verification engine.
//!
//! `VerificationEngine` checks one `SignerInfo` against the content it signs.
//! `VerifiableSignature` binds a signature (or a bare countersigner) to that
//! content and to its place in the graph; `CmsSignature::visit_all` walks the
//! graph depth-first, root first, in document order.

use crate::adapters::openssl::OpenSslVerifier;
use crate::domain::asn1::ByteWindow;
use crate::domain::constants::{
    COUNTER_SIGNATURE_OID, DEFAULT_HASH_BLOCK_SIZE, MS_RFC3161_TIMESTAMP_OID,
    SPC_NESTED_SIGNATURE_OID,
};
use crate::domain::crypto::block_hash::digest_window;
use crate::domain::crypto::{
    repack_ecdsa_signature, DigestBytes, PublicKey, SignatureFamily, SignatureVerifier,
};
use crate::domain::pkcs7::{
    AlgorithmIdentifier, AttributeValue, Certificate, CmsSignature, SignedData, SignerInfo,
};
use crate::domain::verification::{SignatureKind, SignatureOutcome, SignerReport};
use crate::infra::error::{VerifyError, VerifyResult};
use crate::HashAlgorithm;

/// What a signer's message digest is checked against.
pub struct SignerContext<'a> {
    /// Digest algorithms declared by the enclosing `SignedData`. `None` for
    /// countersigners, which have no declaration to agree with.
    pub digest_algorithms: Option<&'a [AlgorithmIdentifier]>,
    pub certificates: &'a [Certificate],
    pub content: &'a ByteWindow,
    /// Encapsulated content type, checked against a contentType attribute.
    pub content_type: Option<&'a str>,
}

pub struct VerificationEngine<'v> {
    verifier: &'v dyn SignatureVerifier,
    block_size: usize,
}

impl<'v> VerificationEngine<'v> {
    #[must_use]
    pub fn new(verifier: &'v dyn SignatureVerifier, block_size: usize) -> Self {
        Self {
            verifier,
            block_size,
        }
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Runs the per-signer checks. Integrity failures are reported in the
    /// returned `SignerReport`; a missing authenticated attribute set or
    /// messageDigest is a malformed signature and an error.
    pub fn verify_signer(
        &self,
        signer: &SignerInfo,
        context: &SignerContext<'_>,
    ) -> VerifyResult<SignerReport> {
        let mut report = SignerReport::default();

        let algorithm = match signer.hash_algorithm() {
            Ok(algorithm) => algorithm,
            Err(e) => {
                log::warn!("Signer uses an unsupported digest: {e}");
                return Ok(report);
            }
        };
        let declared = context.digest_algorithms.map_or(true, |declared| {
            declared
                .iter()
                .any(|candidate| candidate.same_algorithm(signer.digest_algorithm()))
        });
        let family = SignatureFamily::from_oid(signer.digest_encryption_algorithm().oid());
        report.algorithm_ok = declared && family.is_some();
        if !declared {
            log::warn!(
                "Signer digest algorithm {} is not declared by SignedData",
                signer.digest_algorithm().oid()
            );
        }

        let attributes = signer.authenticated_attributes().ok_or_else(|| {
            VerifyError::Cms("signer has no authenticated attributes".to_string())
        })?;
        let expected = attributes.message_digest().ok_or(VerifyError::MissingField {
            structure: "authenticatedAttributes",
            field: "messageDigest",
        })?;

        let computed = DigestBytes::new(
            algorithm,
            digest_window(algorithm, context.content, self.block_size)?,
        )
        .map_err(|e| VerifyError::CryptographicError(e.to_string()))?;
        report.digest_ok = computed.matches(expected);
        if !report.digest_ok {
            log::warn!(
                "Content digest {computed} does not match messageDigest {}",
                hex::encode(expected)
            );
        }
        if let (Some(expected_type), Some(declared_type)) =
            (context.content_type, attributes.content_type())
        {
            if expected_type != declared_type {
                log::warn!(
                    "contentType attribute {declared_type} does not match content {expected_type}"
                );
                report.digest_ok = false;
            }
        }

        let signed_attributes = attributes.canonical_encoding()?;
        let attributes_digest = algorithm.digest(signed_attributes.as_slice());

        let Some(certificate) = signer.find_certificate(context.certificates) else {
            log::warn!("No certificate for signer {}", signer.identifier());
            return Ok(report);
        };
        report.certificate_ok = match attributes.signing_certificates() {
            Some(ids) => {
                let bound = ids.iter().any(|id| id.matches_certificate(certificate.der()));
                if !bound {
                    log::warn!("Signing-certificate attribute does not name {}", certificate.subject());
                }
                bound
            }
            None => true,
        };

        report.signature_ok = match family {
            Some(family) => self.check_signature(
                certificate,
                family,
                algorithm,
                &attributes_digest,
                signer.encrypted_digest(),
            ),
            None => false,
        };
        if !report.signature_ok {
            log::warn!("Signature by {} does not verify", certificate.subject());
        }

        log::debug!("Signer {}: {report:?}", signer.identifier());
        Ok(report)
    }

    fn check_signature(
        &self,
        certificate: &Certificate,
        family: SignatureFamily,
        algorithm: HashAlgorithm,
        digest: &[u8],
        signature: &ByteWindow,
    ) -> bool {
        let key = match PublicKey::from_spki(certificate.public_key_info()) {
            Ok(key) => key,
            Err(e) => {
                log::warn!("Cannot use public key of {}: {e}", certificate.subject());
                return false;
            }
        };
        if key.family() != family {
            log::warn!("Signature algorithm does not match the {:?} key", key.family());
            return false;
        }

        match key {
            PublicKey::Rsa(rsa) => {
                self.verifier
                    .verify_rsa(&rsa, algorithm, digest, signature.as_slice())
            }
            PublicKey::Ec(ec) => match repack_ecdsa_signature(signature, ec.curve()) {
                Ok(packed) => self.verifier.verify_ecdsa(&ec, digest, &packed),
                Err(e) => {
                    log::warn!("Malformed ECDSA signature: {e}");
                    false
                }
            },
        }
    }
}

#[derive(Clone, Copy)]
enum Subject<'a> {
    Cms {
        signature: &'a CmsSignature,
        /// The signer whose signature value a timestamp token covers.
        countersigned: Option<&'a SignerInfo>,
    },
    CounterSigner {
        signer: &'a SignerInfo,
        countersigned: &'a SignerInfo,
        signed_data: &'a SignedData,
    },
    /// An embedded signature attribute whose value failed to decode.
    Undecodable { error: &'a str },
}

/// One node of the signature graph.
#[derive(Clone, Copy)]
pub struct VerifiableSignature<'a> {
    kind: SignatureKind,
    depth: usize,
    subject: Subject<'a>,
}

impl<'a> VerifiableSignature<'a> {
    fn root(signature: &'a CmsSignature) -> Self {
        Self {
            kind: SignatureKind::Primary,
            depth: 0,
            subject: Subject::Cms {
                signature,
                countersigned: None,
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> SignatureKind {
        self.kind
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The CMS signature, for every kind except bare countersigners.
    #[must_use]
    pub fn signature(&self) -> Option<&'a CmsSignature> {
        match self.subject {
            Subject::Cms { signature, .. } => Some(signature),
            Subject::CounterSigner { .. } | Subject::Undecodable { .. } => None,
        }
    }

    /// Decode error of an embedded signature that could not be read.
    #[must_use]
    pub fn decode_error(&self) -> Option<&'a str> {
        match self.subject {
            Subject::Undecodable { error } => Some(error),
            _ => None,
        }
    }

    /// Signers this node verifies, with the `SignedData` they resolve
    /// certificates from.
    fn signers(&self) -> Option<(&'a SignedData, Vec<&'a SignerInfo>)> {
        match self.subject {
            Subject::Cms { signature, .. } => {
                let signed_data = signature.signed_data();
                Some((signed_data, signed_data.signer_infos().iter().collect()))
            }
            Subject::CounterSigner {
                signer,
                signed_data,
                ..
            } => Some((signed_data, vec![signer])),
            Subject::Undecodable { .. } => None,
        }
    }

    /// Signatures carried in the unauthenticated attributes of this node's
    /// signers, in document order.
    #[must_use]
    pub fn children(&self) -> Vec<VerifiableSignature<'a>> {
        let Some((signed_data, signers)) = self.signers() else {
            return Vec::new();
        };
        let depth = self.depth + 1;
        let mut children = Vec::new();

        for signer in signers {
            let Some(attributes) = signer.unauthenticated_attributes() else {
                continue;
            };
            for attribute in attributes.iter() {
                match attribute.value() {
                    AttributeValue::NestedSignatures(list) => {
                        children.extend(list.iter().map(|signature| VerifiableSignature {
                            kind: SignatureKind::Nested,
                            depth,
                            subject: Subject::Cms {
                                signature,
                                countersigned: None,
                            },
                        }));
                    }
                    AttributeValue::TimestampTokens(list) => {
                        children.extend(list.iter().map(|signature| VerifiableSignature {
                            kind: SignatureKind::Timestamp,
                            depth,
                            subject: Subject::Cms {
                                signature,
                                countersigned: Some(signer),
                            },
                        }));
                    }
                    AttributeValue::CounterSignatures(list) => {
                        children.extend(list.iter().map(|counter| VerifiableSignature {
                            kind: SignatureKind::CounterSignature,
                            depth,
                            subject: Subject::CounterSigner {
                                signer: counter,
                                countersigned: signer,
                                signed_data,
                            },
                        }));
                    }
                    AttributeValue::Malformed(error) => {
                        if let Some(kind) = embedded_kind(attribute.oid()) {
                            children.push(VerifiableSignature {
                                kind,
                                depth,
                                subject: Subject::Undecodable { error },
                            });
                        }
                    }
                    _ => {}
                }
            }
        }
        children
    }

    /// Verifies every signer of this node.
    pub fn evaluate(&self, engine: &VerificationEngine<'_>) -> VerifyResult<SignatureOutcome> {
        let Some((signed_data, signers)) = self.signers() else {
            let error = self.decode_error().unwrap_or_default();
            return Err(VerifyError::Cms(format!("undecodable {}: {error}", self.kind)));
        };
        let mut signer_reports = Vec::with_capacity(signers.len());
        let mut timestamp_binding_ok = None;

        match self.subject {
            Subject::Cms {
                signature,
                countersigned,
            } => {
                let content_info = signature.signed_data().content_info();
                let content = content_info.signed_bytes().ok_or_else(|| {
                    VerifyError::Cms("signature has no encapsulated content".to_string())
                })?;
                let context = SignerContext {
                    digest_algorithms: Some(signed_data.digest_algorithms()),
                    certificates: signed_data.certificates(),
                    content,
                    content_type: Some(content_info.content_type()),
                };
                for signer in &signers {
                    signer_reports.push(engine.verify_signer(signer, &context)?);
                }

                if let Some(countersigned) = countersigned {
                    timestamp_binding_ok = Some(timestamp_binding(signature, countersigned));
                }
            }
            Subject::CounterSigner {
                signer,
                countersigned,
                ..
            } => {
                // RFC 5652 section 11.4: the countersignature covers the
                // contents octets of the countersigned signature value.
                let context = SignerContext {
                    digest_algorithms: None,
                    certificates: signed_data.certificates(),
                    content: countersigned.encrypted_digest(),
                    content_type: None,
                };
                signer_reports.push(engine.verify_signer(signer, &context)?);
            }
            Subject::Undecodable { .. } => {}
        }

        let signer = signers
            .first()
            .and_then(|signer| signer.find_certificate(signed_data.certificates()))
            .map(|certificate| certificate.subject().to_string());

        Ok(SignatureOutcome {
            kind: self.kind,
            depth: self.depth,
            signer,
            signer_reports,
            timestamp_binding_ok,
            error: None,
        })
    }

    pub fn verify(&self, engine: &VerificationEngine<'_>) -> VerifyResult<bool> {
        Ok(self.evaluate(engine)?.success())
    }
}

/// Graph node kind for attributes that embed signatures.
fn embedded_kind(oid: &str) -> Option<SignatureKind> {
    match oid {
        SPC_NESTED_SIGNATURE_OID => Some(SignatureKind::Nested),
        MS_RFC3161_TIMESTAMP_OID => Some(SignatureKind::Timestamp),
        COUNTER_SIGNATURE_OID => Some(SignatureKind::CounterSignature),
        _ => None,
    }
}

/// Whether a timestamp token's `TSTInfo` imprint is the digest of the
/// countersigned signature value.
fn timestamp_binding(token: &CmsSignature, countersigned: &SignerInfo) -> bool {
    let Some(tst_info) = token.signed_data().content_info().tst_info() else {
        log::warn!("Timestamp token does not carry TSTInfo");
        return false;
    };
    let imprint = tst_info.message_imprint();
    match imprint.hash_algorithm() {
        Ok(algorithm) => {
            let bound = algorithm.digest(countersigned.encrypted_digest().as_slice())
                == imprint.hashed_message();
            if !bound {
                log::warn!("Timestamp imprint does not cover the countersigned signature");
            }
            bound
        }
        Err(e) => {
            log::warn!("Timestamp imprint uses an unsupported digest: {e}");
            false
        }
    }
}

/// Depth-first traversal of a signature graph, root first.
pub struct SignatureWalk<'a> {
    stack: Vec<VerifiableSignature<'a>>,
}

impl<'a> Iterator for SignatureWalk<'a> {
    type Item = VerifiableSignature<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack.extend(current.children().into_iter().rev());
        Some(current)
    }
}

impl CmsSignature {
    /// Lazily yields this signature followed by every signature nested in
    /// it, transitively.
    #[must_use]
    pub fn visit_all(&self) -> SignatureWalk<'_> {
        SignatureWalk {
            stack: vec![VerifiableSignature::root(self)],
        }
    }

    /// Verifies the whole graph with the OpenSSL provider.
    pub fn verify(&self) -> VerifyResult<bool> {
        let verifier = OpenSslVerifier::new();
        self.verify_with(&VerificationEngine::new(&verifier, DEFAULT_HASH_BLOCK_SIZE))
    }

    pub fn verify_with(&self, engine: &VerificationEngine<'_>) -> VerifyResult<bool> {
        Ok(self
            .evaluate_all(engine)?
            .iter()
            .all(SignatureOutcome::success))
    }

    /// Evaluates every signature in the graph. Errors at the root propagate;
    /// an error in a nested branch fails that branch only.
    pub fn evaluate_all(
        &self,
        engine: &VerificationEngine<'_>,
    ) -> VerifyResult<Vec<SignatureOutcome>> {
        let mut outcomes = Vec::new();
        for node in self.visit_all() {
            match node.evaluate(engine) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if node.depth() > 0 => {
                    log::warn!("Failed to evaluate {} at depth {}: {e}", node.kind(), node.depth());
                    outcomes.push(SignatureOutcome {
                        kind: node.kind(),
                        depth: node.depth(),
                        signer: None,
                        signer_reports: Vec::new(),
                        timestamp_binding_ok: None,
                        error: Some(e.to_string()),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcomes)
    }
}
