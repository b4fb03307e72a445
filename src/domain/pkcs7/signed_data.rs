use super::algorithm::AlgorithmIdentifier;
use super::certificate::Certificate;
use super::content_info::ContentInfo;
use super::signer_info::SignerInfo;
use crate::domain::asn1::{Constructed, Integer, Tag};
use crate::infra::error::{VerifyError, VerifyResult};
use crate::HashAlgorithm;

/// `SignedData { version, digestAlgorithms, contentInfo, [0] certificates,
/// [1] crls, signerInfos }`
#[derive(Debug, Clone)]
pub struct SignedData {
    version: Integer,
    digest_algorithms: Vec<AlgorithmIdentifier>,
    content_info: ContentInfo,
    certificates: Vec<Certificate>,
    signer_infos: Vec<SignerInfo>,
}

impl SignedData {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let mut fields = sequence.reader("SignedData");
        let version = fields.take::<Integer>("version")?.clone();
        let digest_algorithms = fields
            .take_set("digestAlgorithms")?
            .children()
            .iter()
            .filter_map(|element| element.cast::<Constructed>())
            .map(AlgorithmIdentifier::decode)
            .collect::<VerifyResult<Vec<_>>>()?;
        let content_info = ContentInfo::decode(fields.take_sequence("contentInfo")?)?;

        let mut certificates = Vec::new();
        let mut signer_infos = None;
        for element in fields.remaining() {
            let tag = element.tag();
            if tag.is_context(0) {
                let Some(set) = element.cast::<Constructed>() else {
                    return Err(VerifyError::Cms("certificates must be constructed".to_string()));
                };
                for entry in set.children() {
                    match entry.cast::<Constructed>().filter(|c| c.is_sequence()) {
                        Some(certificate) => certificates.push(Certificate::decode(certificate)?),
                        None => log::debug!("Skipping non-X.509 certificate choice {}", entry.tag()),
                    }
                }
            } else if tag.is_context(1) {
                log::debug!("Ignoring revocation list set");
            } else if tag == Tag::SET {
                let Some(set) = element.cast::<Constructed>() else {
                    continue;
                };
                signer_infos = Some(
                    set.children()
                        .iter()
                        .map(|entry| {
                            let signer = entry
                                .cast::<Constructed>()
                                .filter(|c| c.is_sequence())
                                .ok_or_else(|| {
                                    VerifyError::Cms("SignerInfo must be a SEQUENCE".to_string())
                                })?;
                            SignerInfo::decode(signer)
                        })
                        .collect::<VerifyResult<Vec<_>>>()?,
                );
                break;
            } else {
                return Err(VerifyError::Cms(format!("unexpected {tag} in SignedData")));
            }
        }

        Ok(Self {
            version,
            digest_algorithms,
            content_info,
            certificates,
            signer_infos: signer_infos.ok_or(VerifyError::MissingField {
                structure: "SignedData",
                field: "signerInfos",
            })?,
        })
    }

    #[must_use]
    pub fn version(&self) -> &Integer {
        &self.version
    }

    #[must_use]
    pub fn digest_algorithms(&self) -> &[AlgorithmIdentifier] {
        &self.digest_algorithms
    }

    /// Whether `algorithm` is among the declared digest algorithms.
    #[must_use]
    pub fn declares_digest(&self, algorithm: HashAlgorithm) -> bool {
        self.digest_algorithms
            .iter()
            .any(|declared| declared.oid() == algorithm.oid())
    }

    #[must_use]
    pub fn content_info(&self) -> &ContentInfo {
        &self.content_info
    }

    #[must_use]
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    #[must_use]
    pub fn signer_infos(&self) -> &[SignerInfo] {
        &self.signer_infos
    }
}
