use super::algorithm::AlgorithmIdentifier;
use super::attributes::{AttributeMode, AttributeSet};
use super::certificate::Certificate;
use super::name::Name;
use crate::domain::asn1::{ByteWindow, Constructed, Element, Integer, OctetString, Tag};
use crate::infra::error::{VerifyError, VerifyResult};
use crate::HashAlgorithm;
use std::fmt;

/// `SignerIdentifier ::= CHOICE { issuerAndSerialNumber, subjectKeyIdentifier [0] }`
#[derive(Debug, Clone)]
pub enum SignerIdentifier {
    IssuerAndSerial { issuer: Name, serial_number: Integer },
    SubjectKeyIdentifier(ByteWindow),
}

impl SignerIdentifier {
    fn decode(element: &Element) -> VerifyResult<Self> {
        if element.tag().is_context(0) {
            let viewed = element.reinterpret(Tag::OCTET_STRING)?;
            let identifier = viewed.cast::<OctetString>().ok_or_else(|| {
                VerifyError::Cms("subjectKeyIdentifier must be primitive".to_string())
            })?;
            return Ok(SignerIdentifier::SubjectKeyIdentifier(
                identifier.content_data().clone(),
            ));
        }

        let sequence = element
            .cast::<Constructed>()
            .filter(|c| c.is_sequence())
            .ok_or_else(|| VerifyError::UnexpectedElement {
                structure: "SignerInfo",
                field: "sid",
                expected: "IssuerAndSerialNumber or [0]",
                found: element.tag().to_string(),
            })?;
        let mut fields = sequence.reader("IssuerAndSerialNumber");
        let issuer = Name::decode(fields.take_sequence("issuer")?)?;
        let serial_number = fields.take::<Integer>("serialNumber")?.clone();
        Ok(SignerIdentifier::IssuerAndSerial {
            issuer,
            serial_number,
        })
    }

    /// Whether `certificate` is the one this identifier names. Serial numbers
    /// compare by value, names by RDN content.
    #[must_use]
    pub fn matches(&self, certificate: &Certificate) -> bool {
        match self {
            SignerIdentifier::IssuerAndSerial {
                issuer,
                serial_number,
            } => {
                serial_number.value() == certificate.serial_number().value()
                    && issuer == certificate.issuer()
            }
            SignerIdentifier::SubjectKeyIdentifier(identifier) => {
                certificate.subject_key_identifier() == Some(identifier.as_slice())
            }
        }
    }
}

impl fmt::Display for SignerIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerIdentifier::IssuerAndSerial {
                issuer,
                serial_number,
            } => write!(f, "issuer \"{issuer}\", serial {}", serial_number.value()),
            SignerIdentifier::SubjectKeyIdentifier(identifier) => {
                write!(f, "key identifier {}", hex::encode(identifier.as_slice()))
            }
        }
    }
}

/// One `SignerInfo`. Authenticode carries version 1 signers with an
/// issuer-and-serial identifier; timestamp countersigners may use either form.
#[derive(Clone)]
pub struct SignerInfo {
    version: Integer,
    identifier: SignerIdentifier,
    digest_algorithm: AlgorithmIdentifier,
    authenticated_attributes: Option<AttributeSet>,
    digest_encryption_algorithm: AlgorithmIdentifier,
    encrypted_digest: OctetString,
    unauthenticated_attributes: Option<AttributeSet>,
}

impl SignerInfo {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let mut fields = sequence.reader("SignerInfo");
        let version = fields.take::<Integer>("version")?.clone();
        let sid = fields.next_element().ok_or(VerifyError::MissingField {
            structure: "SignerInfo",
            field: "sid",
        })?;
        let identifier = SignerIdentifier::decode(sid)?;
        let digest_algorithm = AlgorithmIdentifier::decode(fields.take_sequence("digestAlgorithm")?)?;

        let mut authenticated_attributes = None;
        let mut digest_encryption_algorithm = None;
        let mut encrypted_digest = None;
        let mut unauthenticated_attributes = None;

        for element in fields.remaining() {
            let tag = element.tag();
            if tag.is_context(0) && authenticated_attributes.is_none() {
                authenticated_attributes =
                    Some(AttributeSet::decode(attribute_container(element)?, AttributeMode::Strict)?);
            } else if tag.is_context(1) {
                unauthenticated_attributes = Some(AttributeSet::decode(
                    attribute_container(element)?,
                    AttributeMode::Lenient,
                )?);
            } else if tag == Tag::SEQUENCE && digest_encryption_algorithm.is_none() {
                if let Some(algorithm) = element.cast::<Constructed>() {
                    digest_encryption_algorithm = Some(AlgorithmIdentifier::decode(algorithm)?);
                }
            } else if tag == Tag::OCTET_STRING && encrypted_digest.is_none() {
                encrypted_digest = element.cast::<OctetString>().cloned();
            } else {
                log::debug!("Ignoring unexpected {tag} in SignerInfo");
            }
        }

        Ok(Self {
            version,
            identifier,
            digest_algorithm,
            authenticated_attributes,
            digest_encryption_algorithm: digest_encryption_algorithm.ok_or(
                VerifyError::MissingField {
                    structure: "SignerInfo",
                    field: "digestEncryptionAlgorithm",
                },
            )?,
            encrypted_digest: encrypted_digest.ok_or(VerifyError::MissingField {
                structure: "SignerInfo",
                field: "encryptedDigest",
            })?,
            unauthenticated_attributes,
        })
    }

    #[must_use]
    pub fn version(&self) -> &Integer {
        &self.version
    }

    #[must_use]
    pub fn identifier(&self) -> &SignerIdentifier {
        &self.identifier
    }

    #[must_use]
    pub fn digest_algorithm(&self) -> &AlgorithmIdentifier {
        &self.digest_algorithm
    }

    pub fn hash_algorithm(&self) -> VerifyResult<HashAlgorithm> {
        HashAlgorithm::from_oid(self.digest_algorithm.oid())
    }

    #[must_use]
    pub fn authenticated_attributes(&self) -> Option<&AttributeSet> {
        self.authenticated_attributes.as_ref()
    }

    #[must_use]
    pub fn digest_encryption_algorithm(&self) -> &AlgorithmIdentifier {
        &self.digest_encryption_algorithm
    }

    /// The signature value.
    #[must_use]
    pub fn encrypted_digest(&self) -> &ByteWindow {
        self.encrypted_digest.content_data()
    }

    #[must_use]
    pub fn unauthenticated_attributes(&self) -> Option<&AttributeSet> {
        self.unauthenticated_attributes.as_ref()
    }

    /// First certificate in `certificates` this signer identifies.
    #[must_use]
    pub fn find_certificate<'a>(&self, certificates: &'a [Certificate]) -> Option<&'a Certificate> {
        certificates
            .iter()
            .find(|certificate| self.identifier.matches(certificate))
    }
}

impl fmt::Debug for SignerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignerInfo(sid={}, digest={}, encryption={}, auth_attrs={}, unauth_attrs={})",
            self.identifier,
            self.digest_algorithm.oid(),
            self.digest_encryption_algorithm.oid(),
            self.authenticated_attributes.as_ref().map_or(0, AttributeSet::len),
            self.unauthenticated_attributes.as_ref().map_or(0, AttributeSet::len)
        )
    }
}

fn attribute_container(element: &Element) -> VerifyResult<&Constructed> {
    element.cast::<Constructed>().ok_or_else(|| {
        VerifyError::Cms(format!("attribute container {} must be constructed", element.tag()))
    })
}
