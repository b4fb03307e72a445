//! Signer attributes.
//!
//! Authenticated attributes are decoded strictly: any malformed value fails
//! the signer. Unauthenticated attributes are not covered by the signature,
//! so a value that does not decode is kept as [`AttributeValue::Malformed`]
//! and the rest of the set is still usable.

use super::algorithm::AlgorithmIdentifier;
use super::signature::CmsSignature;
use super::signer_info::SignerInfo;
use crate::domain::asn1::{
    ByteWindow, Constructed, Element, Integer, ObjectIdentifier, OctetString, Time,
};
use crate::domain::constants::{
    oid_name, CONTENT_TYPE_OID, COUNTER_SIGNATURE_OID, MESSAGE_DIGEST_OID, MS_RFC3161_TIMESTAMP_OID,
    SIGNING_CERTIFICATE_OID, SIGNING_CERTIFICATE_V2_OID, SIGNING_TIME_OID, SPC_NESTED_SIGNATURE_OID,
    SPC_SP_OPUS_INFO_OID,
};
use crate::domain::spc::SpcSpOpusInfo;
use crate::infra::error::{VerifyError, VerifyResult};
use crate::HashAlgorithm;
use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMode {
    /// Authenticated attributes: decoding failures are errors.
    Strict,
    /// Unauthenticated attributes: decoding failures are recorded and logged.
    Lenient,
}

/// `ESSCertID` / `ESSCertIDv2` from a signing-certificate attribute.
#[derive(Debug, Clone)]
pub struct EssCertId {
    hash_algorithm: HashAlgorithm,
    cert_hash: ByteWindow,
    serial_number: Option<Integer>,
}

impl EssCertId {
    #[must_use]
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    #[must_use]
    pub fn cert_hash(&self) -> &[u8] {
        self.cert_hash.as_slice()
    }

    #[must_use]
    pub fn serial_number(&self) -> Option<&Integer> {
        self.serial_number.as_ref()
    }

    /// Whether `certificate_der` hashes to this identifier.
    #[must_use]
    pub fn matches_certificate(&self, certificate_der: &[u8]) -> bool {
        self.hash_algorithm.digest(certificate_der) == self.cert_hash.as_slice()
    }
}

#[derive(Debug, Clone)]
pub enum AttributeValue {
    ContentType(String),
    MessageDigest(ByteWindow),
    SigningTime(DateTime<FixedOffset>),
    OpusInfo(SpcSpOpusInfo),
    SigningCertificate(Vec<EssCertId>),
    NestedSignatures(Vec<CmsSignature>),
    TimestampTokens(Vec<CmsSignature>),
    CounterSignatures(Vec<SignerInfo>),
    Unknown(Vec<Element>),
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct Attribute {
    oid: String,
    value: AttributeValue,
}

impl Attribute {
    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    #[must_use]
    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    fn decode(element: &Element, mode: AttributeMode) -> VerifyResult<Self> {
        let sequence = element
            .cast::<Constructed>()
            .filter(|c| c.is_sequence())
            .ok_or_else(|| {
                VerifyError::Cms(format!("attribute must be a SEQUENCE, found {}", element.tag()))
            })?;
        let mut fields = sequence.reader("Attribute");
        let oid = fields.take::<ObjectIdentifier>("attrType")?.dotted().to_owned();
        let values = fields.take_set("attrValues")?.children();

        let value = match decode_value(&oid, values) {
            Ok(value) => value,
            Err(error) if mode == AttributeMode::Lenient => {
                log::warn!(
                    "Ignoring malformed unauthenticated attribute {}: {error}",
                    oid_name(&oid).unwrap_or(oid.as_str())
                );
                AttributeValue::Malformed(error.to_string())
            }
            Err(error) => return Err(error),
        };
        Ok(Self { oid, value })
    }
}

/// Decoded `[n] IMPLICIT SET OF Attribute`.
#[derive(Debug, Clone)]
pub struct AttributeSet {
    encoded: ByteWindow,
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    /// Decodes the attribute container, keeping its encoding for
    /// [`AttributeSet::canonical_encoding`].
    pub fn decode(container: &Constructed, mode: AttributeMode) -> VerifyResult<Self> {
        let mut attributes = Vec::with_capacity(container.len());
        for element in container.children() {
            match Attribute::decode(element, mode) {
                Ok(attribute) => attributes.push(attribute),
                Err(error) if mode == AttributeMode::Lenient => {
                    log::warn!("Skipping undecodable unauthenticated attribute: {error}");
                }
                Err(error) => return Err(error),
            }
        }

        if mode == AttributeMode::Strict {
            for oid in [CONTENT_TYPE_OID, MESSAGE_DIGEST_OID] {
                let count = attributes.iter().filter(|a| a.oid == oid).count();
                if count > 1 {
                    return Err(VerifyError::Cms(format!(
                        "{} attribute appears {count} times",
                        oid_name(oid).unwrap_or(oid)
                    )));
                }
            }
        }

        Ok(Self {
            encoded: container.element_data().clone(),
            attributes,
        })
    }

    /// The attributes re-encoded under a universal SET tag, the form their
    /// digest is computed over.
    pub fn canonical_encoding(&self) -> VerifyResult<ByteWindow> {
        let element = Element::decode(&self.encoded)?;
        let container = element
            .cast::<Constructed>()
            .ok_or_else(|| VerifyError::Cms("attribute container is not constructed".to_string()))?;
        Ok(container.reinterpret_as_set()?.element_data().clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    #[must_use]
    pub fn find(&self, oid: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.oid == oid)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self.find(CONTENT_TYPE_OID)?.value() {
            AttributeValue::ContentType(oid) => Some(oid),
            _ => None,
        }
    }

    #[must_use]
    pub fn message_digest(&self) -> Option<&[u8]> {
        match self.find(MESSAGE_DIGEST_OID)?.value() {
            AttributeValue::MessageDigest(digest) => Some(digest.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn signing_time(&self) -> Option<DateTime<FixedOffset>> {
        match self.find(SIGNING_TIME_OID)?.value() {
            AttributeValue::SigningTime(time) => Some(*time),
            _ => None,
        }
    }

    #[must_use]
    pub fn opus_info(&self) -> Option<&SpcSpOpusInfo> {
        match self.find(SPC_SP_OPUS_INFO_OID)?.value() {
            AttributeValue::OpusInfo(info) => Some(info),
            _ => None,
        }
    }

    /// Certificate identifiers from a signing-certificate (v1 or v2) attribute.
    #[must_use]
    pub fn signing_certificates(&self) -> Option<&[EssCertId]> {
        self.attributes.iter().find_map(|attribute| match &attribute.value {
            AttributeValue::SigningCertificate(ids) => Some(ids.as_slice()),
            _ => None,
        })
    }

    /// Nested signatures and timestamp tokens, in attribute order.
    pub fn embedded_signatures(&self) -> impl Iterator<Item = (&str, &CmsSignature)> {
        self.attributes.iter().flat_map(|attribute| {
            let signatures: &[CmsSignature] = match &attribute.value {
                AttributeValue::NestedSignatures(list) | AttributeValue::TimestampTokens(list) => {
                    list
                }
                _ => &[],
            };
            signatures.iter().map(move |signature| (attribute.oid(), signature))
        })
    }

    pub fn counter_signers(&self) -> impl Iterator<Item = &SignerInfo> {
        self.attributes.iter().flat_map(|attribute| {
            let signers: &[SignerInfo] = match &attribute.value {
                AttributeValue::CounterSignatures(list) => list,
                _ => &[],
            };
            signers.iter()
        })
    }
}

fn decode_value(oid: &str, values: &[Element]) -> VerifyResult<AttributeValue> {
    match oid {
        CONTENT_TYPE_OID => {
            let value = single_value(oid, values)?;
            let content_type = value
                .cast::<ObjectIdentifier>()
                .ok_or_else(|| unexpected(oid, "OBJECT IDENTIFIER", value))?;
            Ok(AttributeValue::ContentType(content_type.dotted().to_owned()))
        }
        MESSAGE_DIGEST_OID => {
            let value = single_value(oid, values)?;
            let digest = value
                .cast::<OctetString>()
                .ok_or_else(|| unexpected(oid, "OCTET STRING", value))?;
            Ok(AttributeValue::MessageDigest(digest.content_data().clone()))
        }
        SIGNING_TIME_OID => {
            let value = single_value(oid, values)?;
            let time = value
                .cast::<Time>()
                .ok_or_else(|| unexpected(oid, "time", value))?;
            Ok(AttributeValue::SigningTime(time.value()))
        }
        SPC_SP_OPUS_INFO_OID => {
            let value = single_value(oid, values)?;
            Ok(AttributeValue::OpusInfo(SpcSpOpusInfo::decode(sequence(oid, value)?)?))
        }
        SIGNING_CERTIFICATE_OID | SIGNING_CERTIFICATE_V2_OID => {
            let value = single_value(oid, values)?;
            let v2 = oid == SIGNING_CERTIFICATE_V2_OID;
            Ok(AttributeValue::SigningCertificate(decode_signing_certificate(
                sequence(oid, value)?,
                v2,
            )?))
        }
        SPC_NESTED_SIGNATURE_OID => Ok(AttributeValue::NestedSignatures(
            values
                .iter()
                .map(CmsSignature::from_element)
                .collect::<VerifyResult<Vec<_>>>()?,
        )),
        MS_RFC3161_TIMESTAMP_OID => Ok(AttributeValue::TimestampTokens(
            values
                .iter()
                .map(CmsSignature::from_element)
                .collect::<VerifyResult<Vec<_>>>()?,
        )),
        COUNTER_SIGNATURE_OID => Ok(AttributeValue::CounterSignatures(
            values
                .iter()
                .map(|value| SignerInfo::decode(sequence(oid, value)?))
                .collect::<VerifyResult<Vec<_>>>()?,
        )),
        _ => Ok(AttributeValue::Unknown(values.to_vec())),
    }
}

/// `SigningCertificate { certs SEQUENCE OF ESSCertID, policies OPTIONAL }`,
/// with `ESSCertIDv2` adding an optional leading hash algorithm.
fn decode_signing_certificate(value: &Constructed, v2: bool) -> VerifyResult<Vec<EssCertId>> {
    let mut fields = value.reader("SigningCertificate");
    let certs = fields.take_sequence("certs")?;

    certs
        .children()
        .iter()
        .map(|entry| {
            let entry = entry
                .cast::<Constructed>()
                .filter(|c| c.is_sequence())
                .ok_or_else(|| VerifyError::Cms("ESSCertID must be a SEQUENCE".to_string()))?;
            let mut id = entry.reader("ESSCertID");
            let hash_algorithm = if v2 {
                match id.try_take_sequence() {
                    Some(algorithm) => {
                        HashAlgorithm::from_oid(AlgorithmIdentifier::decode(algorithm)?.oid())?
                    }
                    None => HashAlgorithm::Sha256,
                }
            } else {
                HashAlgorithm::Sha1
            };
            let cert_hash = id.take::<OctetString>("certHash")?.content_data().clone();
            let serial_number = match id.try_take_sequence() {
                Some(issuer_serial) => {
                    let mut serial = issuer_serial.reader("IssuerSerial");
                    serial.take_sequence("issuer")?;
                    Some(serial.take::<Integer>("serialNumber")?.clone())
                }
                None => None,
            };
            Ok(EssCertId {
                hash_algorithm,
                cert_hash,
                serial_number,
            })
        })
        .collect()
}

fn single_value<'a>(oid: &str, values: &'a [Element]) -> VerifyResult<&'a Element> {
    match values {
        [value] => Ok(value),
        _ => Err(VerifyError::Cms(format!(
            "{} attribute must have exactly one value, found {}",
            oid_name(oid).unwrap_or(oid),
            values.len()
        ))),
    }
}

fn sequence<'a>(oid: &str, value: &'a Element) -> VerifyResult<&'a Constructed> {
    value
        .cast::<Constructed>()
        .filter(|c| c.is_sequence())
        .ok_or_else(|| unexpected(oid, "SEQUENCE", value))
}

fn unexpected(oid: &str, expected: &str, found: &Element) -> VerifyError {
    VerifyError::Cms(format!(
        "{} attribute value must be {expected}, found {}",
        oid_name(oid).unwrap_or(oid),
        found.tag()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![tag, body.len() as u8];
        out.extend_from_slice(body);
        out
    }

    fn attribute(oid: &[u8], value: &[u8]) -> Vec<u8> {
        let mut body = tlv(0x06, oid);
        body.extend(tlv(0x31, value));
        tlv(0x30, &body)
    }

    const CONTENT_TYPE: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x03];
    const MESSAGE_DIGEST: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x04];
    const SPC_INDIRECT: &[u8] = &[0x2b, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37, 0x02, 0x01, 0x04];

    fn container(tag: u8, attributes: &[Vec<u8>]) -> Element {
        Element::from_der(tlv(tag, &attributes.concat())).unwrap()
    }

    #[test]
    fn test_authenticated_attributes_and_canonical_set() {
        let element = container(
            0xa0,
            &[
                attribute(CONTENT_TYPE, &tlv(0x06, SPC_INDIRECT)),
                attribute(MESSAGE_DIGEST, &tlv(0x04, &[0x11; 4])),
            ],
        );
        let set = AttributeSet::decode(element.cast::<Constructed>().unwrap(), AttributeMode::Strict)
            .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.content_type(), Some("1.3.6.1.4.1.311.2.1.4"));
        assert_eq!(set.message_digest(), Some(&[0x11u8; 4][..]));

        let canonical = set.canonical_encoding().unwrap();
        assert_eq!(canonical.first(), Some(0x31));
        assert_eq!(&canonical.as_slice()[1..], &element.element_data().as_slice()[1..]);
    }

    #[test]
    fn test_duplicate_message_digest_rejected() {
        let element = container(
            0xa0,
            &[
                attribute(MESSAGE_DIGEST, &tlv(0x04, &[0x01])),
                attribute(MESSAGE_DIGEST, &tlv(0x04, &[0x02])),
            ],
        );
        assert!(
            AttributeSet::decode(element.cast::<Constructed>().unwrap(), AttributeMode::Strict)
                .is_err()
        );
    }

    #[test]
    fn test_malformed_value_strict_vs_lenient() {
        // message digest carrying an INTEGER instead of an OCTET STRING
        let element = container(0xa1, &[attribute(MESSAGE_DIGEST, &tlv(0x02, &[0x01]))]);
        let constructed = element.cast::<Constructed>().unwrap();
        assert!(AttributeSet::decode(constructed, AttributeMode::Strict).is_err());

        let lenient = AttributeSet::decode(constructed, AttributeMode::Lenient).unwrap();
        assert!(matches!(
            lenient.find(MESSAGE_DIGEST_OID).unwrap().value(),
            AttributeValue::Malformed(_)
        ));
        assert_eq!(lenient.message_digest(), None);
    }

    #[test]
    fn test_unknown_attribute_kept() {
        let element = container(0xa1, &[attribute(&[0x2a, 0x03], &tlv(0x05, &[]))]);
        let set = AttributeSet::decode(element.cast::<Constructed>().unwrap(), AttributeMode::Lenient)
            .unwrap();
        match set.find("1.2.3").unwrap().value() {
            AttributeValue::Unknown(values) => assert_eq!(values.len(), 1),
            other => panic!("unexpected value {other:?}"),
        }
    }
}
