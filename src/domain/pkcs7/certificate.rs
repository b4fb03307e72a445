//! X.509 certificates as carried in a `SignedData` certificate set.
//!
//! Only the fields signature verification needs are decoded; the rest of the
//! TBS structure is skipped. Chain building and validity checks are outside
//! this module.

use super::algorithm::AlgorithmIdentifier;
use super::name::Name;
use crate::domain::asn1::{
    BitString, Boolean, ByteWindow, Constructed, Element, Integer, ObjectIdentifier, OctetString,
    Time,
};
use crate::domain::constants::SUBJECT_KEY_IDENTIFIER_OID;
use crate::infra::error::{VerifyError, VerifyResult};
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::sync::Arc;

/// `SubjectPublicKeyInfo { algorithm, subjectPublicKey BIT STRING }`
#[derive(Debug, Clone)]
pub struct SubjectPublicKeyInfo {
    algorithm: AlgorithmIdentifier,
    public_key: BitString,
}

impl SubjectPublicKeyInfo {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let mut fields = sequence.reader("SubjectPublicKeyInfo");
        let algorithm = AlgorithmIdentifier::decode(fields.take_sequence("algorithm")?)?;
        let public_key = fields.take::<BitString>("subjectPublicKey")?.clone();
        Ok(Self {
            algorithm,
            public_key,
        })
    }

    #[must_use]
    pub fn algorithm(&self) -> &AlgorithmIdentifier {
        &self.algorithm
    }

    #[must_use]
    pub fn public_key(&self) -> &BitString {
        &self.public_key
    }
}

#[derive(Clone)]
pub struct Certificate {
    der: ByteWindow,
    serial_number: Integer,
    signature_algorithm: AlgorithmIdentifier,
    issuer: Name,
    subject: Name,
    not_before: DateTime<FixedOffset>,
    not_after: DateTime<FixedOffset>,
    public_key_info: SubjectPublicKeyInfo,
    subject_key_identifier: Option<ByteWindow>,
}

impl Certificate {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let mut outer = sequence.reader("Certificate");
        let tbs = outer.take_sequence("tbsCertificate")?;
        let signature_algorithm =
            AlgorithmIdentifier::decode(outer.take_sequence("signatureAlgorithm")?)?;
        outer.take::<BitString>("signatureValue")?;

        let mut fields = tbs.reader("TBSCertificate");
        fields.try_take_context(0);
        let serial_number = fields.take::<Integer>("serialNumber")?.clone();
        fields.take_sequence("signature")?;
        let issuer = Name::decode(fields.take_sequence("issuer")?)?;

        let validity = fields.take_sequence("validity")?;
        let mut period = validity.reader("Validity");
        let not_before = period.take::<Time>("notBefore")?.value();
        let not_after = period.take::<Time>("notAfter")?.value();

        let subject = Name::decode(fields.take_sequence("subject")?)?;
        let public_key_info =
            SubjectPublicKeyInfo::decode(fields.take_sequence("subjectPublicKeyInfo")?)?;

        fields.try_take_context(1);
        fields.try_take_context(2);
        let subject_key_identifier = match fields.try_take_context(3) {
            Some(extensions) => find_subject_key_identifier(extensions)?,
            None => None,
        };

        Ok(Self {
            der: sequence.element_data().clone(),
            serial_number,
            signature_algorithm,
            issuer,
            subject,
            not_before,
            not_after,
            public_key_info,
            subject_key_identifier,
        })
    }

    /// Decodes a standalone DER certificate.
    pub fn from_der(bytes: impl Into<Arc<[u8]>>) -> VerifyResult<Self> {
        let element = Element::from_der(bytes)?;
        let sequence = element
            .cast::<Constructed>()
            .filter(|c| c.is_sequence())
            .ok_or_else(|| VerifyError::Cms("certificate must be a SEQUENCE".to_string()))?;
        Self::decode(sequence)
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        self.der.as_slice()
    }

    #[must_use]
    pub fn serial_number(&self) -> &Integer {
        &self.serial_number
    }

    #[must_use]
    pub fn signature_algorithm(&self) -> &AlgorithmIdentifier {
        &self.signature_algorithm
    }

    #[must_use]
    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    #[must_use]
    pub fn subject(&self) -> &Name {
        &self.subject
    }

    #[must_use]
    pub fn not_before(&self) -> DateTime<FixedOffset> {
        self.not_before
    }

    #[must_use]
    pub fn not_after(&self) -> DateTime<FixedOffset> {
        self.not_after
    }

    #[must_use]
    pub fn public_key_info(&self) -> &SubjectPublicKeyInfo {
        &self.public_key_info
    }

    #[must_use]
    pub fn subject_key_identifier(&self) -> Option<&[u8]> {
        self.subject_key_identifier.as_ref().map(ByteWindow::as_slice)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Certificate(subject={}, serial={}, len={})",
            self.subject,
            self.serial_number.value(),
            self.der.len()
        )
    }
}

/// Walks `[3] EXPLICIT Extensions` for subjectKeyIdentifier.
fn find_subject_key_identifier(wrapper: &Element) -> VerifyResult<Option<ByteWindow>> {
    let Some(extensions) = wrapper
        .cast::<Constructed>()
        .and_then(|explicit| explicit.get(0))
        .and_then(|inner| inner.cast::<Constructed>())
    else {
        return Err(VerifyError::Cms("malformed certificate extensions".to_string()));
    };

    for extension in extensions.children() {
        let Some(extension) = extension.cast::<Constructed>() else {
            continue;
        };
        let mut fields = extension.reader("Extension");
        let oid = fields.take::<ObjectIdentifier>("extnID")?;
        if oid.dotted() != SUBJECT_KEY_IDENTIFIER_OID {
            continue;
        }
        fields.try_take::<Boolean>();
        let value = fields.take::<OctetString>("extnValue")?;
        let inner = Element::decode(value.content_data())?;
        let identifier = inner.cast::<OctetString>().ok_or_else(|| {
            VerifyError::Cms("subjectKeyIdentifier must be an OCTET STRING".to_string())
        })?;
        return Ok(Some(identifier.content_data().clone()));
    }
    Ok(None)
}
