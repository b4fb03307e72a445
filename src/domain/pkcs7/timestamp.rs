//! RFC 3161 `TSTInfo`.
//!
//! Located under `domain::pkcs7` because the timestamp token is a `SignedData`
//! whose encapsulated content is a `TSTInfo`, carried as an unsigned attribute
//! of the signature it timestamps.

use super::algorithm::AlgorithmIdentifier;
use crate::domain::asn1::{Boolean, Constructed, Integer, ObjectIdentifier, OctetString, Time};
use crate::infra::error::VerifyResult;
use crate::HashAlgorithm;
use chrono::{DateTime, FixedOffset};

/// `MessageImprint { hashAlgorithm, hashedMessage }`
#[derive(Debug, Clone)]
pub struct MessageImprint {
    algorithm: AlgorithmIdentifier,
    hashed_message: OctetString,
}

impl MessageImprint {
    #[must_use]
    pub fn algorithm(&self) -> &AlgorithmIdentifier {
        &self.algorithm
    }

    pub fn hash_algorithm(&self) -> VerifyResult<HashAlgorithm> {
        HashAlgorithm::from_oid(self.algorithm.oid())
    }

    #[must_use]
    pub fn hashed_message(&self) -> &[u8] {
        self.hashed_message.value()
    }
}

#[derive(Debug, Clone)]
pub struct TstInfo {
    version: Integer,
    policy: String,
    message_imprint: MessageImprint,
    serial_number: Integer,
    gen_time: DateTime<FixedOffset>,
    nonce: Option<Integer>,
}

impl TstInfo {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let mut fields = sequence.reader("TSTInfo");
        let version = fields.take::<Integer>("version")?.clone();
        let policy = fields.take::<ObjectIdentifier>("policy")?.dotted().to_owned();

        let imprint = fields.take_sequence("messageImprint")?;
        let mut imprint_fields = imprint.reader("MessageImprint");
        let message_imprint = MessageImprint {
            algorithm: AlgorithmIdentifier::decode(imprint_fields.take_sequence("hashAlgorithm")?)?,
            hashed_message: imprint_fields.take::<OctetString>("hashedMessage")?.clone(),
        };

        let serial_number = fields.take::<Integer>("serialNumber")?.clone();
        let gen_time = fields.take::<Time>("genTime")?.value();
        fields.try_take_sequence(); // accuracy
        fields.try_take::<Boolean>(); // ordering
        let nonce = fields.try_take::<Integer>().cloned();

        Ok(Self {
            version,
            policy,
            message_imprint,
            serial_number,
            gen_time,
            nonce,
        })
    }

    #[must_use]
    pub fn version(&self) -> &Integer {
        &self.version
    }

    #[must_use]
    pub fn policy(&self) -> &str {
        &self.policy
    }

    #[must_use]
    pub fn message_imprint(&self) -> &MessageImprint {
        &self.message_imprint
    }

    #[must_use]
    pub fn serial_number(&self) -> &Integer {
        &self.serial_number
    }

    #[must_use]
    pub fn gen_time(&self) -> DateTime<FixedOffset> {
        self.gen_time
    }

    #[must_use]
    pub fn nonce(&self) -> Option<&Integer> {
        self.nonce.as_ref()
    }
}
