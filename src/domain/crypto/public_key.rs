//! Public keys extracted from certificates, and signature format helpers.

use crate::domain::asn1::{ByteWindow, Constructed, Element, Integer, ObjectIdentifier};
use crate::domain::pkcs7::SubjectPublicKeyInfo;
use crate::domain::constants::{
    ECDSA_WITH_SHA1_OID, ECDSA_WITH_SHA256_OID, ECDSA_WITH_SHA384_OID, ECDSA_WITH_SHA512_OID,
    EC_PUBLIC_KEY_OID, MD5_WITH_RSA_OID, RSA_ENCRYPTION_OID, SECP256R1_OID, SECP384R1_OID,
    SECP521R1_OID, SHA1_WITH_RSA_OID, SHA1_WITH_RSA_OIW_OID, SHA256_WITH_RSA_OID,
    SHA384_WITH_RSA_OID, SHA512_WITH_RSA_OID,
};
use crate::infra::error::{VerifyError, VerifyResult};

/// Signature scheme family named by a signer's digest-encryption algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureFamily {
    Rsa,
    Ecdsa,
}

impl SignatureFamily {
    /// `None` for algorithm OIDs outside the RSA and ECDSA families.
    #[must_use]
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid {
            RSA_ENCRYPTION_OID | MD5_WITH_RSA_OID | SHA1_WITH_RSA_OID | SHA1_WITH_RSA_OIW_OID
            | SHA256_WITH_RSA_OID | SHA384_WITH_RSA_OID | SHA512_WITH_RSA_OID => {
                Some(SignatureFamily::Rsa)
            }
            EC_PUBLIC_KEY_OID | ECDSA_WITH_SHA1_OID | ECDSA_WITH_SHA256_OID
            | ECDSA_WITH_SHA384_OID | ECDSA_WITH_SHA512_OID => Some(SignatureFamily::Ecdsa),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    #[must_use]
    pub fn from_oid(oid: &str) -> Option<Self> {
        match oid {
            SECP256R1_OID => Some(EcCurve::P256),
            SECP384R1_OID => Some(EcCurve::P384),
            SECP521R1_OID => Some(EcCurve::P521),
            _ => None,
        }
    }

    /// Width in bytes of one coordinate, and of each of `r` and `s`.
    #[must_use]
    pub fn coordinate_size(self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EcCurve::P256 => "P-256",
            EcCurve::P384 => "P-384",
            EcCurve::P521 => "P-521",
        }
    }
}

/// `RSAPublicKey { modulus, publicExponent }` as unsigned big-endian octets.
#[derive(Debug, Clone)]
pub struct RsaPublicKey {
    modulus: ByteWindow,
    exponent: ByteWindow,
}

impl RsaPublicKey {
    #[must_use]
    pub fn from_components(modulus: impl Into<ByteWindow>, exponent: impl Into<ByteWindow>) -> Self {
        Self {
            modulus: modulus.into(),
            exponent: exponent.into(),
        }
    }

    #[must_use]
    pub fn modulus(&self) -> &[u8] {
        self.modulus.as_slice()
    }

    #[must_use]
    pub fn exponent(&self) -> &[u8] {
        self.exponent.as_slice()
    }
}

/// Named-curve EC key with its encoded public point.
#[derive(Debug, Clone)]
pub struct EcPublicKey {
    curve: EcCurve,
    point: ByteWindow,
}

impl EcPublicKey {
    #[must_use]
    pub fn from_components(curve: EcCurve, point: impl Into<ByteWindow>) -> Self {
        Self {
            curve,
            point: point.into(),
        }
    }

    #[must_use]
    pub fn curve(&self) -> EcCurve {
        self.curve
    }

    #[must_use]
    pub fn point(&self) -> &[u8] {
        self.point.as_slice()
    }
}

#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Ec(EcPublicKey),
}

impl PublicKey {
    /// Unpacks the key carried by a certificate's `SubjectPublicKeyInfo`.
    pub fn from_spki(spki: &SubjectPublicKeyInfo) -> VerifyResult<Self> {
        let key_bits = spki.public_key();
        if key_bits.unused_bits() != 0 {
            return Err(VerifyError::CryptographicError(
                "public key BIT STRING has unused bits".to_string(),
            ));
        }

        match spki.algorithm().oid() {
            RSA_ENCRYPTION_OID => {
                let element = Element::decode(key_bits.bits())?;
                let sequence = element
                    .cast::<Constructed>()
                    .filter(|c| c.is_sequence())
                    .ok_or_else(|| VerifyError::Cms("RSAPublicKey must be a SEQUENCE".to_string()))?;
                let mut fields = sequence.reader("RSAPublicKey");
                let modulus = fields.take::<Integer>("modulus")?.unsigned_bytes();
                let exponent = fields.take::<Integer>("publicExponent")?.unsigned_bytes();
                Ok(PublicKey::Rsa(RsaPublicKey { modulus, exponent }))
            }
            EC_PUBLIC_KEY_OID => {
                let curve_oid = spki
                    .algorithm()
                    .parameters()
                    .and_then(|p| p.cast::<ObjectIdentifier>())
                    .ok_or_else(|| {
                        VerifyError::UnsupportedAlgorithm(
                            "EC key without a named curve".to_string(),
                        )
                    })?;
                let curve = EcCurve::from_oid(curve_oid.dotted()).ok_or_else(|| {
                    VerifyError::UnsupportedAlgorithm(format!("EC curve {}", curve_oid.dotted()))
                })?;
                Ok(PublicKey::Ec(EcPublicKey {
                    curve,
                    point: key_bits.bits().clone(),
                }))
            }
            other => Err(VerifyError::UnsupportedAlgorithm(format!(
                "public key algorithm {other}"
            ))),
        }
    }

    #[must_use]
    pub fn family(&self) -> SignatureFamily {
        match self {
            PublicKey::Rsa(_) => SignatureFamily::Rsa,
            PublicKey::Ec(_) => SignatureFamily::Ecdsa,
        }
    }
}

/// Repacks a DER `ECDSA-Sig-Value { r, s }` into fixed-width `r || s`.
pub fn repack_ecdsa_signature(der: &ByteWindow, curve: EcCurve) -> VerifyResult<Vec<u8>> {
    let width = curve.coordinate_size();
    let element = Element::decode(der)?;
    let sequence = element
        .cast::<Constructed>()
        .filter(|c| c.is_sequence())
        .ok_or_else(|| VerifyError::CryptographicError("ECDSA signature is not a SEQUENCE".to_string()))?;
    let mut fields = sequence.reader("ECDSA-Sig-Value");
    let r = fields.take::<Integer>("r")?.unsigned_bytes();
    let s = fields.take::<Integer>("s")?.unsigned_bytes();

    let mut packed = vec![0u8; width * 2];
    for (index, value) in [r, s].iter().enumerate() {
        if value.len() > width {
            return Err(VerifyError::CryptographicError(format!(
                "ECDSA integer of {} bytes exceeds {} curve width",
                value.len(),
                curve.name()
            )));
        }
        let end = (index + 1) * width;
        packed[end - value.len()..end].copy_from_slice(value.as_slice());
    }
    Ok(packed)
}
