//! OpenSSL-backed signature primitives.
//!
//! Keys arrive as raw components unpacked from certificates; this adapter
//! imports them into OpenSSL and checks signatures over precomputed digests.

use crate::domain::crypto::{EcCurve, EcPublicKey, RsaPublicKey, SignatureVerifier};
use crate::HashAlgorithm;
use openssl::bn::{BigNum, BigNumContext};
use openssl::ec::{EcGroup, EcKey, EcPoint};
use openssl::ecdsa::EcdsaSig;
use openssl::error::ErrorStack;
use openssl::md::Md;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::pkey_ctx::PkeyCtx;
use openssl::rsa::{Padding, Rsa};

/// `SignatureVerifier` using the system OpenSSL library.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenSslVerifier;

impl OpenSslVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn rsa(
        key: &RsaPublicKey,
        algorithm: HashAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<bool, ErrorStack> {
        let rsa = Rsa::from_public_components(
            BigNum::from_slice(key.modulus())?,
            BigNum::from_slice(key.exponent())?,
        )?;
        let pkey = PKey::from_rsa(rsa)?;
        let mut ctx = PkeyCtx::new(&pkey)?;
        ctx.verify_init()?;
        ctx.set_rsa_padding(Padding::PKCS1)?;
        ctx.set_signature_md(message_digest(algorithm))?;
        ctx.verify(digest, signature)
    }

    fn ecdsa(key: &EcPublicKey, digest: &[u8], signature: &[u8]) -> Result<bool, ErrorStack> {
        let group = EcGroup::from_curve_name(curve_nid(key.curve()))?;
        let mut ctx = BigNumContext::new()?;
        let point = EcPoint::from_bytes(&group, key.point(), &mut ctx)?;
        let ec_key = EcKey::from_public_key(&group, &point)?;

        let (r, s) = signature.split_at(signature.len() / 2);
        let sig = EcdsaSig::from_private_components(BigNum::from_slice(r)?, BigNum::from_slice(s)?)?;
        sig.verify(digest, &ec_key)
    }
}

impl SignatureVerifier for OpenSslVerifier {
    fn verify_rsa(
        &self,
        key: &RsaPublicKey,
        algorithm: HashAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> bool {
        Self::rsa(key, algorithm, digest, signature).unwrap_or_else(|e| {
            log::debug!("OpenSSL RSA verification error: {e}");
            false
        })
    }

    fn verify_ecdsa(&self, key: &EcPublicKey, digest: &[u8], signature: &[u8]) -> bool {
        if signature.len() != key.curve().coordinate_size() * 2 {
            log::debug!(
                "ECDSA signature of {} bytes does not fit {}",
                signature.len(),
                key.curve().name()
            );
            return false;
        }
        Self::ecdsa(key, digest, signature).unwrap_or_else(|e| {
            log::debug!("OpenSSL ECDSA verification error: {e}");
            false
        })
    }
}

fn message_digest(algorithm: HashAlgorithm) -> &'static openssl::md::MdRef {
    match algorithm {
        HashAlgorithm::Md5 => Md::md5(),
        HashAlgorithm::Sha1 => Md::sha1(),
        HashAlgorithm::Sha256 => Md::sha256(),
        HashAlgorithm::Sha384 => Md::sha384(),
        HashAlgorithm::Sha512 => Md::sha512(),
    }
}

fn curve_nid(curve: EcCurve) -> Nid {
    match curve {
        EcCurve::P256 => Nid::X9_62_PRIME256V1,
        EcCurve::P384 => Nid::SECP384R1,
        EcCurve::P521 => Nid::SECP521R1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::ec::PointConversionForm;
    use openssl::sign::Signer;

    #[test]
    fn test_rsa_round_trip() {
        let rsa = Rsa::generate(2048).unwrap();
        let n = rsa.n().to_vec();
        let e = rsa.e().to_vec();
        let pkey = PKey::from_rsa(rsa).unwrap();

        let mut signer = Signer::new(openssl::hash::MessageDigest::sha256(), &pkey).unwrap();
        signer.update(b"payload").unwrap();
        let signature = signer.sign_to_vec().unwrap();

        let key = RsaPublicKey::from_components(n, e);
        let digest = HashAlgorithm::Sha256.digest(b"payload");
        let verifier = OpenSslVerifier::new();
        assert!(verifier.verify_rsa(&key, HashAlgorithm::Sha256, &digest, &signature));
        assert!(!verifier.verify_rsa(
            &key,
            HashAlgorithm::Sha256,
            &HashAlgorithm::Sha256.digest(b"other"),
            &signature
        ));
        assert!(!verifier.verify_rsa(&key, HashAlgorithm::Sha256, &digest, &[0u8; 4]));
    }

    #[test]
    fn test_ecdsa_round_trip() {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let private = EcKey::generate(&group).unwrap();
        let mut ctx = BigNumContext::new().unwrap();
        let point = private
            .public_key()
            .to_bytes(&group, PointConversionForm::UNCOMPRESSED, &mut ctx)
            .unwrap();

        let digest = HashAlgorithm::Sha256.digest(b"payload");
        let sig = EcdsaSig::sign(&digest, &private).unwrap();
        let mut packed = sig.r().to_vec_padded(32).unwrap();
        packed.extend(sig.s().to_vec_padded(32).unwrap());

        let key = EcPublicKey::from_components(EcCurve::P256, point);
        let verifier = OpenSslVerifier::new();
        assert!(verifier.verify_ecdsa(&key, &digest, &packed));
        packed[10] ^= 0x01;
        assert!(!verifier.verify_ecdsa(&key, &digest, &packed));
        assert!(!verifier.verify_ecdsa(&key, &digest, &packed[..10]));
    }
}
