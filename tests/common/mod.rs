//! Fixtures shared by the integration tests.
//!
//! A small DER writer, throwaway OpenSSL signers with self-signed
//! certificates, CMS builders and a minimal PE32 image.

#![allow(dead_code)]

use authenticode_verifier::domain::asn1::Element;
use authenticode_verifier::domain::constants::{
    CONTENT_TYPE_OID, COUNTER_SIGNATURE_OID, ECDSA_WITH_SHA256_OID, MESSAGE_DIGEST_OID,
    MS_RFC3161_TIMESTAMP_OID, RSA_ENCRYPTION_OID, SHA256_OID, SIGNED_DATA_OID,
    SIGNING_CERTIFICATE_OID, SIGNING_TIME_OID, SPC_INDIRECT_DATA_OID, SPC_NESTED_SIGNATURE_OID,
    SPC_PE_IMAGE_DATA_OID, SPC_SP_OPUS_INFO_OID, TST_INFO_OID,
};
use authenticode_verifier::HashAlgorithm;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::sign::Signer;
use openssl::x509::{X509NameBuilder, X509};

// ---------------------------------------------------------------------------
// DER writer
// ---------------------------------------------------------------------------

pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = (len as u32).to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        out.push(0x80 | (4 - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
    out.extend_from_slice(content);
    out
}

pub fn seq(parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x30, &parts.concat())
}

pub fn set(parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x31, &parts.concat())
}

/// Constructed context-specific `[n]`.
pub fn context(number: u8, parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(0xa0 | number, &parts.concat())
}

pub fn octets(value: &[u8]) -> Vec<u8> {
    tlv(0x04, value)
}

pub fn null() -> Vec<u8> {
    vec![0x05, 0x00]
}

pub fn utc_time(text: &str) -> Vec<u8> {
    tlv(0x17, text.as_bytes())
}

pub fn generalized_time(text: &str) -> Vec<u8> {
    tlv(0x18, text.as_bytes())
}

/// INTEGER from an unsigned big-endian magnitude.
pub fn integer(magnitude: &[u8]) -> Vec<u8> {
    let trimmed: Vec<u8> = magnitude.iter().copied().skip_while(|b| *b == 0).collect();
    let mut content = Vec::with_capacity(trimmed.len() + 1);
    if trimmed.first().map_or(true, |b| b & 0x80 != 0) {
        content.push(0);
    }
    content.extend_from_slice(&trimmed);
    tlv(0x02, &content)
}

pub fn small_integer(value: u8) -> Vec<u8> {
    integer(&[value])
}

pub fn oid(dotted: &str) -> Vec<u8> {
    let arcs: Vec<u64> = dotted
        .split('.')
        .map(|arc| arc.parse().expect("numeric arc"))
        .collect();
    let mut content = Vec::new();
    encode_arc(&mut content, arcs[0] * 40 + arcs[1]);
    for arc in &arcs[2..] {
        encode_arc(&mut content, *arc);
    }
    tlv(0x06, &content)
}

fn encode_arc(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value > 0 {
        groups.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    groups.reverse();
    out.extend(groups);
}

pub fn algorithm(oid_text: &str) -> Vec<u8> {
    seq(&[oid(oid_text), null()])
}

pub fn attribute(oid_text: &str, values: &[Vec<u8>]) -> Vec<u8> {
    seq(&[oid(oid_text), set(values)])
}

/// Content octets of a DER element, without tag and length.
pub fn content_octets(der: &[u8]) -> Vec<u8> {
    Element::from_der(der.to_vec())
        .expect("valid DER")
        .content_data()
        .to_vec()
}

pub fn sha256(data: &[u8]) -> Vec<u8> {
    HashAlgorithm::Sha256.digest(data)
}

// ---------------------------------------------------------------------------
// Signers
// ---------------------------------------------------------------------------

/// A private key with a matching self-signed certificate.
pub struct TestSigner {
    pub key: PKey<Private>,
    pub certificate: X509,
    signature_oid: &'static str,
}

impl TestSigner {
    pub fn rsa(common_name: &str, serial: u32) -> Self {
        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        Self::with_key(key, common_name, serial, RSA_ENCRYPTION_OID)
    }

    pub fn p256(common_name: &str, serial: u32) -> Self {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();
        Self::with_key(key, common_name, serial, ECDSA_WITH_SHA256_OID)
    }

    fn with_key(
        key: PKey<Private>,
        common_name: &str,
        serial: u32,
        signature_oid: &'static str,
    ) -> Self {
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", common_name).unwrap();
        name.append_entry_by_text("O", "Example Software").unwrap();
        let name = name.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(365).unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        Self {
            key,
            certificate: builder.build(),
            signature_oid,
        }
    }

    pub fn certificate_der(&self) -> Vec<u8> {
        self.certificate.to_der().unwrap()
    }

    pub fn issuer_and_serial(&self) -> Vec<u8> {
        let issuer = self.certificate.issuer_name().to_der().unwrap();
        let serial = self
            .certificate
            .serial_number()
            .to_bn()
            .unwrap()
            .to_vec();
        seq(&[issuer, integer(&serial)])
    }

    pub fn signature_algorithm(&self) -> Vec<u8> {
        if self.signature_oid == RSA_ENCRYPTION_OID {
            algorithm(self.signature_oid)
        } else {
            seq(&[oid(self.signature_oid)])
        }
    }

    /// SHA-256 signature over `data`; DER `Ecdsa-Sig-Value` for EC keys.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut signer = Signer::new(MessageDigest::sha256(), &self.key).unwrap();
        signer.update(data).unwrap();
        signer.sign_to_vec().unwrap()
    }

    /// `ESSCertID` signing-certificate attribute naming this certificate.
    pub fn signing_certificate_attribute(&self) -> Vec<u8> {
        let hash = HashAlgorithm::Sha1.digest(&self.certificate_der());
        attribute(
            SIGNING_CERTIFICATE_OID,
            &[seq(&[seq(&[seq(&[octets(&hash)])])])],
        )
    }
}

// ---------------------------------------------------------------------------
// CMS builders
// ---------------------------------------------------------------------------

/// `[0] IMPLICIT` authenticated attributes and the signature over their SET
/// encoding.
pub struct SignedAttributes {
    pub implicit: Vec<u8>,
    pub signature: Vec<u8>,
}

pub fn sign_attributes(signer: &TestSigner, attributes: &[Vec<u8>]) -> SignedAttributes {
    let mut encoded = set(attributes);
    let signature = signer.sign(&encoded);
    encoded[0] = 0xa0;
    SignedAttributes {
        implicit: encoded,
        signature,
    }
}

pub fn signer_info(
    signer: &TestSigner,
    signed: &SignedAttributes,
    unauthenticated: &[Vec<u8>],
) -> Vec<u8> {
    let mut fields = vec![
        small_integer(1),
        signer.issuer_and_serial(),
        algorithm(SHA256_OID),
        signed.implicit.clone(),
        signer.signature_algorithm(),
        octets(&signed.signature),
    ];
    if !unauthenticated.is_empty() {
        fields.push(context(1, unauthenticated));
    }
    seq(&fields)
}

/// `ContentInfo` wrapping a `SignedData` over `content`, the element placed
/// in the encapsulated `[0]`.
pub fn signed_data(
    content_type: &str,
    content: &[u8],
    certificates: &[Vec<u8>],
    signer_infos: &[Vec<u8>],
) -> Vec<u8> {
    let inner = seq(&[
        small_integer(1),
        set(&[algorithm(SHA256_OID)]),
        seq(&[oid(content_type), context(0, &[content.to_vec()])]),
        context(0, certificates),
        set(signer_infos),
    ]);
    seq(&[oid(SIGNED_DATA_OID), context(0, &[inner])])
}

pub fn spc_indirect_data(image_digest: &[u8]) -> Vec<u8> {
    seq(&[
        seq(&[oid(SPC_PE_IMAGE_DATA_OID), seq(&[tlv(0x03, &[0x00])])]),
        seq(&[algorithm(SHA256_OID), octets(image_digest)]),
    ])
}

pub fn tst_info(imprint: &[u8]) -> Vec<u8> {
    seq(&[
        small_integer(1),
        oid("1.3.6.1.4.1.4146.2.3"),
        seq(&[algorithm(SHA256_OID), octets(imprint)]),
        integer(&[0x12, 0x34, 0x56]),
        generalized_time("20240101120000Z"),
    ])
}

pub fn opus_info_attribute() -> Vec<u8> {
    let program = context(0, &[tlv(0x81, b"Example App")]);
    let link = context(1, &[tlv(0x80, b"https://example.com")]);
    attribute(SPC_SP_OPUS_INFO_OID, &[seq(&[program, link])])
}

// ---------------------------------------------------------------------------
// Full signature graph
// ---------------------------------------------------------------------------

/// Keys used by [`signature_graph`].
pub struct Fixture {
    pub publisher: TestSigner,
    pub nested: TestSigner,
    pub tsa: TestSigner,
    pub countersigner: TestSigner,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            publisher: TestSigner::rsa("Example Publisher", 0x1001),
            nested: TestSigner::p256("Example Nested Publisher", 0x2002),
            tsa: TestSigner::rsa("Example TSA", 0x8003),
            countersigner: TestSigner::p256("Example Countersigner", 0x4004),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GraphOptions {
    /// Alter a signed attribute after the publisher signature is made.
    pub tamper_primary_attributes: bool,
    /// Stamp a TSTInfo imprint that does not cover the primary signature.
    pub wrong_timestamp_imprint: bool,
    /// Leave out the nested signature, timestamp and countersignature.
    pub primary_only: bool,
    /// Alter the nested signer's message digest after it signs.
    pub tamper_nested: bool,
    /// Alter the countersigner's signing time after it signs.
    pub tamper_countersignature: bool,
    /// Replace the nested signature with a `SignedData` missing its
    /// mandatory fields.
    pub malformed_nested: bool,
}

/// Authenticode `ContentInfo` signing `image_digest`, carrying a nested
/// ECDSA signature, an RFC 3161 timestamp token and a PKCS#9
/// countersignature in the publisher's unauthenticated attributes.
pub fn signature_graph(fixture: &Fixture, image_digest: &[u8], options: GraphOptions) -> Vec<u8> {
    let spc = spc_indirect_data(image_digest);
    let spc_digest = sha256(&content_octets(&spc));

    let mut primary = sign_attributes(
        &fixture.publisher,
        &[
            attribute(CONTENT_TYPE_OID, &[oid(SPC_INDIRECT_DATA_OID)]),
            attribute(MESSAGE_DIGEST_OID, &[octets(&spc_digest)]),
            opus_info_attribute(),
            attribute(SIGNING_TIME_OID, &[utc_time("240101120000Z")]),
        ],
    );
    if options.tamper_primary_attributes {
        // Last seconds digit of the signing time: 00 -> 01.
        let position = primary.implicit.len() - 2;
        primary.implicit[position] = b'1';
    }

    let mut unauthenticated = Vec::new();
    if !options.primary_only {
        let nested = if options.malformed_nested {
            seq(&[
                oid(SIGNED_DATA_OID),
                context(0, &[seq(&[small_integer(1), set(&[])])]),
            ])
        } else {
            nested_signature(&fixture.nested, &spc, &spc_digest, options.tamper_nested)
        };
        unauthenticated.push(attribute(SPC_NESTED_SIGNATURE_OID, &[nested]));

        let imprint = if options.wrong_timestamp_imprint {
            sha256(b"some other signature")
        } else {
            sha256(&primary.signature)
        };
        unauthenticated.push(attribute(
            MS_RFC3161_TIMESTAMP_OID,
            &[timestamp_token(&fixture.tsa, &imprint)],
        ));

        let mut counter = sign_attributes(
            &fixture.countersigner,
            &[
                attribute(MESSAGE_DIGEST_OID, &[octets(&sha256(&primary.signature))]),
                attribute(SIGNING_TIME_OID, &[utc_time("240101120500Z")]),
            ],
        );
        if options.tamper_countersignature {
            let position = counter.implicit.len() - 2;
            counter.implicit[position] = b'1';
        }
        unauthenticated.push(attribute(
            COUNTER_SIGNATURE_OID,
            &[signer_info(&fixture.countersigner, &counter, &[])],
        ));
    }

    signed_data(
        SPC_INDIRECT_DATA_OID,
        &spc,
        &[
            fixture.publisher.certificate_der(),
            fixture.countersigner.certificate_der(),
        ],
        &[signer_info(&fixture.publisher, &primary, &unauthenticated)],
    )
}

fn nested_signature(signer: &TestSigner, spc: &[u8], spc_digest: &[u8], tamper: bool) -> Vec<u8> {
    let mut signed = sign_attributes(
        signer,
        &[
            attribute(CONTENT_TYPE_OID, &[oid(SPC_INDIRECT_DATA_OID)]),
            attribute(MESSAGE_DIGEST_OID, &[octets(spc_digest)]),
        ],
    );
    if tamper {
        // Last octet of the message digest value.
        let position = signed.implicit.len() - 1;
        signed.implicit[position] ^= 0x01;
    }
    signed_data(
        SPC_INDIRECT_DATA_OID,
        spc,
        &[signer.certificate_der()],
        &[signer_info(signer, &signed, &[])],
    )
}

fn timestamp_token(tsa: &TestSigner, imprint: &[u8]) -> Vec<u8> {
    let tst = tst_info(imprint);
    let signed = sign_attributes(
        tsa,
        &[
            attribute(CONTENT_TYPE_OID, &[oid(TST_INFO_OID)]),
            attribute(MESSAGE_DIGEST_OID, &[octets(&sha256(&tst))]),
            tsa.signing_certificate_attribute(),
        ],
    );
    signed_data(
        TST_INFO_OID,
        &octets(&tst),
        &[tsa.certificate_der()],
        &[signer_info(tsa, &signed, &[])],
    )
}

// ---------------------------------------------------------------------------
// PE images
// ---------------------------------------------------------------------------

pub const PE_OFFSET: usize = 0x80;
pub const SECURITY_ENTRY: usize = PE_OFFSET + 24 + 96 + 32;

/// Minimal PE32 image: DOS header, COFF header, optional header with 16
/// data directories, no sections, some body bytes.
pub fn unsigned_pe() -> Vec<u8> {
    let mut data = vec![0u8; 0x400];
    data[0] = b'M';
    data[1] = b'Z';
    data[0x3c] = PE_OFFSET as u8;
    data[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
    data[PE_OFFSET + 4] = 0x4c;
    data[PE_OFFSET + 5] = 0x01;
    data[PE_OFFSET + 20] = 0xe0;
    data[PE_OFFSET + 22] = 0x02;
    let optional = PE_OFFSET + 24;
    data[optional] = 0x0b;
    data[optional + 1] = 0x01;
    data[optional + 33] = 0x10;
    data[optional + 37] = 0x02;
    data[optional + 92] = 16;
    for (index, byte) in data[0x200..].iter_mut().enumerate() {
        *byte = (index % 251) as u8;
    }
    data
}

/// Appends an 8-byte aligned certificate table holding `signatures` as
/// revision 2.0 PKCS#7 entries and points the security directory at it.
pub fn attach_signatures(mut image: Vec<u8>, signatures: &[Vec<u8>]) -> Vec<u8> {
    let table_start = image.len();
    for signature in signatures {
        let length = (8 + signature.len()) as u32;
        image.extend_from_slice(&length.to_le_bytes());
        image.extend_from_slice(&0x0200u16.to_le_bytes());
        image.extend_from_slice(&0x0002u16.to_le_bytes());
        image.extend_from_slice(signature);
        while image.len() % 8 != 0 {
            image.push(0);
        }
    }
    let table_size = (image.len() - table_start) as u32;
    image[SECURITY_ENTRY..SECURITY_ENTRY + 4].copy_from_slice(&(table_start as u32).to_le_bytes());
    image[SECURITY_ENTRY + 4..SECURITY_ENTRY + 8].copy_from_slice(&table_size.to_le_bytes());
    image
}
