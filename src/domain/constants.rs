//! Centralized constants: object identifiers in dotted form and PE layout values.
//! Keep this intentionally small; only broadly reused literals should live here.

// === CMS Content Types ===

/// PKCS#7 data (1.2.840.113549.1.7.1)
pub const DATA_OID: &str = "1.2.840.113549.1.7.1";

/// PKCS#7 signed-data (1.2.840.113549.1.7.2)
pub const SIGNED_DATA_OID: &str = "1.2.840.113549.1.7.2";

/// `SpcIndirectDataContent` (1.3.6.1.4.1.311.2.1.4)
pub const SPC_INDIRECT_DATA_OID: &str = "1.3.6.1.4.1.311.2.1.4";

/// RFC 3161 `TSTInfo` (1.2.840.113549.1.9.16.1.4)
pub const TST_INFO_OID: &str = "1.2.840.113549.1.9.16.1.4";

// === Attribute Types ===

pub const CONTENT_TYPE_OID: &str = "1.2.840.113549.1.9.3";
pub const MESSAGE_DIGEST_OID: &str = "1.2.840.113549.1.9.4";
pub const SIGNING_TIME_OID: &str = "1.2.840.113549.1.9.5";
pub const COUNTER_SIGNATURE_OID: &str = "1.2.840.113549.1.9.6";
pub const SPC_SP_OPUS_INFO_OID: &str = "1.3.6.1.4.1.311.2.1.12";
pub const SPC_STATEMENT_TYPE_OID: &str = "1.3.6.1.4.1.311.2.1.11";
pub const SPC_NESTED_SIGNATURE_OID: &str = "1.3.6.1.4.1.311.2.4.1";
pub const MS_RFC3161_TIMESTAMP_OID: &str = "1.3.6.1.4.1.311.3.3.1";
pub const SIGNING_CERTIFICATE_OID: &str = "1.2.840.113549.1.9.16.2.12";
pub const SIGNING_CERTIFICATE_V2_OID: &str = "1.2.840.113549.1.9.16.2.47";

// === SPC Data Types ===

pub const SPC_PE_IMAGE_DATA_OID: &str = "1.3.6.1.4.1.311.2.1.15";

// === Digest Algorithms ===

pub const MD5_OID: &str = "1.2.840.113549.2.5";
pub const SHA1_OID: &str = "1.3.14.3.2.26";
pub const SHA256_OID: &str = "2.16.840.1.101.3.4.2.1";
pub const SHA384_OID: &str = "2.16.840.1.101.3.4.2.2";
pub const SHA512_OID: &str = "2.16.840.1.101.3.4.2.3";

// === Signature Algorithms ===

pub const RSA_ENCRYPTION_OID: &str = "1.2.840.113549.1.1.1";
pub const MD5_WITH_RSA_OID: &str = "1.2.840.113549.1.1.4";
pub const SHA1_WITH_RSA_OID: &str = "1.2.840.113549.1.1.5";
pub const SHA256_WITH_RSA_OID: &str = "1.2.840.113549.1.1.11";
pub const SHA384_WITH_RSA_OID: &str = "1.2.840.113549.1.1.12";
pub const SHA512_WITH_RSA_OID: &str = "1.2.840.113549.1.1.13";
/// OIW sha1WithRSASignature, still seen in old Authenticode signatures
pub const SHA1_WITH_RSA_OIW_OID: &str = "1.3.14.3.2.29";

pub const EC_PUBLIC_KEY_OID: &str = "1.2.840.10045.2.1";
pub const ECDSA_WITH_SHA1_OID: &str = "1.2.840.10045.4.1";
pub const ECDSA_WITH_SHA256_OID: &str = "1.2.840.10045.4.3.2";
pub const ECDSA_WITH_SHA384_OID: &str = "1.2.840.10045.4.3.3";
pub const ECDSA_WITH_SHA512_OID: &str = "1.2.840.10045.4.3.4";

// === Named Curves ===

pub const SECP256R1_OID: &str = "1.2.840.10045.3.1.7";
pub const SECP384R1_OID: &str = "1.3.132.0.34";
pub const SECP521R1_OID: &str = "1.3.132.0.35";

// === X.509 ===

pub const SUBJECT_KEY_IDENTIFIER_OID: &str = "2.5.29.14";
pub const COMMON_NAME_OID: &str = "2.5.4.3";
pub const SERIAL_NUMBER_OID: &str = "2.5.4.5";
pub const COUNTRY_OID: &str = "2.5.4.6";
pub const LOCALITY_OID: &str = "2.5.4.7";
pub const STATE_OID: &str = "2.5.4.8";
pub const ORGANIZATION_OID: &str = "2.5.4.10";
pub const ORGANIZATIONAL_UNIT_OID: &str = "2.5.4.11";
pub const EMAIL_ADDRESS_OID: &str = "1.2.840.113549.1.9.1";

// === PE Layout ===

/// Offset of the optional header from the PE signature
pub const PE_OPTIONAL_HEADER_OFFSET: usize = 24;

/// Offset of `CheckSum` within the optional header (same for PE32 and PE32+)
pub const PE_CHECKSUM_OFFSET: usize = 64;

/// Offset of the data directories within a PE32 optional header
pub const PE32_DATA_DIRECTORIES_OFFSET: usize = 96;

/// Offset of the data directories within a PE32+ optional header
pub const PE32_PLUS_DATA_DIRECTORIES_OFFSET: usize = 112;

/// Index of the certificate table (security directory) entry
pub const SECURITY_DIRECTORY_INDEX: usize = 4;

pub const PE32_MAGIC: u16 = 0x10b;
pub const PE32_PLUS_MAGIC: u16 = 0x20b;

// === WIN_CERTIFICATE ===

pub const WIN_CERT_REVISION_1_0: u16 = 0x0100;
pub const WIN_CERT_REVISION_2_0: u16 = 0x0200;
pub const WIN_CERT_TYPE_PKCS_SIGNED_DATA: u16 = 0x0002;

/// Size of the `dwLength`/`wRevision`/`wCertificateType` header
pub const WIN_CERTIFICATE_HEADER_SIZE: usize = 8;

/// Certificate table entries start on 8-byte boundaries
pub const WIN_CERTIFICATE_ALIGNMENT: usize = 8;

// === Hashing ===

/// Default block size for streamed digests
pub const DEFAULT_HASH_BLOCK_SIZE: usize = 64 * 1024;

/// Friendly name for well-known object identifiers.
#[must_use]
pub fn oid_name(oid: &str) -> Option<&'static str> {
    let name = match oid {
        DATA_OID => "data",
        SIGNED_DATA_OID => "signedData",
        SPC_INDIRECT_DATA_OID => "SpcIndirectDataContent",
        TST_INFO_OID => "TSTInfo",
        CONTENT_TYPE_OID => "contentType",
        MESSAGE_DIGEST_OID => "messageDigest",
        SIGNING_TIME_OID => "signingTime",
        COUNTER_SIGNATURE_OID => "counterSignature",
        SPC_SP_OPUS_INFO_OID => "SpcSpOpusInfo",
        SPC_STATEMENT_TYPE_OID => "SpcStatementType",
        SPC_NESTED_SIGNATURE_OID => "nestedSignature",
        MS_RFC3161_TIMESTAMP_OID => "rfc3161Timestamp",
        SIGNING_CERTIFICATE_OID => "signingCertificate",
        SIGNING_CERTIFICATE_V2_OID => "signingCertificateV2",
        SPC_PE_IMAGE_DATA_OID => "SpcPeImageData",
        MD5_OID => "md5",
        SHA1_OID => "sha1",
        SHA256_OID => "sha256",
        SHA384_OID => "sha384",
        SHA512_OID => "sha512",
        RSA_ENCRYPTION_OID => "rsaEncryption",
        MD5_WITH_RSA_OID => "md5WithRSAEncryption",
        SHA1_WITH_RSA_OID | SHA1_WITH_RSA_OIW_OID => "sha1WithRSAEncryption",
        SHA256_WITH_RSA_OID => "sha256WithRSAEncryption",
        SHA384_WITH_RSA_OID => "sha384WithRSAEncryption",
        SHA512_WITH_RSA_OID => "sha512WithRSAEncryption",
        EC_PUBLIC_KEY_OID => "ecPublicKey",
        ECDSA_WITH_SHA1_OID => "ecdsa-with-SHA1",
        ECDSA_WITH_SHA256_OID => "ecdsa-with-SHA256",
        ECDSA_WITH_SHA384_OID => "ecdsa-with-SHA384",
        ECDSA_WITH_SHA512_OID => "ecdsa-with-SHA512",
        SECP256R1_OID => "prime256v1",
        SECP384R1_OID => "secp384r1",
        SECP521R1_OID => "secp521r1",
        SUBJECT_KEY_IDENTIFIER_OID => "subjectKeyIdentifier",
        COMMON_NAME_OID => "commonName",
        SERIAL_NUMBER_OID => "serialNumber",
        COUNTRY_OID => "countryName",
        LOCALITY_OID => "localityName",
        STATE_OID => "stateOrProvinceName",
        ORGANIZATION_OID => "organizationName",
        ORGANIZATIONAL_UNIT_OID => "organizationalUnitName",
        EMAIL_ADDRESS_OID => "emailAddress",
        _ => return None,
    };
    Some(name)
}

/// Short attribute label used when printing distinguished names.
#[must_use]
pub fn name_attribute_label(oid: &str) -> Option<&'static str> {
    let label = match oid {
        COMMON_NAME_OID => "CN",
        SERIAL_NUMBER_OID => "serialNumber",
        COUNTRY_OID => "C",
        LOCALITY_OID => "L",
        STATE_OID => "ST",
        ORGANIZATION_OID => "O",
        ORGANIZATIONAL_UNIT_OID => "OU",
        EMAIL_ADDRESS_OID => "emailAddress",
        _ => return None,
    };
    Some(label)
}
