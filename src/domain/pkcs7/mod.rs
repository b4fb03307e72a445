//! PKCS#7 / CMS domain model.
//!
//! Typed views over decoded elements: `ContentInfo`, `SignedData`,
//! `SignerInfo` with its attributes, the certificates and names they refer
//! to, and the RFC 3161 `TSTInfo`. Every type keeps windows into the source
//! buffer rather than copies.

mod algorithm;
pub mod attributes;
mod certificate;
mod content_info;
mod name;
mod signature;
mod signed_data;
mod signer_info;
pub mod timestamp;

pub use algorithm::AlgorithmIdentifier;
pub use attributes::{Attribute, AttributeMode, AttributeSet, AttributeValue, EssCertId};
pub use certificate::{Certificate, SubjectPublicKeyInfo};
pub use content_info::{Content, ContentInfo};
pub use name::{AttributeTypeAndValue, Name, RelativeDistinguishedName};
pub use signature::CmsSignature;
pub use signed_data::SignedData;
pub use signer_info::{SignerIdentifier, SignerInfo};
pub use timestamp::{MessageImprint, TstInfo};
