use super::content_info::{Content, ContentInfo};
use super::signed_data::SignedData;
use crate::domain::asn1::{ByteWindow, Constructed, Element};
use crate::domain::constants::SIGNED_DATA_OID;
use crate::infra::error::{VerifyError, VerifyResult};
use std::fmt;
use std::sync::Arc;

/// A CMS signature: a `ContentInfo` whose content is `SignedData`.
///
/// The same type is used for the primary Authenticode signature, nested
/// signatures and RFC 3161 timestamp tokens.
#[derive(Clone)]
pub struct CmsSignature {
    encoded: ByteWindow,
    signed_data: Box<SignedData>,
}

impl CmsSignature {
    /// Decodes a DER (or BER) encoded signature blob.
    pub fn from_der(bytes: impl Into<Arc<[u8]>>) -> VerifyResult<Self> {
        let element = Element::from_der(bytes)?;
        Self::from_element(&element)
    }

    /// Builds a signature from an already decoded `ContentInfo` element.
    pub fn from_element(element: &Element) -> VerifyResult<Self> {
        let sequence = element
            .cast::<Constructed>()
            .filter(|c| c.is_sequence())
            .ok_or_else(|| VerifyError::UnexpectedElement {
                structure: "ContentInfo",
                field: "ContentInfo",
                expected: "SEQUENCE",
                found: element.tag().to_string(),
            })?;
        let content_info = ContentInfo::decode(sequence)?;
        if content_info.content_type() != SIGNED_DATA_OID {
            return Err(VerifyError::Cms(format!(
                "expected signed-data content, found {}",
                content_info.content_type()
            )));
        }
        match content_info.into_content() {
            Some(Content::SignedData(signed_data)) => Ok(Self {
                encoded: element.element_data().clone(),
                signed_data,
            }),
            _ => Err(VerifyError::MissingField {
                structure: "ContentInfo",
                field: "content",
            }),
        }
    }

    #[must_use]
    pub fn signed_data(&self) -> &SignedData {
        &self.signed_data
    }
}

impl fmt::Debug for CmsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CmsSignature(content={}, signers={}, certificates={}, len={})",
            self.signed_data.content_info().content_type(),
            self.signed_data.signer_infos().len(),
            self.signed_data.certificates().len(),
            self.encoded.len()
        )
    }
}
