use super::signed_data::SignedData;
use super::timestamp::TstInfo;
use crate::domain::asn1::{ByteWindow, Constructed, Element, ObjectIdentifier, OctetString};
use crate::domain::constants::{DATA_OID, SIGNED_DATA_OID, SPC_INDIRECT_DATA_OID, TST_INFO_OID};
use crate::domain::spc::SpcIndirectData;
use crate::infra::error::{VerifyError, VerifyResult};

/// Typed body of a `ContentInfo`.
#[derive(Debug, Clone)]
pub enum Content {
    Data(OctetString),
    SignedData(Box<SignedData>),
    SpcIndirectData(SpcIndirectData),
    TstInfo(TstInfo),
}

/// `ContentInfo { contentType OID, content [0] EXPLICIT ANY OPTIONAL }`
#[derive(Debug, Clone)]
pub struct ContentInfo {
    content_type: String,
    content: Option<Content>,
    signed_bytes: Option<ByteWindow>,
}

impl ContentInfo {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let mut fields = sequence.reader("ContentInfo");
        let content_type = fields
            .take::<ObjectIdentifier>("contentType")?
            .dotted()
            .to_owned();
        if !matches!(
            content_type.as_str(),
            DATA_OID | SIGNED_DATA_OID | SPC_INDIRECT_DATA_OID | TST_INFO_OID
        ) {
            return Err(VerifyError::UnsupportedContentType(content_type));
        }

        let Some(wrapper) = fields.try_take_context(0) else {
            return Ok(Self {
                content_type,
                content: None,
                signed_bytes: None,
            });
        };
        let inner = wrapper
            .cast::<Constructed>()
            .and_then(|explicit| explicit.get(0))
            .ok_or(VerifyError::MissingField {
                structure: "ContentInfo",
                field: "content",
            })?;

        let (content, signed_bytes) = match content_type.as_str() {
            DATA_OID => {
                let octets = octet_string(inner)?;
                (Content::Data(octets.clone()), octets.content_data().clone())
            }
            TST_INFO_OID => {
                let octets = octet_string(inner)?;
                let encoded = Element::decode(octets.content_data())?;
                let tst_info = TstInfo::decode(sequence_of(&encoded, "TSTInfo")?)?;
                (Content::TstInfo(tst_info), octets.content_data().clone())
            }
            SPC_INDIRECT_DATA_OID => {
                let spc = SpcIndirectData::decode(sequence_of(inner, "SpcIndirectDataContent")?)?;
                (Content::SpcIndirectData(spc), inner.content_data().clone())
            }
            _ => {
                let signed = SignedData::decode(sequence_of(inner, "SignedData")?)?;
                (
                    Content::SignedData(Box::new(signed)),
                    inner.content_data().clone(),
                )
            }
        };

        Ok(Self {
            content_type,
            content: Some(content),
            signed_bytes: Some(signed_bytes),
        })
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    #[must_use]
    pub fn into_content(self) -> Option<Content> {
        self.content
    }

    /// Bytes covered by the signer's message digest: the octets of an
    /// OCTET STRING body, or the content octets of a structured body.
    #[must_use]
    pub fn signed_bytes(&self) -> Option<&ByteWindow> {
        self.signed_bytes.as_ref()
    }

    #[must_use]
    pub fn spc_indirect_data(&self) -> Option<&SpcIndirectData> {
        match self.content.as_ref()? {
            Content::SpcIndirectData(spc) => Some(spc),
            _ => None,
        }
    }

    #[must_use]
    pub fn tst_info(&self) -> Option<&TstInfo> {
        match self.content.as_ref()? {
            Content::TstInfo(tst_info) => Some(tst_info),
            _ => None,
        }
    }
}

fn octet_string(element: &Element) -> VerifyResult<&OctetString> {
    element
        .cast::<OctetString>()
        .ok_or_else(|| VerifyError::UnexpectedElement {
            structure: "ContentInfo",
            field: "content",
            expected: "OCTET STRING",
            found: element.tag().to_string(),
        })
}

fn sequence_of<'a>(element: &'a Element, structure: &'static str) -> VerifyResult<&'a Constructed> {
    element
        .cast::<Constructed>()
        .filter(|c| c.is_sequence())
        .ok_or_else(|| VerifyError::UnexpectedElement {
            structure,
            field: "content",
            expected: "SEQUENCE",
            found: element.tag().to_string(),
        })
}
