//! SPC (Software Publisher Certificate) domain module.
//! Strongly-typed views of the Authenticode structures `SpcIndirectDataContent`
//! and `SpcSpOpusInfo`.

use std::fmt;

use crate::domain::asn1::{
    ByteWindow, Constructed, Element, ObjectIdentifier, OctetString, Tag, TextString,
};
use crate::domain::pkcs7::AlgorithmIdentifier;
use crate::infra::error::{VerifyError, VerifyResult};
use crate::HashAlgorithm;

/// `SpcIndirectDataContent { data SpcAttributeTypeAndOptionalValue, messageDigest DigestInfo }`
#[derive(Clone)]
pub struct SpcIndirectData {
    data_type: String,
    data_value: Option<Element>,
    digest_algorithm: AlgorithmIdentifier,
    digest: OctetString,
}

impl SpcIndirectData {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let mut fields = sequence.reader("SpcIndirectDataContent");

        let data = fields.take_sequence("data")?;
        let mut data_fields = data.reader("SpcAttributeTypeAndOptionalValue");
        let data_type = data_fields
            .take::<ObjectIdentifier>("type")?
            .dotted()
            .to_owned();
        let data_value = data_fields.next_element().cloned();

        let digest_info = fields.take_sequence("messageDigest")?;
        let mut digest_fields = digest_info.reader("DigestInfo");
        let digest_algorithm =
            AlgorithmIdentifier::decode(digest_fields.take_sequence("digestAlgorithm")?)?;
        let digest = digest_fields.take::<OctetString>("digest")?.clone();

        Ok(Self {
            data_type,
            data_value,
            digest_algorithm,
            digest,
        })
    }

    /// Type of the attested data, e.g. `SpcPeImageData`.
    #[must_use]
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    #[must_use]
    pub fn data_value(&self) -> Option<&Element> {
        self.data_value.as_ref()
    }

    #[must_use]
    pub fn digest_algorithm(&self) -> &AlgorithmIdentifier {
        &self.digest_algorithm
    }

    pub fn hash_algorithm(&self) -> VerifyResult<HashAlgorithm> {
        HashAlgorithm::from_oid(self.digest_algorithm.oid())
    }

    /// Image digest the publisher signed.
    #[must_use]
    pub fn digest(&self) -> &[u8] {
        self.digest.value()
    }
}

impl fmt::Debug for SpcIndirectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SpcIndirectData(type={}, digest_alg={}, digest_len={})",
            self.data_type,
            self.digest_algorithm.oid(),
            self.digest.value().len()
        )
    }
}

/// `SpcString ::= CHOICE { unicode [0] IMPLICIT BMPString, ascii [1] IMPLICIT IA5String }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpcString {
    Unicode(String),
    Ascii(String),
}

impl SpcString {
    pub fn decode(choice: &Element) -> VerifyResult<Self> {
        let tag = choice.tag();
        if tag.is_context(0) {
            Ok(SpcString::Unicode(implicit_text(choice, Tag::BMP_STRING)?))
        } else if tag.is_context(1) {
            Ok(SpcString::Ascii(implicit_text(choice, Tag::IA5_STRING)?))
        } else {
            Err(VerifyError::Cms(format!("unexpected {tag} in SpcString")))
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            SpcString::Unicode(text) | SpcString::Ascii(text) => text,
        }
    }
}

/// `SpcLink ::= CHOICE { url [0] IMPLICIT IA5String, moniker [1] IMPLICIT SpcSerializedObject, file [2] EXPLICIT SpcString }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpcLink {
    Url(String),
    Moniker {
        class_id: ByteWindow,
        serialized_data: ByteWindow,
    },
    File(SpcString),
}

impl SpcLink {
    pub fn decode(choice: &Element) -> VerifyResult<Self> {
        let tag = choice.tag();
        if tag.is_context(0) {
            return Ok(SpcLink::Url(implicit_text(choice, Tag::IA5_STRING)?));
        }
        if tag.is_context(1) {
            let object = choice.reinterpret(Tag::SEQUENCE)?;
            let sequence = object
                .cast::<Constructed>()
                .ok_or_else(|| VerifyError::Cms("SpcSerializedObject must be constructed".to_string()))?;
            let mut fields = sequence.reader("SpcSerializedObject");
            let class_id = fields.take::<OctetString>("classId")?.content_data().clone();
            let serialized_data = fields
                .take::<OctetString>("serializedData")?
                .content_data()
                .clone();
            return Ok(SpcLink::Moniker {
                class_id,
                serialized_data,
            });
        }
        if tag.is_context(2) {
            return Ok(SpcLink::File(SpcString::decode(explicit_inner(choice, "file")?)?));
        }
        Err(VerifyError::Cms(format!("unexpected {tag} in SpcLink")))
    }
}

/// `SpcSpOpusInfo { programName [0] EXPLICIT SpcString OPTIONAL, moreInfo [1] EXPLICIT SpcLink OPTIONAL }`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpcSpOpusInfo {
    program_name: Option<SpcString>,
    more_info: Option<SpcLink>,
}

impl SpcSpOpusInfo {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let mut fields = sequence.reader("SpcSpOpusInfo");
        let program_name = fields
            .try_take_context(0)
            .map(|wrapper| SpcString::decode(explicit_inner(wrapper, "programName")?))
            .transpose()?;
        let more_info = fields
            .try_take_context(1)
            .map(|wrapper| SpcLink::decode(explicit_inner(wrapper, "moreInfo")?))
            .transpose()?;
        Ok(Self {
            program_name,
            more_info,
        })
    }

    #[must_use]
    pub fn program_name(&self) -> Option<&SpcString> {
        self.program_name.as_ref()
    }

    #[must_use]
    pub fn more_info(&self) -> Option<&SpcLink> {
        self.more_info.as_ref()
    }
}

fn implicit_text(element: &Element, tag: Tag) -> VerifyResult<String> {
    let viewed = element.reinterpret(tag)?;
    let text = viewed
        .cast::<TextString>()
        .ok_or_else(|| VerifyError::Cms(format!("{tag} expected")))?;
    Ok(text.text().to_owned())
}

fn explicit_inner<'a>(wrapper: &'a Element, field: &'static str) -> VerifyResult<&'a Element> {
    wrapper
        .cast::<Constructed>()
        .and_then(|explicit| explicit.get(0))
        .ok_or(VerifyError::MissingField {
            structure: "SpcSpOpusInfo",
            field,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: Vec<u8>) -> Element {
        Element::from_der(bytes).unwrap()
    }

    #[test]
    fn test_opus_info_with_name_and_url() {
        // SEQUENCE { [0] { [0] BMP "Hi" }, [1] { [0] IA5 "http://a" } }
        let bytes = vec![
            0x30, 0x14, //
            0xa0, 0x06, 0x80, 0x04, 0x00, b'H', 0x00, b'i', //
            0xa1, 0x0a, 0x80, 0x08, b'h', b't', b't', b'p', b':', b'/', b'/', b'a',
        ];
        let element = decode(bytes);
        let info = SpcSpOpusInfo::decode(element.cast::<Constructed>().unwrap()).unwrap();
        assert_eq!(info.program_name(), Some(&SpcString::Unicode("Hi".to_string())));
        assert_eq!(info.more_info(), Some(&SpcLink::Url("http://a".to_string())));
    }

    #[test]
    fn test_empty_opus_info() {
        let element = decode(vec![0x30, 0x00]);
        let info = SpcSpOpusInfo::decode(element.cast::<Constructed>().unwrap()).unwrap();
        assert_eq!(info, SpcSpOpusInfo::default());
    }

    #[test]
    fn test_link_file_and_moniker() {
        // [2] { [1] IA5 "f" }
        let file = decode(vec![0xa2, 0x03, 0x81, 0x01, b'f']);
        assert_eq!(
            SpcLink::decode(&file).unwrap(),
            SpcLink::File(SpcString::Ascii("f".to_string()))
        );

        // [1] IMPLICIT SEQUENCE { OCTET STRING 01, OCTET STRING 0203 }
        let moniker = decode(vec![0xa1, 0x07, 0x04, 0x01, 0x01, 0x04, 0x02, 0x02, 0x03]);
        match SpcLink::decode(&moniker).unwrap() {
            SpcLink::Moniker {
                class_id,
                serialized_data,
            } => {
                assert_eq!(class_id.as_slice(), &[0x01]);
                assert_eq!(serialized_data.as_slice(), &[0x02, 0x03]);
            }
            other => panic!("unexpected link {other:?}"),
        }
    }

    #[test]
    fn test_indirect_data() {
        // SEQUENCE { SEQUENCE { OID spcPeImageData }, SEQUENCE { SEQUENCE { OID sha1 }, OCTET STRING } }
        let mut bytes = vec![
            0x30, 0x2b, //
            0x30, 0x0c, 0x06, 0x0a, 0x2b, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37, 0x02, 0x01, 0x0f, //
            0x30, 0x1b, 0x30, 0x07, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x04, 0x10,
        ];
        bytes.extend([0xab; 16]);
        // fix the declared lengths for a 16-byte digest
        bytes[1] = (bytes.len() - 2) as u8;
        bytes[17] = (bytes.len() - 18) as u8;
        let element = decode(bytes);
        let spc = SpcIndirectData::decode(element.cast::<Constructed>().unwrap()).unwrap();
        assert_eq!(spc.data_type(), "1.3.6.1.4.1.311.2.1.15");
        assert_eq!(spc.hash_algorithm().unwrap(), HashAlgorithm::Sha1);
        assert_eq!(spc.digest(), &[0xab; 16]);
    }
}
