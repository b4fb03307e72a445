//! Identifier octets: class, constructed bit and tag number.

use super::error::Asn1Error;
use super::window::ByteWindow;
use std::fmt;

/// High-tag-number form accepts at most this many continuation octets (63 bits).
const MAX_TAG_NUMBER_OCTETS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl TagClass {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    fn bits(self) -> u8 {
        match self {
            TagClass::Universal => 0,
            TagClass::Application => 1,
            TagClass::ContextSpecific => 2,
            TagClass::Private => 3,
        }
    }
}

/// A decoded ASN.1 tag. Two tags are equal only when class, number and
/// constructed bit all agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    class: TagClass,
    number: u64,
    constructed: bool,
}

impl Tag {
    pub const BOOLEAN: Tag = Tag::universal(1, false);
    pub const INTEGER: Tag = Tag::universal(2, false);
    pub const BIT_STRING: Tag = Tag::universal(3, false);
    pub const OCTET_STRING: Tag = Tag::universal(4, false);
    pub const NULL: Tag = Tag::universal(5, false);
    pub const OBJECT_IDENTIFIER: Tag = Tag::universal(6, false);
    pub const UTF8_STRING: Tag = Tag::universal(12, false);
    pub const SEQUENCE: Tag = Tag::universal(16, true);
    pub const SET: Tag = Tag::universal(17, true);
    pub const NUMERIC_STRING: Tag = Tag::universal(18, false);
    pub const PRINTABLE_STRING: Tag = Tag::universal(19, false);
    pub const IA5_STRING: Tag = Tag::universal(22, false);
    pub const UTC_TIME: Tag = Tag::universal(23, false);
    pub const GENERALIZED_TIME: Tag = Tag::universal(24, false);
    pub const VISIBLE_STRING: Tag = Tag::universal(26, false);
    pub const BMP_STRING: Tag = Tag::universal(30, false);

    #[must_use]
    pub const fn new(class: TagClass, number: u64, constructed: bool) -> Self {
        Self {
            class,
            number,
            constructed,
        }
    }

    #[must_use]
    pub const fn universal(number: u64, constructed: bool) -> Self {
        Self::new(TagClass::Universal, number, constructed)
    }

    #[must_use]
    pub const fn context(number: u64, constructed: bool) -> Self {
        Self::new(TagClass::ContextSpecific, number, constructed)
    }

    #[must_use]
    pub fn class(&self) -> TagClass {
        self.class
    }

    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    #[must_use]
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Context-specific tag with the given number, in either form.
    #[must_use]
    pub fn is_context(&self, number: u64) -> bool {
        self.class == TagClass::ContextSpecific && self.number == number
    }

    /// Decodes identifier octets from the start of `window`, returning the tag
    /// and the number of octets consumed.
    pub fn decode(window: &ByteWindow) -> Result<(Tag, usize), Asn1Error> {
        let bytes = window.as_slice();
        let first = *bytes.first().ok_or(Asn1Error::Truncated {
            needed: 1,
            available: 0,
        })?;

        let class = TagClass::from_bits(first >> 6);
        let constructed = first & 0x20 != 0;
        let low = first & 0x1f;
        if low != 0x1f {
            return Ok((Tag::new(class, u64::from(low), constructed), 1));
        }

        let mut number: u64 = 0;
        for (index, &octet) in bytes[1..].iter().enumerate() {
            if index == MAX_TAG_NUMBER_OCTETS {
                return Err(Asn1Error::TagNumberTooLarge {
                    max: MAX_TAG_NUMBER_OCTETS,
                });
            }
            number = (number << 7) | u64::from(octet & 0x7f);
            if octet & 0x80 == 0 {
                return Ok((Tag::new(class, number, constructed), index + 2));
            }
        }

        Err(Asn1Error::Truncated {
            needed: bytes.len() + 1,
            available: bytes.len(),
        })
    }

    /// Appends the identifier octets for this tag.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let mut first = self.class.bits() << 6;
        if self.constructed {
            first |= 0x20;
        }
        if self.number < 0x1f {
            // number < 31 fits in the low five bits
            out.push(first | self.number as u8);
            return;
        }

        out.push(first | 0x1f);
        let mut groups = Vec::with_capacity(MAX_TAG_NUMBER_OCTETS);
        let mut remaining = self.number;
        loop {
            groups.push((remaining & 0x7f) as u8);
            remaining >>= 7;
            if remaining == 0 {
                break;
            }
        }
        let last = groups.len() - 1;
        for (index, group) in groups.iter().rev().enumerate() {
            out.push(if index < last { group | 0x80 } else { *group });
        }
    }

    /// Name of a known universal type.
    #[must_use]
    pub fn universal_name(&self) -> Option<&'static str> {
        if self.class != TagClass::Universal {
            return None;
        }
        let name = match self.number {
            1 => "BOOLEAN",
            2 => "INTEGER",
            3 => "BIT STRING",
            4 => "OCTET STRING",
            5 => "NULL",
            6 => "OBJECT IDENTIFIER",
            12 => "UTF8String",
            16 => "SEQUENCE",
            17 => "SET",
            18 => "NumericString",
            19 => "PrintableString",
            22 => "IA5String",
            23 => "UTCTime",
            24 => "GeneralizedTime",
            26 => "VisibleString",
            30 => "BMPString",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.class, self.universal_name()) {
            (TagClass::Universal, Some(name)) => f.write_str(name),
            (TagClass::Universal, None) => write!(f, "[UNIVERSAL {}]", self.number),
            (TagClass::Application, _) => write!(f, "[APPLICATION {}]", self.number),
            (TagClass::ContextSpecific, _) => write!(f, "[{}]", self.number),
            (TagClass::Private, _) => write!(f, "[PRIVATE {}]", self.number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<(Tag, usize), Asn1Error> {
        Tag::decode(&ByteWindow::from(bytes))
    }

    #[test]
    fn test_low_tag_number() {
        assert_eq!(decode(&[0x30]).unwrap(), (Tag::SEQUENCE, 1));
        assert_eq!(decode(&[0xa0]).unwrap(), (Tag::context(0, true), 1));
        assert_eq!(decode(&[0x81]).unwrap(), (Tag::context(1, false), 1));
        let (tag, _) = decode(&[0xc3]).unwrap();
        assert_eq!(tag.class(), TagClass::Private);
    }

    #[test]
    fn test_high_tag_number() {
        let (tag, used) = decode(&[0x1f, 0x81, 0x00]).unwrap();
        assert_eq!(tag.number(), 128);
        assert_eq!(used, 3);

        let mut encoded = Vec::new();
        tag.encode(&mut encoded);
        assert_eq!(encoded, vec![0x1f, 0x81, 0x00]);
    }

    #[test]
    fn test_high_tag_number_limits() {
        let mut at_limit = vec![0x1f];
        at_limit.extend(std::iter::repeat(0xff).take(8));
        at_limit.push(0x7f);
        let (tag, used) = decode(&at_limit).unwrap();
        assert_eq!(tag.number(), (1u64 << 63) - 1);
        assert_eq!(used, 10);

        let mut over = vec![0x1f];
        over.extend(std::iter::repeat(0x81).take(10));
        assert!(matches!(
            decode(&over),
            Err(Asn1Error::TagNumberTooLarge { .. })
        ));

        assert!(matches!(
            decode(&[0x1f, 0x81]),
            Err(Asn1Error::Truncated { .. })
        ));
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Tag::SET.to_string(), "SET");
        assert_eq!(Tag::context(3, true).to_string(), "[3]");
        assert_eq!(
            Tag::new(TagClass::Application, 7, false).to_string(),
            "[APPLICATION 7]"
        );
    }
}
