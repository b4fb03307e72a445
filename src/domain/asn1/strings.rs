//! Character string types and their content rules.

use super::error::Asn1Error;
use super::tag::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    Utf8,
    Numeric,
    Printable,
    Ia5,
    Visible,
    Bmp,
}

impl StringKind {
    #[must_use]
    pub fn from_tag(tag: Tag) -> Option<Self> {
        let kind = match tag {
            Tag::UTF8_STRING => StringKind::Utf8,
            Tag::NUMERIC_STRING => StringKind::Numeric,
            Tag::PRINTABLE_STRING => StringKind::Printable,
            Tag::IA5_STRING => StringKind::Ia5,
            Tag::VISIBLE_STRING => StringKind::Visible,
            Tag::BMP_STRING => StringKind::Bmp,
            _ => return None,
        };
        Some(kind)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StringKind::Utf8 => "UTF8String",
            StringKind::Numeric => "NumericString",
            StringKind::Printable => "PrintableString",
            StringKind::Ia5 => "IA5String",
            StringKind::Visible => "VisibleString",
            StringKind::Bmp => "BMPString",
        }
    }

    /// Validates and decodes string content.
    pub fn decode(self, content: &[u8]) -> Result<String, Asn1Error> {
        match self {
            StringKind::Utf8 => String::from_utf8(content.to_vec()).map_err(|e| self.invalid(e)),
            StringKind::Numeric => {
                if let Some(bad) = content
                    .iter()
                    .find(|&&byte| !byte.is_ascii_digit() && byte != b' ')
                {
                    return Err(self.invalid(format!("character 0x{bad:02x} not allowed")));
                }
                Ok(ascii(content))
            }
            StringKind::Printable | StringKind::Ia5 | StringKind::Visible => {
                if let Some(bad) = content.iter().find(|&&byte| byte >= 0x80) {
                    return Err(self.invalid(format!("non 7-bit octet 0x{bad:02x}")));
                }
                Ok(ascii(content))
            }
            StringKind::Bmp => {
                if content.len() % 2 != 0 {
                    return Err(self.invalid("odd number of octets"));
                }
                let units = content
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                char::decode_utf16(units)
                    .collect::<Result<String, _>>()
                    .map_err(|e| self.invalid(e))
            }
        }
    }

    fn invalid(self, reason: impl ToString) -> Asn1Error {
        Asn1Error::InvalidString {
            kind: self.name(),
            reason: reason.to_string(),
        }
    }
}

fn ascii(content: &[u8]) -> String {
    content.iter().map(|&byte| char::from(byte)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_bit_kinds() {
        assert_eq!(StringKind::Ia5.decode(b"a@b.example").unwrap(), "a@b.example");
        assert!(StringKind::Printable.decode(&[b'a', 0xc3]).is_err());
        assert!(StringKind::Visible.decode(&[0x80]).is_err());
    }

    #[test]
    fn test_numeric() {
        assert_eq!(StringKind::Numeric.decode(b"12 34").unwrap(), "12 34");
        assert!(StringKind::Numeric.decode(b"12a").is_err());
    }

    #[test]
    fn test_utf8_and_bmp() {
        assert_eq!(StringKind::Utf8.decode("zürich".as_bytes()).unwrap(), "zürich");
        assert!(StringKind::Utf8.decode(&[0xff, 0xfe]).is_err());

        assert_eq!(
            StringKind::Bmp.decode(&[0x00, 0x41, 0x00, 0xe9]).unwrap(),
            "Aé"
        );
        assert!(StringKind::Bmp.decode(&[0x00, 0x41, 0x00]).is_err());
        // unpaired high surrogate
        assert!(StringKind::Bmp.decode(&[0xd8, 0x00]).is_err());
    }
}
