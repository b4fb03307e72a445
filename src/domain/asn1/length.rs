//! Length octets in short, long and indefinite form.

use super::error::Asn1Error;
use super::window::ByteWindow;

const MAX_LENGTH_OCTETS: usize = 8;

/// Decodes length octets from the start of `window`.
///
/// Returns `None` for the indefinite form along with the number of octets
/// consumed.
pub fn decode_length(window: &ByteWindow) -> Result<(Option<usize>, usize), Asn1Error> {
    let bytes = window.as_slice();
    let first = *bytes.first().ok_or(Asn1Error::Truncated {
        needed: 1,
        available: 0,
    })?;

    if first < 0x80 {
        return Ok((Some(usize::from(first)), 1));
    }
    if first == 0x80 {
        return Ok((None, 1));
    }

    let count = usize::from(first & 0x7f);
    if count > MAX_LENGTH_OCTETS {
        return Err(Asn1Error::LengthTooLong(count));
    }
    if bytes.len() < 1 + count {
        return Err(Asn1Error::Truncated {
            needed: 1 + count,
            available: bytes.len(),
        });
    }

    let value = bytes[1..=count]
        .iter()
        .fold(0u64, |acc, &octet| (acc << 8) | u64::from(octet));
    let value = usize::try_from(value).map_err(|_| Asn1Error::LengthOverflow)?;
    Ok((Some(value), 1 + count))
}

/// Appends the minimal definite-length encoding of `length`.
pub fn encode_length(length: usize, out: &mut Vec<u8>) {
    if length < 0x80 {
        out.push(length as u8);
        return;
    }
    let bytes = (length as u64).to_be_bytes();
    let skip = bytes.iter().take_while(|&&byte| byte == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<(Option<usize>, usize), Asn1Error> {
        decode_length(&ByteWindow::from(bytes))
    }

    #[test]
    fn test_short_and_long_forms() {
        assert_eq!(decode(&[0x05]).unwrap(), (Some(5), 1));
        assert_eq!(decode(&[0x81, 0x80]).unwrap(), (Some(128), 2));
        assert_eq!(decode(&[0x82, 0x01, 0x00]).unwrap(), (Some(256), 3));
        assert_eq!(decode(&[0x80]).unwrap(), (None, 1));
    }

    #[test]
    fn test_rejects_oversized_length_fields() {
        assert!(matches!(
            decode(&[0x89, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
            Err(Asn1Error::LengthTooLong(9))
        ));
        assert!(matches!(decode(&[0xff]), Err(Asn1Error::LengthTooLong(127))));
        assert!(matches!(
            decode(&[0x82, 0x01]),
            Err(Asn1Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_encode_minimal() {
        let mut out = Vec::new();
        encode_length(0x7f, &mut out);
        encode_length(0x80, &mut out);
        encode_length(0x1234, &mut out);
        assert_eq!(out, vec![0x7f, 0x81, 0x80, 0x82, 0x12, 0x34]);
    }
}
