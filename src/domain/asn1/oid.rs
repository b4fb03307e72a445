//! OBJECT IDENTIFIER content decoding.

use super::error::Asn1Error;
use std::fmt::Write as _;

/// Decodes OID content octets to dotted-decimal text.
///
/// Arcs are base-128 with the high bit as continuation. The first encoded arc
/// packs the first two components as `40 * a + b`, with `a` capped at 2.
pub fn decode_oid(content: &[u8]) -> Result<String, Asn1Error> {
    if content.is_empty() {
        return Err(Asn1Error::InvalidOid("empty content".to_string()));
    }

    let mut arcs: Vec<u128> = Vec::new();
    let mut value: u128 = 0;
    let mut pending = false;
    for &octet in content {
        value = value
            .checked_mul(128)
            .and_then(|v| v.checked_add(u128::from(octet & 0x7f)))
            .ok_or_else(|| Asn1Error::InvalidOid("arc value overflows 128 bits".to_string()))?;
        if octet & 0x80 != 0 {
            pending = true;
        } else {
            arcs.push(value);
            value = 0;
            pending = false;
        }
    }
    if pending {
        return Err(Asn1Error::InvalidOid(
            "last arc has the continuation bit set".to_string(),
        ));
    }

    let first = arcs[0];
    let (root, second) = match first {
        0..=39 => (0, first),
        40..=79 => (1, first - 40),
        _ => (2, first - 80),
    };

    let mut dotted = format!("{root}.{second}");
    for arc in &arcs[1..] {
        let _ = write!(dotted, ".{arc}");
    }
    Ok(dotted)
}
