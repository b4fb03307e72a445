//! Decoder errors for BER/DER input.

use super::tag::Tag;
use thiserror::Error;

/// Structural or value-level failure while decoding BER/DER data.
#[derive(Error, Debug, Clone, PartialEq, Eq, miette::Diagnostic)]
pub enum Asn1Error {
    #[error("ASN.1 input truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("ASN.1 tag number uses more than {max} continuation octets")]
    TagNumberTooLarge { max: usize },

    #[error("ASN.1 length uses {0} octets (at most 8 supported)")]
    LengthTooLong(usize),

    #[error("ASN.1 length does not fit in addressable memory")]
    LengthOverflow,

    #[error("indefinite length is not allowed for primitive {0}")]
    IndefiniteLength(Tag),

    #[error("{0} must use the primitive encoding")]
    ConstructedPrimitive(Tag),

    #[error("indefinite-length content is missing its end-of-contents marker")]
    MissingEndOfContents,

    #[error("end-of-contents marker inside definite-length content")]
    UnexpectedEndOfContents,

    #[error("content length mismatch: declared {declared}, children consumed {decoded}")]
    LengthMismatch { declared: usize, decoded: usize },

    #[error("constructed element has more than {0} children")]
    TooManyChildren(usize),

    #[error("element nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("invalid {tag} value: {reason}")]
    InvalidValue { tag: Tag, reason: String },

    #[error("invalid object identifier: {0}")]
    InvalidOid(String),

    #[error("invalid {kind} content: {reason}")]
    InvalidString { kind: &'static str, reason: String },

    #[error("invalid time '{text}': {reason}")]
    InvalidTime { text: String, reason: String },

    #[error("window out of bounds: offset {offset} + length {length} exceeds {limit}")]
    OutOfBounds {
        offset: usize,
        length: usize,
        limit: usize,
    },
}
