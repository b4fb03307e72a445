//! BER/DER decoding.
//!
//! Layers, bottom up: byte windows over a shared buffer, tag and length
//! codecs, the element decoder and the constructed-field reader used by the
//! CMS grammar.

pub mod dump;
pub mod element;
pub mod error;
pub mod length;
pub mod oid;
pub mod reader;
pub mod strings;
pub mod tag;
pub mod time;
pub mod window;

pub use dump::ElementTree;
pub use element::{
    BitString, Boolean, Constructed, Element, ElementHeader, ElementKind, Integer, Null,
    ObjectIdentifier, OctetString, Raw, TextString, Time, MAX_CHILDREN, MAX_DEPTH,
};
pub use error::Asn1Error;
pub use reader::ConstructedReader;
pub use strings::StringKind;
pub use tag::{Tag, TagClass};
pub use time::TimeKind;
pub use window::ByteWindow;
