//! Decoded ASN.1 elements.
//!
//! [`Element::decode`] reads one TLV eagerly: constructed elements decode all
//! of their children up front, and a child that overruns its parent fails the
//! whole decode. Every element keeps two windows into the source buffer:
//! `content_data` (value octets) and `element_data` (the full TLV, including
//! the end-of-contents octets for indefinite forms).

use super::error::Asn1Error;
use super::length::{decode_length, encode_length};
use super::oid::decode_oid;
use super::reader::ConstructedReader;
use super::strings::StringKind;
use super::tag::{Tag, TagClass};
use super::time::{parse_time, TimeKind};
use super::window::ByteWindow;
use chrono::{DateTime, FixedOffset};
use num_bigint::BigInt;
use std::sync::Arc;

/// Upper bound on children of a single constructed element.
pub const MAX_CHILDREN: usize = 65_535;

/// Upper bound on nesting depth.
pub const MAX_DEPTH: usize = 256;

const END_OF_CONTENTS: [u8; 2] = [0x00, 0x00];

/// Tag and windows shared by every element variant.
#[derive(Debug, Clone)]
pub struct ElementHeader {
    tag: Tag,
    content: ByteWindow,
    element: ByteWindow,
}

impl ElementHeader {
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    #[must_use]
    pub fn content_data(&self) -> &ByteWindow {
        &self.content
    }

    #[must_use]
    pub fn element_data(&self) -> &ByteWindow {
        &self.element
    }

    fn relabel(&self, tag: Tag) -> Self {
        Self {
            tag,
            content: self.content.clone(),
            element: self.element.clone(),
        }
    }

    fn same_encoding(&self, other: &ElementHeader) -> bool {
        self.tag == other.tag && self.content == other.content
    }

    fn ensure_primitive(&self) -> Result<(), Asn1Error> {
        if self.tag.is_constructed() {
            return Err(Asn1Error::ConstructedPrimitive(self.tag));
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> Asn1Error {
        Asn1Error::InvalidValue {
            tag: self.tag,
            reason: reason.into(),
        }
    }
}

/// Typed view that a [`ConstructedReader`] can take.
pub trait ElementKind {
    /// Human-readable kind used in diagnostics.
    const KIND: &'static str;

    fn cast(element: &Element) -> Option<&Self>;
}

#[derive(Debug, Clone)]
pub struct Boolean {
    header: ElementHeader,
    value: bool,
}

#[derive(Debug, Clone)]
pub struct Integer {
    header: ElementHeader,
    value: BigInt,
}

#[derive(Debug, Clone)]
pub struct BitString {
    header: ElementHeader,
    unused_bits: u8,
    bits: ByteWindow,
}

#[derive(Debug, Clone)]
pub struct OctetString {
    header: ElementHeader,
}

#[derive(Debug, Clone)]
pub struct Null {
    header: ElementHeader,
}

#[derive(Debug, Clone)]
pub struct ObjectIdentifier {
    header: ElementHeader,
    dotted: String,
}

#[derive(Debug, Clone)]
pub struct TextString {
    header: ElementHeader,
    kind: StringKind,
    text: String,
}

#[derive(Debug, Clone)]
pub struct Time {
    header: ElementHeader,
    kind: TimeKind,
    value: DateTime<FixedOffset>,
}

#[derive(Debug, Clone)]
pub struct Constructed {
    header: ElementHeader,
    children: Vec<Element>,
}

/// Primitive element with no typed interpretation, including every
/// non-universal primitive tag.
#[derive(Debug, Clone)]
pub struct Raw {
    header: ElementHeader,
}

#[derive(Debug, Clone)]
pub enum Element {
    Boolean(Boolean),
    Integer(Integer),
    BitString(BitString),
    OctetString(OctetString),
    Null(Null),
    ObjectIdentifier(ObjectIdentifier),
    String(TextString),
    Time(Time),
    Constructed(Constructed),
    Raw(Raw),
}

macro_rules! element_kind {
    ($ty:ident, $variant:ident, $name:literal) => {
        impl ElementKind for $ty {
            const KIND: &'static str = $name;

            fn cast(element: &Element) -> Option<&Self> {
                match element {
                    Element::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl $ty {
            #[must_use]
            pub fn header(&self) -> &ElementHeader {
                &self.header
            }

            #[must_use]
            pub fn tag(&self) -> Tag {
                self.header.tag
            }

            #[must_use]
            pub fn content_data(&self) -> &ByteWindow {
                &self.header.content
            }

            #[must_use]
            pub fn element_data(&self) -> &ByteWindow {
                &self.header.element
            }
        }
    };
}

macro_rules! encoding_equality {
    ($($ty:ident),+) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.header.same_encoding(&other.header)
                }
            }

            impl Eq for $ty {}
        )+
    };
}

element_kind!(Boolean, Boolean, "BOOLEAN");
element_kind!(Integer, Integer, "INTEGER");
element_kind!(BitString, BitString, "BIT STRING");
element_kind!(OctetString, OctetString, "OCTET STRING");
element_kind!(Null, Null, "NULL");
element_kind!(ObjectIdentifier, ObjectIdentifier, "OBJECT IDENTIFIER");
element_kind!(TextString, String, "character string");
element_kind!(Time, Time, "time");
element_kind!(Constructed, Constructed, "constructed");
element_kind!(Raw, Raw, "raw");

encoding_equality!(Integer, BitString, OctetString, Null, ObjectIdentifier, TextString, Time, Constructed, Raw);

impl ElementKind for Element {
    const KIND: &'static str = "element";

    fn cast(element: &Element) -> Option<&Self> {
        Some(element)
    }
}

impl Boolean {
    fn from_header(header: ElementHeader) -> Result<Self, Asn1Error> {
        header.ensure_primitive()?;
        let value = match header.content.as_slice() {
            [byte] => *byte != 0,
            _ => return Err(header.invalid("BOOLEAN content must be exactly one octet")),
        };
        Ok(Self { header, value })
    }

    #[must_use]
    pub fn value(&self) -> bool {
        self.value
    }
}

/// Any two nonzero encodings are the same truth value.
impl PartialEq for Boolean {
    fn eq(&self, other: &Self) -> bool {
        self.header.tag == other.header.tag && self.value == other.value
    }
}

impl Eq for Boolean {}

impl Integer {
    fn from_header(header: ElementHeader) -> Result<Self, Asn1Error> {
        header.ensure_primitive()?;
        if header.content.is_empty() {
            return Err(header.invalid("INTEGER content is empty"));
        }
        let value = BigInt::from_signed_bytes_be(header.content.as_slice());
        Ok(Self { header, value })
    }

    #[must_use]
    pub fn value(&self) -> &BigInt {
        &self.value
    }

    /// Two's-complement content octets as encoded.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.header.content.as_slice()
    }

    /// Magnitude octets with sign padding removed.
    #[must_use]
    pub fn unsigned_bytes(&self) -> ByteWindow {
        self.header.content.trim_leading_zeros()
    }
}

impl BitString {
    fn from_header(header: ElementHeader) -> Result<Self, Asn1Error> {
        header.ensure_primitive()?;
        let unused_bits = header
            .content
            .first()
            .ok_or_else(|| header.invalid("BIT STRING content is empty"))?;
        if unused_bits > 7 {
            return Err(header.invalid(format!("{unused_bits} unused bits")));
        }
        let bits = header.content.advance(1)?;
        if bits.is_empty() && unused_bits != 0 {
            return Err(header.invalid("unused bits declared on an empty BIT STRING"));
        }
        Ok(Self {
            header,
            unused_bits,
            bits,
        })
    }

    #[must_use]
    pub fn unused_bits(&self) -> u8 {
        self.unused_bits
    }

    /// Bit octets following the unused-bits octet.
    #[must_use]
    pub fn bits(&self) -> &ByteWindow {
        &self.bits
    }
}

impl OctetString {
    fn from_header(header: ElementHeader) -> Result<Self, Asn1Error> {
        header.ensure_primitive()?;
        Ok(Self { header })
    }

    #[must_use]
    pub fn value(&self) -> &[u8] {
        self.header.content.as_slice()
    }
}

impl Null {
    fn from_header(header: ElementHeader) -> Result<Self, Asn1Error> {
        header.ensure_primitive()?;
        if !header.content.is_empty() {
            return Err(header.invalid("NULL content must be empty"));
        }
        Ok(Self { header })
    }
}

impl ObjectIdentifier {
    fn from_header(header: ElementHeader) -> Result<Self, Asn1Error> {
        header.ensure_primitive()?;
        let dotted = decode_oid(header.content.as_slice())?;
        Ok(Self { header, dotted })
    }

    #[must_use]
    pub fn dotted(&self) -> &str {
        &self.dotted
    }
}

impl TextString {
    fn from_header(header: ElementHeader, kind: StringKind) -> Result<Self, Asn1Error> {
        header.ensure_primitive()?;
        let text = kind.decode(header.content.as_slice())?;
        Ok(Self { header, kind, text })
    }

    #[must_use]
    pub fn kind(&self) -> StringKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Time {
    fn from_header(header: ElementHeader, kind: TimeKind) -> Result<Self, Asn1Error> {
        header.ensure_primitive()?;
        let value = parse_time(kind, header.content.as_slice())?;
        Ok(Self {
            header,
            kind,
            value,
        })
    }

    #[must_use]
    pub fn kind(&self) -> TimeKind {
        self.kind
    }

    #[must_use]
    pub fn value(&self) -> DateTime<FixedOffset> {
        self.value
    }
}

impl Raw {
    #[must_use]
    pub fn value(&self) -> &[u8] {
        self.header.content.as_slice()
    }
}

impl Constructed {
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.children.get(index)
    }

    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.header.tag == Tag::SEQUENCE
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.header.tag == Tag::SET
    }

    /// Cursor over the children. `structure` names this element in errors.
    #[must_use]
    pub fn reader(&self, structure: &'static str) -> ConstructedReader<'_> {
        ConstructedReader::new(self, structure)
    }

    /// Same content re-encoded as a universal SEQUENCE.
    pub fn reinterpret_as_sequence(&self) -> Result<Constructed, Asn1Error> {
        self.materialize(Tag::SEQUENCE)
    }

    /// Same content re-encoded as a universal SET. This is the canonical form
    /// that signed attributes are digested in.
    pub fn reinterpret_as_set(&self) -> Result<Constructed, Asn1Error> {
        self.materialize(Tag::SET)
    }

    /// Builds `tag || definite length || content` in a fresh buffer and
    /// decodes it again.
    fn materialize(&self, tag: Tag) -> Result<Constructed, Asn1Error> {
        if self.header.tag == tag {
            return Ok(self.clone());
        }
        let content = self.header.content.as_slice();
        let mut encoded = Vec::with_capacity(content.len() + 12);
        tag.encode(&mut encoded);
        encode_length(content.len(), &mut encoded);
        encoded.extend_from_slice(content);

        match Element::from_der(encoded)? {
            Element::Constructed(constructed) => Ok(constructed),
            other => Err(other.header().invalid("re-encoding did not yield a constructed element")),
        }
    }

    fn relabel(&self, tag: Tag) -> Self {
        Self {
            header: self.header.relabel(tag),
            children: self.children.clone(),
        }
    }
}

impl Element {
    /// Decodes the TLV at the start of `window`. Bytes after the element are
    /// not read.
    pub fn decode(window: &ByteWindow) -> Result<Element, Asn1Error> {
        decode_element(window, 0)
    }

    /// Decodes the TLV at the start of an owned buffer.
    pub fn from_der(bytes: impl Into<Arc<[u8]>>) -> Result<Element, Asn1Error> {
        Self::decode(&ByteWindow::new(bytes.into()))
    }

    #[must_use]
    pub fn header(&self) -> &ElementHeader {
        match self {
            Element::Boolean(inner) => &inner.header,
            Element::Integer(inner) => &inner.header,
            Element::BitString(inner) => &inner.header,
            Element::OctetString(inner) => &inner.header,
            Element::Null(inner) => &inner.header,
            Element::ObjectIdentifier(inner) => &inner.header,
            Element::String(inner) => &inner.header,
            Element::Time(inner) => &inner.header,
            Element::Constructed(inner) => &inner.header,
            Element::Raw(inner) => &inner.header,
        }
    }

    #[must_use]
    pub fn tag(&self) -> Tag {
        self.header().tag
    }

    #[must_use]
    pub fn content_data(&self) -> &ByteWindow {
        &self.header().content
    }

    #[must_use]
    pub fn element_data(&self) -> &ByteWindow {
        &self.header().element
    }

    /// Typed view of this element, if it has that kind.
    #[must_use]
    pub fn cast<T: ElementKind>(&self) -> Option<&T> {
        T::cast(self)
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Boolean(_) => Boolean::KIND,
            Element::Integer(_) => Integer::KIND,
            Element::BitString(_) => BitString::KIND,
            Element::OctetString(_) => OctetString::KIND,
            Element::Null(_) => Null::KIND,
            Element::ObjectIdentifier(_) => ObjectIdentifier::KIND,
            Element::String(_) => TextString::KIND,
            Element::Time(_) => Time::KIND,
            Element::Constructed(_) => Constructed::KIND,
            Element::Raw(_) => Raw::KIND,
        }
    }

    /// Views this element under another tag, as needed for IMPLICIT tagging.
    ///
    /// Primitive elements are re-decoded as the new type over the same
    /// windows. Constructed elements are relabelled, except that a universal
    /// SEQUENCE or SET target re-encodes the content in a fresh buffer.
    pub fn reinterpret(&self, tag: Tag) -> Result<Element, Asn1Error> {
        match self {
            Element::Constructed(constructed) if tag == Tag::SEQUENCE || tag == Tag::SET => {
                constructed.materialize(tag).map(Element::Constructed)
            }
            Element::Constructed(constructed) if tag.is_constructed() => {
                Ok(Element::Constructed(constructed.relabel(tag)))
            }
            Element::Constructed(_) => Err(Asn1Error::ConstructedPrimitive(tag)),
            primitive if tag.is_constructed() => Err(Asn1Error::InvalidValue {
                tag,
                reason: format!("{} content cannot be read as constructed", primitive.tag()),
            }),
            primitive => decode_primitive(primitive.header().relabel(tag)),
        }
    }
}

/// Tag and content comparison with an identical-region shortcut. BOOLEAN
/// compares by truth value.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Element::Boolean(a), Element::Boolean(b)) => a == b,
            (Element::Integer(a), Element::Integer(b)) => a == b,
            (Element::BitString(a), Element::BitString(b)) => a == b,
            (Element::OctetString(a), Element::OctetString(b)) => a == b,
            (Element::Null(a), Element::Null(b)) => a == b,
            (Element::ObjectIdentifier(a), Element::ObjectIdentifier(b)) => a == b,
            (Element::String(a), Element::String(b)) => a == b,
            (Element::Time(a), Element::Time(b)) => a == b,
            (Element::Constructed(a), Element::Constructed(b)) => a == b,
            (Element::Raw(a), Element::Raw(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Element {}

fn decode_element(window: &ByteWindow, depth: usize) -> Result<Element, Asn1Error> {
    if depth > MAX_DEPTH {
        return Err(Asn1Error::NestingTooDeep(MAX_DEPTH));
    }

    let (tag, tag_len) = Tag::decode(window)?;
    let (length, length_len) = decode_length(&window.advance(tag_len)?)?;
    let header_len = tag_len + length_len;

    let Some(length) = length else {
        if !tag.is_constructed() {
            return Err(Asn1Error::IndefiniteLength(tag));
        }
        let body = window.advance(header_len)?;
        let (children, consumed) = decode_indefinite_children(&body, depth)?;
        let header = ElementHeader {
            tag,
            content: window.slice(header_len, consumed)?,
            element: window.constrain(header_len + consumed + END_OF_CONTENTS.len())?,
        };
        return Ok(Element::Constructed(Constructed { header, children }));
    };

    let total = header_len
        .checked_add(length)
        .ok_or(Asn1Error::LengthOverflow)?;
    if total > window.len() {
        return Err(Asn1Error::Truncated {
            needed: total,
            available: window.len(),
        });
    }
    let header = ElementHeader {
        tag,
        content: window.slice(header_len, length)?,
        element: window.constrain(total)?,
    };

    if tag.is_constructed() {
        let children = decode_definite_children(&header.content, depth)?;
        Ok(Element::Constructed(Constructed { header, children }))
    } else {
        decode_primitive(header)
    }
}

fn decode_definite_children(content: &ByteWindow, depth: usize) -> Result<Vec<Element>, Asn1Error> {
    let mut children = Vec::new();
    let mut consumed = 0;
    while consumed < content.len() {
        if children.len() == MAX_CHILDREN {
            return Err(Asn1Error::TooManyChildren(MAX_CHILDREN));
        }
        let rest = content.advance(consumed)?;
        if rest.as_slice().starts_with(&END_OF_CONTENTS) {
            return Err(Asn1Error::UnexpectedEndOfContents);
        }
        let child = decode_element(&rest, depth + 1)?;
        consumed += child.element_data().len();
        children.push(child);
    }
    if consumed != content.len() {
        return Err(Asn1Error::LengthMismatch {
            declared: content.len(),
            decoded: consumed,
        });
    }
    Ok(children)
}

/// Decodes children up to the end-of-contents marker. Returns the children and
/// the number of content octets before the marker.
fn decode_indefinite_children(
    body: &ByteWindow,
    depth: usize,
) -> Result<(Vec<Element>, usize), Asn1Error> {
    let mut children = Vec::new();
    let mut consumed = 0;
    loop {
        let rest = body.advance(consumed)?;
        if rest.len() < END_OF_CONTENTS.len() {
            return Err(Asn1Error::MissingEndOfContents);
        }
        if rest.as_slice().starts_with(&END_OF_CONTENTS) {
            return Ok((children, consumed));
        }
        if children.len() == MAX_CHILDREN {
            return Err(Asn1Error::TooManyChildren(MAX_CHILDREN));
        }
        let child = decode_element(&rest, depth + 1)?;
        consumed += child.element_data().len();
        children.push(child);
    }
}

fn decode_primitive(header: ElementHeader) -> Result<Element, Asn1Error> {
    let tag = header.tag;
    if tag.class() != TagClass::Universal {
        header.ensure_primitive()?;
        return Ok(Element::Raw(Raw { header }));
    }
    if let Some(kind) = StringKind::from_tag(tag) {
        return TextString::from_header(header, kind).map(Element::String);
    }
    match tag.number() {
        1 => Boolean::from_header(header).map(Element::Boolean),
        2 => Integer::from_header(header).map(Element::Integer),
        3 => BitString::from_header(header).map(Element::BitString),
        4 => OctetString::from_header(header).map(Element::OctetString),
        5 => Null::from_header(header).map(Element::Null),
        6 => ObjectIdentifier::from_header(header).map(Element::ObjectIdentifier),
        16 | 17 => Err(header.invalid("SEQUENCE and SET must be constructed")),
        23 => Time::from_header(header, TimeKind::Utc).map(Element::Time),
        24 => Time::from_header(header, TimeKind::Generalized).map(Element::Time),
        _ => {
            header.ensure_primitive()?;
            Ok(Element::Raw(Raw { header }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<Element, Asn1Error> {
        Element::from_der(bytes.to_vec())
    }

    #[test]
    fn test_integer_ignores_trailing_bytes() {
        let element = decode(&[0x02, 0x01, 0x05, 0xff, 0xff]).unwrap();
        let integer = element.cast::<Integer>().unwrap();
        assert_eq!(integer.value(), &BigInt::from(5));
        assert_eq!(element.element_data().len(), 3);
        assert_eq!(element.content_data().as_slice(), &[0x05]);
    }

    #[test]
    fn test_negative_integer() {
        let element = decode(&[0x02, 0x02, 0xff, 0x7f]).unwrap();
        assert_eq!(element.cast::<Integer>().unwrap().value(), &BigInt::from(-129));
    }

    #[test]
    fn test_boolean_equality_by_truth_value() {
        let a = decode(&[0x01, 0x01, 0x01]).unwrap();
        let b = decode(&[0x01, 0x01, 0xff]).unwrap();
        let c = decode(&[0x01, 0x01, 0x00]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(decode(&[0x01, 0x02, 0x00, 0x01]).is_err());
    }

    #[test]
    fn test_equality_compares_tag_and_content() {
        let a = decode(&[0x04, 0x02, 0xaa, 0xbb]).unwrap();
        let b = decode(&[0x04, 0x02, 0xaa, 0xbb]).unwrap();
        let c = decode(&[0x80, 0x02, 0xaa, 0xbb]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_nested_indefinite_sequence_then_sibling() {
        // SEQUENCE(indef) { SEQUENCE(indef) { INTEGER 1 } } INTEGER 2, wrapped in a definite SEQUENCE
        let bytes = [
            0x30, 0x0e, // outer definite
            0x30, 0x80, 0x30, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, // indefinite pair
            0x02, 0x01, 0x02, // sibling
        ];
        let element = decode(&bytes).unwrap();
        let outer = element.cast::<Constructed>().unwrap();
        assert_eq!(outer.len(), 2);

        let indefinite = outer.get(0).unwrap();
        assert_eq!(indefinite.element_data().len(), 11);
        assert_eq!(indefinite.content_data().len(), 7);
        let inner = indefinite.cast::<Constructed>().unwrap().get(0).unwrap();
        assert_eq!(inner.element_data().len(), 7);
        assert_eq!(inner.content_data().as_slice(), &[0x02, 0x01, 0x01]);

        let sibling = outer.get(1).unwrap().cast::<Integer>().unwrap();
        assert_eq!(sibling.value(), &BigInt::from(2));
    }

    #[test]
    fn test_missing_end_of_contents() {
        assert!(matches!(
            decode(&[0x30, 0x80, 0x02, 0x01, 0x01]),
            Err(Asn1Error::MissingEndOfContents)
        ));
    }

    #[test]
    fn test_declared_length_shorter_than_children() {
        // declared 5, children need 6
        let result = decode(&[0x30, 0x05, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
        assert!(matches!(result, Err(Asn1Error::Truncated { .. })));
    }

    #[test]
    fn test_declared_length_exceeds_input() {
        let result = decode(&[0x30, 0x10, 0x02, 0x01, 0x01]);
        assert!(matches!(result, Err(Asn1Error::Truncated { .. })));
    }

    #[test]
    fn test_indefinite_primitive_rejected() {
        assert!(matches!(
            decode(&[0x04, 0x80, 0x00, 0x00]),
            Err(Asn1Error::IndefiniteLength(_))
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let depth = MAX_DEPTH + 2;
        let mut bytes = Vec::new();
        for _ in 0..depth {
            bytes.extend_from_slice(&[0x30, 0x80]);
        }
        for _ in 0..depth {
            bytes.extend_from_slice(&END_OF_CONTENTS);
        }
        assert!(matches!(decode(&bytes), Err(Asn1Error::NestingTooDeep(_))));
    }

    #[test]
    fn test_child_limit() {
        let count = MAX_CHILDREN + 1;
        let mut bytes = vec![0x30, 0x83];
        bytes.extend_from_slice(&((count * 2) as u32).to_be_bytes()[1..]);
        for _ in 0..count {
            bytes.extend_from_slice(&[0x05, 0x00]);
        }
        assert!(matches!(decode(&bytes), Err(Asn1Error::TooManyChildren(_))));
    }

    #[test]
    fn test_context_tags_decode_as_raw_or_constructed() {
        let element = decode(&[0x80, 0x02, 0x68, 0x69]).unwrap();
        assert!(matches!(element, Element::Raw(_)));

        let element = decode(&[0xa0, 0x03, 0x02, 0x01, 0x07]).unwrap();
        let explicit = element.cast::<Constructed>().unwrap();
        assert!(explicit.get(0).unwrap().cast::<Integer>().is_some());
    }

    #[test]
    fn test_reinterpret_primitive() {
        let element = decode(&[0x86, 0x03, b'a', b'b', b'c']).unwrap();
        let ia5 = element.reinterpret(Tag::IA5_STRING).unwrap();
        let text = ia5.cast::<TextString>().unwrap();
        assert_eq!(text.text(), "abc");
        assert!(ia5.content_data().same_region(element.content_data()));
        assert!(element.reinterpret(Tag::BOOLEAN).is_err());
    }

    #[test]
    fn test_reinterpret_constructed_as_set_materializes() {
        let element = decode(&[0xa0, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]).unwrap();
        let set = element.reinterpret(Tag::SET).unwrap();
        assert_eq!(set.tag(), Tag::SET);
        assert_eq!(
            set.element_data().as_slice(),
            &[0x31, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]
        );
        assert!(!Arc::ptr_eq(
            set.element_data().buffer(),
            element.element_data().buffer()
        ));

        let back = set.reinterpret(Tag::context(0, true)).unwrap();
        assert_eq!(back.content_data(), element.content_data());
        assert_eq!(back.tag(), element.tag());
    }

    #[test]
    fn test_reinterpret_indefinite_as_sequence_is_definite() {
        let element = decode(&[0xa1, 0x80, 0x05, 0x00, 0x00, 0x00]).unwrap();
        let constructed = element.cast::<Constructed>().unwrap();
        let sequence = constructed.reinterpret_as_sequence().unwrap();
        assert_eq!(sequence.element_data().as_slice(), &[0x30, 0x02, 0x05, 0x00]);
        assert_eq!(sequence.len(), 1);
    }

    #[test]
    fn test_bit_string() {
        let element = decode(&[0x03, 0x03, 0x04, 0xaa, 0xb0]).unwrap();
        let bits = element.cast::<BitString>().unwrap();
        assert_eq!(bits.unused_bits(), 4);
        assert_eq!(bits.bits().as_slice(), &[0xaa, 0xb0]);
        assert!(decode(&[0x03, 0x01, 0x01]).is_err());
        assert!(decode(&[0x03, 0x02, 0x08, 0x00]).is_err());
    }

    #[test]
    fn test_constructed_octet_string_is_constructed() {
        let element = decode(&[0x24, 0x80, 0x04, 0x01, 0xaa, 0x00, 0x00]).unwrap();
        assert!(element.cast::<Constructed>().is_some());
    }
}
