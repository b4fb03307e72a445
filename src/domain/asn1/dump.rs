//! Indented text rendering of an element tree, used by the `dump` command.

use super::element::Element;
use std::fmt;

/// Octets shown for opaque values before eliding the rest.
const PREVIEW_OCTETS: usize = 32;

/// Display adapter that prints one element per line, children indented.
pub struct ElementTree<'a> {
    root: &'a Element,
    describe_oid: Option<fn(&str) -> Option<&'static str>>,
}

impl<'a> ElementTree<'a> {
    #[must_use]
    pub fn new(root: &'a Element) -> Self {
        Self {
            root,
            describe_oid: None,
        }
    }

    /// Annotates object identifiers with a friendly name when `describe` knows one.
    #[must_use]
    pub fn with_oid_names(mut self, describe: fn(&str) -> Option<&'static str>) -> Self {
        self.describe_oid = Some(describe);
        self
    }

    fn write_element(&self, f: &mut fmt::Formatter<'_>, element: &Element, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}", "", indent = depth * 2)?;
        match element {
            Element::Boolean(b) => writeln!(f, "BOOLEAN {}", b.value()),
            Element::Integer(i) => writeln!(f, "INTEGER {}", i.value()),
            Element::BitString(b) => writeln!(
                f,
                "BIT STRING ({} unused) {}",
                b.unused_bits(),
                preview(b.bits().as_slice())
            ),
            Element::OctetString(o) => {
                writeln!(f, "OCTET STRING ({} bytes) {}", o.value().len(), preview(o.value()))
            }
            Element::Null(_) => writeln!(f, "NULL"),
            Element::ObjectIdentifier(oid) => {
                match self.describe_oid.and_then(|describe| describe(oid.dotted())) {
                    Some(name) => writeln!(f, "OBJECT IDENTIFIER {} ({name})", oid.dotted()),
                    None => writeln!(f, "OBJECT IDENTIFIER {}", oid.dotted()),
                }
            }
            Element::String(s) => writeln!(f, "{} '{}'", s.kind().name(), s.text()),
            Element::Time(t) => writeln!(f, "{} {}", t.kind().name(), t.value().to_rfc3339()),
            Element::Raw(raw) => writeln!(
                f,
                "{} ({} bytes) {}",
                raw.tag(),
                raw.value().len(),
                preview(raw.value())
            ),
            Element::Constructed(constructed) => {
                writeln!(f, "{} ({} children)", constructed.tag(), constructed.len())?;
                for child in constructed.children() {
                    self.write_element(f, child, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for ElementTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_element(f, self.root, 0)
    }
}

fn preview(bytes: &[u8]) -> String {
    if bytes.len() <= PREVIEW_OCTETS {
        hex::encode(bytes)
    } else {
        format!("{}...", hex::encode(&bytes[..PREVIEW_OCTETS]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_nested_tree() {
        let element =
            Element::from_der(vec![0x30, 0x08, 0x06, 0x03, 0x55, 0x04, 0x03, 0x01, 0x01, 0xff])
                .unwrap();
        let text = ElementTree::new(&element)
            .with_oid_names(|oid| (oid == "2.5.4.3").then_some("commonName"))
            .to_string();
        assert_eq!(
            text,
            "SEQUENCE (2 children)\n  OBJECT IDENTIFIER 2.5.4.3 (commonName)\n  BOOLEAN true\n"
        );
    }
}
