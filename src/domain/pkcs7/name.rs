//! X.501 distinguished names.

use crate::domain::asn1::{ByteWindow, Constructed, Element, ObjectIdentifier, TextString};
use crate::domain::constants::{name_attribute_label, COMMON_NAME_OID};
use crate::infra::error::{VerifyError, VerifyResult};
use std::fmt;

/// One `AttributeTypeAndValue` of a relative distinguished name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeAndValue {
    oid: String,
    value: Element,
}

impl AttributeTypeAndValue {
    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    #[must_use]
    pub fn value(&self) -> &Element {
        &self.value
    }

    /// Text of string-typed values.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.value.cast::<TextString>().map(TextString::text)
    }
}

/// `SET OF AttributeTypeAndValue`; members compare without regard to order.
#[derive(Debug, Clone)]
pub struct RelativeDistinguishedName {
    attributes: Vec<AttributeTypeAndValue>,
}

impl RelativeDistinguishedName {
    #[must_use]
    pub fn attributes(&self) -> &[AttributeTypeAndValue] {
        &self.attributes
    }
}

impl PartialEq for RelativeDistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        if self.attributes.len() != other.attributes.len() {
            return false;
        }
        let mut used = vec![false; other.attributes.len()];
        self.attributes.iter().all(|mine| {
            let found = other
                .attributes
                .iter()
                .enumerate()
                .find(|(index, theirs)| !used[*index] && *theirs == mine)
                .map(|(index, _)| index);
            match found {
                Some(index) => {
                    used[index] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl Eq for RelativeDistinguishedName {}

/// `RDNSequence`: ordered RDNs. Equality is element-wise across RDNs and
/// set-wise within each RDN.
#[derive(Debug, Clone)]
pub struct Name {
    rdns: Vec<RelativeDistinguishedName>,
    der: ByteWindow,
}

impl Name {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let rdns = sequence
            .children()
            .iter()
            .map(decode_rdn)
            .collect::<VerifyResult<Vec<_>>>()?;
        Ok(Self {
            rdns,
            der: sequence.element_data().clone(),
        })
    }

    #[must_use]
    pub fn rdns(&self) -> &[RelativeDistinguishedName] {
        &self.rdns
    }

    /// Encoded `Name` as it appeared in the source.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        self.der.as_slice()
    }

    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.rdns
            .iter()
            .flat_map(|rdn| rdn.attributes.iter())
            .find(|attribute| attribute.oid == COMMON_NAME_OID)
            .and_then(AttributeTypeAndValue::text)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.der.same_region(&other.der) || self.rdns == other.rdns
    }
}

impl Eq for Name {}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for attribute in self.rdns.iter().flat_map(|rdn| rdn.attributes.iter()) {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            let label = name_attribute_label(&attribute.oid).unwrap_or(attribute.oid.as_str());
            match attribute.text() {
                Some(text) => write!(f, "{label}={text}")?,
                None => write!(
                    f,
                    "{label}=#{}",
                    hex::encode(attribute.value.content_data().as_slice())
                )?,
            }
        }
        Ok(())
    }
}

fn decode_rdn(element: &Element) -> VerifyResult<RelativeDistinguishedName> {
    let set = element
        .cast::<Constructed>()
        .filter(|c| c.is_set())
        .ok_or_else(|| VerifyError::Cms(format!("RDN must be a SET, found {}", element.tag())))?;
    let attributes = set
        .children()
        .iter()
        .map(|child| {
            let pair = child
                .cast::<Constructed>()
                .filter(|c| c.is_sequence())
                .ok_or_else(|| {
                    VerifyError::Cms("AttributeTypeAndValue must be a SEQUENCE".to_string())
                })?;
            let mut fields = pair.reader("AttributeTypeAndValue");
            let oid = fields.take::<ObjectIdentifier>("type")?.dotted().to_owned();
            let value = fields.take::<Element>("value")?.clone();
            Ok(AttributeTypeAndValue { oid, value })
        })
        .collect::<VerifyResult<Vec<_>>>()?;
    Ok(RelativeDistinguishedName { attributes })
}
