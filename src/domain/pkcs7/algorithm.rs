use crate::domain::asn1::{Constructed, Element, ObjectIdentifier};
use crate::infra::error::VerifyResult;
use std::fmt;

/// `AlgorithmIdentifier { algorithm OID, parameters ANY OPTIONAL }`
#[derive(Clone)]
pub struct AlgorithmIdentifier {
    oid: String,
    parameters: Option<Element>,
}

impl AlgorithmIdentifier {
    pub fn decode(sequence: &Constructed) -> VerifyResult<Self> {
        let mut fields = sequence.reader("AlgorithmIdentifier");
        let oid = fields
            .take::<ObjectIdentifier>("algorithm")?
            .dotted()
            .to_owned();
        let parameters = fields.next_element().cloned();
        Ok(Self { oid, parameters })
    }

    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    #[must_use]
    pub fn parameters(&self) -> Option<&Element> {
        self.parameters.as_ref()
    }

    /// Algorithms agree when their OIDs do; NULL and absent parameters are
    /// interchangeable in practice.
    #[must_use]
    pub fn same_algorithm(&self, other: &AlgorithmIdentifier) -> bool {
        self.oid == other.oid
    }
}

impl fmt::Debug for AlgorithmIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AlgorithmIdentifier(oid={}, params={})",
            self.oid,
            self.parameters.is_some()
        )
    }
}
