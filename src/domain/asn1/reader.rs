//! Forward cursor over the children of a constructed element.
//!
//! Optional fields are read with `try_*` methods, which advance only on a
//! match. Required fields use `take*`, which turns absence or a type mismatch
//! into a structured error naming the structure and field.

use super::element::{Constructed, Element, ElementKind};
use crate::infra::error::{VerifyError, VerifyResult};

#[derive(Debug, Clone)]
pub struct ConstructedReader<'a> {
    children: &'a [Element],
    position: usize,
    structure: &'static str,
}

impl<'a> ConstructedReader<'a> {
    #[must_use]
    pub fn new(constructed: &'a Constructed, structure: &'static str) -> Self {
        Self {
            children: constructed.children(),
            position: 0,
            structure,
        }
    }

    #[must_use]
    pub fn peek(&self) -> Option<&'a Element> {
        self.children.get(self.position)
    }

    /// Takes the next child regardless of type.
    pub fn next_element(&mut self) -> Option<&'a Element> {
        let next = self.peek()?;
        self.position += 1;
        Some(next)
    }

    /// Takes the next child if it has kind `T`.
    pub fn try_take<T: ElementKind>(&mut self) -> Option<&'a T> {
        self.try_take_where(|element| T::cast(element))
    }

    /// Takes the next child if it is a universal SEQUENCE.
    pub fn try_take_sequence(&mut self) -> Option<&'a Constructed> {
        self.try_take_where(|element| {
            element
                .cast::<Constructed>()
                .filter(|constructed| constructed.is_sequence())
        })
    }

    /// Takes the next child if it is a universal SET.
    pub fn try_take_set(&mut self) -> Option<&'a Constructed> {
        self.try_take_where(|element| element.cast::<Constructed>().filter(|c| c.is_set()))
    }

    /// Takes the next child if it carries context-specific tag `number`, in
    /// either form.
    pub fn try_take_context(&mut self, number: u64) -> Option<&'a Element> {
        self.try_take_where(|element| Some(element).filter(|e| e.tag().is_context(number)))
    }

    pub fn take<T: ElementKind>(&mut self, field: &'static str) -> VerifyResult<&'a T> {
        match self.try_take::<T>() {
            Some(value) => Ok(value),
            None => Err(self.missing(field, T::KIND)),
        }
    }

    pub fn take_sequence(&mut self, field: &'static str) -> VerifyResult<&'a Constructed> {
        match self.try_take_sequence() {
            Some(value) => Ok(value),
            None => Err(self.missing(field, "SEQUENCE")),
        }
    }

    pub fn take_set(&mut self, field: &'static str) -> VerifyResult<&'a Constructed> {
        match self.try_take_set() {
            Some(value) => Ok(value),
            None => Err(self.missing(field, "SET")),
        }
    }

    /// Children not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [Element] {
        &self.children[self.position..]
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.children.len()
    }

    fn try_take_where<T: ?Sized>(
        &mut self,
        select: impl FnOnce(&'a Element) -> Option<&'a T>,
    ) -> Option<&'a T> {
        let value = select(self.peek()?)?;
        self.position += 1;
        Some(value)
    }

    fn missing(&self, field: &'static str, expected: &'static str) -> VerifyError {
        match self.peek() {
            None => VerifyError::MissingField {
                structure: self.structure,
                field,
            },
            Some(found) => VerifyError::UnexpectedElement {
                structure: self.structure,
                field,
                expected,
                found: found.tag().to_string(),
            },
        }
    }
}
