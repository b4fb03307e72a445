//! Immutable views into a shared byte buffer.
//!
//! Every decoded element refers back into the buffer it was decoded from, so
//! a whole signature tree shares one allocation. Windows are cheap to clone
//! and slicing never copies.

use super::error::Asn1Error;
use std::fmt;
use std::sync::Arc;

/// A `(buffer, offset, length)` view. Offset and length always lie within the buffer.
#[derive(Clone)]
pub struct ByteWindow {
    buffer: Arc<[u8]>,
    offset: usize,
    length: usize,
}

impl ByteWindow {
    /// Window covering an entire buffer.
    #[must_use]
    pub fn new(buffer: Arc<[u8]>) -> Self {
        let length = buffer.len();
        Self {
            buffer,
            offset: 0,
            length,
        }
    }

    /// Window over an explicit sub-range of `buffer`.
    pub fn with_range(buffer: Arc<[u8]>, offset: usize, length: usize) -> Result<Self, Asn1Error> {
        check_bounds(offset, length, buffer.len())?;
        Ok(Self {
            buffer,
            offset,
            length,
        })
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[self.offset..self.offset + self.length]
    }

    /// Position of the window inside its buffer.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[must_use]
    pub fn buffer(&self) -> &Arc<[u8]> {
        &self.buffer
    }

    #[must_use]
    pub fn first(&self) -> Option<u8> {
        self.as_slice().first().copied()
    }

    /// Drops the first `count` bytes.
    pub fn advance(&self, count: usize) -> Result<Self, Asn1Error> {
        if count > self.length {
            return Err(Asn1Error::Truncated {
                needed: count,
                available: self.length,
            });
        }
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            offset: self.offset + count,
            length: self.length - count,
        })
    }

    /// Keeps only the first `length` bytes.
    pub fn constrain(&self, length: usize) -> Result<Self, Asn1Error> {
        self.slice(0, length)
    }

    /// Sub-window relative to this window's start.
    pub fn slice(&self, start: usize, length: usize) -> Result<Self, Asn1Error> {
        check_bounds(start, length, self.length)?;
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            offset: self.offset + start,
            length,
        })
    }

    /// Same window with leading zero octets removed. An all-zero window
    /// collapses to empty.
    #[must_use]
    pub fn trim_leading_zeros(&self) -> Self {
        let skip = self
            .as_slice()
            .iter()
            .take_while(|&&byte| byte == 0)
            .count();
        Self {
            buffer: Arc::clone(&self.buffer),
            offset: self.offset + skip,
            length: self.length - skip,
        }
    }

    /// Whether both windows name exactly the same region of the same buffer.
    #[must_use]
    pub fn same_region(&self, other: &ByteWindow) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
            && self.offset == other.offset
            && self.length == other.length
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

fn check_bounds(offset: usize, length: usize, limit: usize) -> Result<(), Asn1Error> {
    match offset.checked_add(length) {
        Some(end) if end <= limit => Ok(()),
        _ => Err(Asn1Error::OutOfBounds {
            offset,
            length,
            limit,
        }),
    }
}

impl PartialEq for ByteWindow {
    fn eq(&self, other: &Self) -> bool {
        self.same_region(other) || self.as_slice() == other.as_slice()
    }
}

impl Eq for ByteWindow {}

impl AsRef<[u8]> for ByteWindow {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for ByteWindow {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(Arc::from(bytes))
    }
}

impl From<&[u8]> for ByteWindow {
    fn from(bytes: &[u8]) -> Self {
        Self::new(Arc::from(bytes))
    }
}

impl fmt::Debug for ByteWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteWindow")
            .field("offset", &self.offset)
            .field("len", &self.length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slicing_shares_buffer() {
        let window = ByteWindow::from(vec![1u8, 2, 3, 4, 5]);
        let inner = window.slice(1, 3).unwrap();
        assert_eq!(inner.as_slice(), &[2, 3, 4]);
        assert_eq!(inner.offset(), 1);
        assert!(Arc::ptr_eq(window.buffer(), inner.buffer()));

        let tail = inner.advance(2).unwrap();
        assert_eq!(tail.as_slice(), &[4]);
        assert_eq!(tail.offset(), 3);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let window = ByteWindow::from(vec![0u8; 4]);
        assert!(window.slice(2, 3).is_err());
        assert!(window.advance(5).is_err());
        assert!(window.slice(usize::MAX, 2).is_err());
        assert!(ByteWindow::with_range(Arc::from(vec![0u8; 4]), 1, 4).is_err());
    }

    #[test]
    fn test_equality_by_content() {
        let a = ByteWindow::from(vec![9u8, 1, 2]).advance(1).unwrap();
        let b = ByteWindow::from(vec![1u8, 2]);
        assert_eq!(a, b);
        assert!(!a.same_region(&b));
        assert!(a.same_region(&a.clone()));
    }

    #[test]
    fn test_trim_leading_zeros() {
        let window = ByteWindow::from(vec![0u8, 0, 0x80, 0]);
        assert_eq!(window.trim_leading_zeros().as_slice(), &[0x80, 0]);
        assert!(ByteWindow::from(vec![0u8, 0])
            .trim_leading_zeros()
            .is_empty());
    }
}
