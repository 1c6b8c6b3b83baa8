//! Metadata entries attached to keys.
//!
//! A metadata entry is an immutable name/value pair. Entries are handed
//! around behind [`Arc`], and the *instance* is the unit of sharing: two
//! keys carry "the same" metadata only when they hold the same allocation,
//! never merely because name and value compare equal. Content equality
//! exists separately (via [`PartialEq`]) for comparing whole trees.

use std::fmt;
use std::sync::Arc;

/// An immutable metadata name/value pair.
///
/// Both name and value are arbitrary byte strings; embedded NUL bytes and
/// newlines are legal. Once created an entry never changes: replacing a
/// key's metadata allocates a fresh entry, so shared instances observed by
/// other keys stay intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    name: Box<[u8]>,
    value: Box<[u8]>,
}

impl MetaEntry {
    /// Create a new entry, copying name and value.
    pub fn new(name: &[u8], value: &[u8]) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a new entry already wrapped for sharing.
    pub fn shared(name: &[u8], value: &[u8]) -> Arc<Self> {
        Arc::new(Self::new(name, value))
    }

    /// The entry's name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// The entry's raw value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Whether two handles point at the same underlying instance.
    ///
    /// This is the sameness the flyweight model cares about; equal content
    /// from two independent allocations does not count.
    pub fn same_instance(a: &Arc<Self>, b: &Arc<Self>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl fmt::Display for MetaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}",
            String::from_utf8_lossy(&self.name),
            String::from_utf8_lossy(&self.value)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_content_is_not_the_same_instance() {
        let a = MetaEntry::shared(b"m", b"x");
        let b = MetaEntry::shared(b"m", b"x");

        assert_eq!(a, b);
        assert!(!MetaEntry::same_instance(&a, &b));
        assert!(MetaEntry::same_instance(&a, &a.clone()));
    }

    #[test]
    fn binary_payloads_survive() {
        let entry = MetaEntry::new(b"bin\0name", b"line\nbreak\0");
        assert_eq!(entry.name(), b"bin\0name");
        assert_eq!(entry.value(), b"line\nbreak\0");
    }
}
