//! Flat-array node layout.

use std::fmt;

/// Number of distinct byte values, and so the widest possible child range.
pub const MAX_CHILDREN: usize = 256;

/// One state of the trie: the position reached after consuming some prefix.
///
/// Children for the next byte `b` live at
/// `child_base + (b - child_offset)` for `b` in
/// `child_offset..child_offset + child_count`. Slots in that range that no key
/// continues through are plain default nodes.
#[derive(Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node<V> {
    pub(crate) child_base: u32,
    /// `u16` because a range spanning `0x00..=0xFF` holds 256 slots.
    pub(crate) child_count: u16,
    pub(crate) child_offset: u8,
    pub(crate) terminal: bool,
    pub(crate) value: V,
}

impl<V> Node<V> {
    /// Index of the first reserved child slot. Meaningless when
    /// [`child_count`](Self::child_count) is zero.
    #[inline]
    pub fn child_base(&self) -> u32 {
        self.child_base
    }

    #[inline]
    pub fn child_count(&self) -> u16 {
        self.child_count
    }

    /// Smallest next-byte value with a reserved child.
    #[inline]
    pub fn child_offset(&self) -> u8 {
        self.child_offset
    }

    /// Whether a stored key ends exactly here.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Slot offset of `byte` within this node's child range, if reserved.
    #[inline]
    pub(crate) fn child_slot(&self, byte: u8) -> Option<usize> {
        let slot = usize::from(byte.checked_sub(self.child_offset)?);
        (slot < usize::from(self.child_count)).then_some(slot)
    }
}

impl<V: fmt::Debug> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(
            f,
            self.child_base,
            self.child_count,
            self.child_offset,
            self.terminal,
            &self.value,
        )
    }
}

/// Shared dump line format for both representations.
pub(crate) fn write_node<V: fmt::Debug>(
    f: &mut fmt::Formatter<'_>,
    child_base: u32,
    child_count: u16,
    child_offset: u8,
    terminal: bool,
    value: &V,
) -> fmt::Result {
    write!(
        f,
        "{{child_base: {child_base}, child_count: {child_count}, child_offset: {child_offset}, terminal: {terminal}, value: {value:?}}}"
    )
}
