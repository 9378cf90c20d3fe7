//! Errors raised when adopting a node array that was not produced by the
//! builder in this process (for example one read back from storage).

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a node array is rejected by [`FastStringMap::from_nodes`](crate::FastStringMap::from_nodes).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The array has no root node.
    #[error("node array is empty")]
    Empty,

    /// A child range points past the end of the array.
    #[error(
        "node {index}: child range {child_base}..+{child_count} exceeds array length {len}"
    )]
    ChildRangeOutOfBounds {
        index: usize,
        child_base: u32,
        child_count: u16,
        len: usize,
    },

    /// A child range starts at or before its parent.
    #[error("node {index}: child range starts at {child_base}, not after its parent")]
    ChildRangeNotForward { index: usize, child_base: u32 },

    /// A child range covers byte values above 255.
    #[error("node {index}: child range {child_offset}..+{child_count} exceeds the byte range")]
    ByteRangeOverflow {
        index: usize,
        child_offset: u8,
        child_count: u16,
    },

    /// A node falls inside the child ranges of two parents.
    #[error("node {index} is claimed by more than one child range")]
    SharedChild { index: usize },

    /// A node is not inside any child range.
    #[error("node {index} is unreachable from the root")]
    Unreachable { index: usize },
}
