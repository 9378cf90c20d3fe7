//! # fast-string-map
//!
//! A static, read-only map from byte strings to values, stored as a
//! byte-indexed trie in one flat array.
//!
//! Each node reserves a contiguous run of child slots covering the byte values
//! between the smallest and largest next byte of the keys below it, so a
//! lookup step is a subtraction and a range check. The map is built once from
//! a [`Source`] and never changes afterwards.
//!
//! Two representations share the [`Lookup`] trait:
//! - [`FastStringMap`]: children addressed by index; the node array holds no
//!   pointers and can be persisted directly.
//! - [`PointerMap`]: derived from a `FastStringMap`, children addressed by
//!   reference; slightly faster, never persisted.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use fast_string_map::{FastStringMap, Lookup};
//!
//! let mut src: HashMap<&str, u32> = HashMap::new();
//! src.insert("key1", 42);
//! src.insert("key2", 27644437);
//! src.insert("l", 2);
//!
//! let map = FastStringMap::new(&src);
//! assert_eq!(map.lookup_str("key1"), (42, true));
//! assert_eq!(map.lookup_str("m"), (0, false));
//! assert_eq!(map.get(b"l"), Some(&2));
//!
//! let fast = map.to_pointer_map();
//! assert_eq!(fast.lookup_str("key2"), (27644437, true));
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod build;
pub mod error;
pub mod map;
pub mod node;
pub mod pointer;
pub mod source;

pub use build::BuildConfig;
pub use error::{Error, Result};
pub use map::FastStringMap;
pub use node::Node;
pub use pointer::{PointerMap, PointerNode};
pub use source::Source;

/// Map from byte strings to `u32`.
pub type Uint32Map = FastStringMap<u32>;

/// Point lookups shared by both map representations.
///
/// Text and byte keys are the same thing here: a `&str` is looked up through
/// its UTF-8 bytes, with no normalisation.
pub trait Lookup {
    type Value;

    /// Value stored at exactly `key`, if any.
    fn get_bytes(&self, key: &[u8]) -> Option<&Self::Value>;

    #[inline]
    fn get<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Option<&Self::Value> {
        self.get_bytes(key.as_ref())
    }

    #[inline]
    fn contains_key<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> bool {
        self.get_bytes(key.as_ref()).is_some()
    }

    /// `(value, true)` when `key` is stored, otherwise `(Default::default(), false)`.
    #[inline]
    fn lookup_bytes(&self, key: &[u8]) -> (Self::Value, bool)
    where
        Self::Value: Clone + Default,
    {
        match self.get_bytes(key) {
            Some(v) => (v.clone(), true),
            None => (Default::default(), false),
        }
    }

    #[inline]
    fn lookup_str(&self, key: &str) -> (Self::Value, bool)
    where
        Self::Value: Clone + Default,
    {
        self.lookup_bytes(key.as_bytes())
    }
}


#[cfg(test)]
mod proptests;
