//! The flat-array map: every node in one `Vec`, children addressed by index.

use std::collections::BTreeMap;
use std::fmt;

use crate::build::{build, BuildConfig};
use crate::error::{Error, Result};
use crate::node::{write_node, Node, MAX_CHILDREN};
use crate::source::Source;
use crate::Lookup;

/// Initial capacity of the prefix buffer used while enumerating keys. Longer
/// keys simply grow it.
const PREFIX_BUF_LEN: usize = 256;

/// A read-only map from byte strings to `V`, stored as a byte-indexed trie in
/// a single array.
///
/// The array holds no pointers, so it can be persisted as-is (see
/// [`nodes`](Self::nodes) and [`from_nodes`](Self::from_nodes)).
#[derive(Clone, PartialEq, Eq)]
pub struct FastStringMap<V> {
    /// Node 0 is the root.
    nodes: Vec<Node<V>>,
    len: usize,
}

impl<V: Default> FastStringMap<V> {
    /// Build from every key/value pair in `src`.
    pub fn new<S>(src: S) -> Self
    where
        S: Source<Value = V>,
    {
        Self::with_config(src, &BuildConfig::default())
    }

    /// Build from `src` with a custom block allocator configuration.
    pub fn with_config<S>(src: S, config: &BuildConfig) -> Self
    where
        S: Source<Value = V>,
    {
        let built = build(&src, config);
        Self {
            nodes: built.nodes,
            len: built.key_count,
        }
    }
}

impl<V> FastStringMap<V> {
    /// Adopt a node array, typically one read back from storage.
    ///
    /// The array must describe a tree rooted at index 0 whose child ranges lie
    /// after their parent, inside the array, and inside the byte range.
    pub fn from_nodes(nodes: Vec<Node<V>>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::Empty);
        }

        let mut claimed = vec![false; nodes.len()];
        claimed[0] = true;
        for (index, node) in nodes.iter().enumerate() {
            if node.child_count == 0 {
                continue;
            }
            let base = node.child_base as usize;
            let count = usize::from(node.child_count);
            if usize::from(node.child_offset) + count > MAX_CHILDREN {
                return Err(Error::ByteRangeOverflow {
                    index,
                    child_offset: node.child_offset,
                    child_count: node.child_count,
                });
            }
            if base <= index {
                return Err(Error::ChildRangeNotForward {
                    index,
                    child_base: node.child_base,
                });
            }
            if base + count > nodes.len() {
                return Err(Error::ChildRangeOutOfBounds {
                    index,
                    child_base: node.child_base,
                    child_count: node.child_count,
                    len: nodes.len(),
                });
            }
            for child in base..base + count {
                if std::mem::replace(&mut claimed[child], true) {
                    return Err(Error::SharedChild { index: child });
                }
            }
        }
        if let Some(index) = claimed.iter().position(|c| !c) {
            return Err(Error::Unreachable { index });
        }

        let len = nodes.iter().filter(|n| n.terminal).count();
        Ok(Self { nodes, len })
    }

    /// The flat node array; index 0 is the root.
    #[inline]
    pub fn nodes(&self) -> &[Node<V>] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node<V>> {
        self.nodes
    }

    /// Number of stored keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node<V>>()
    }

    /// Node reached by walking `key` from the root, if every byte has a
    /// reserved child slot.
    #[inline]
    fn walk(&self, key: &[u8]) -> Option<&Node<V>> {
        let mut node = &self.nodes[0];
        for &byte in key {
            let slot = node.child_slot(byte)?;
            node = &self.nodes[node.child_base as usize + slot];
        }
        Some(node)
    }

    /// Append every stored key to `keys` in byte-lexicographic order.
    pub fn append_sorted_keys(&self, keys: &mut Vec<Vec<u8>>) {
        keys.extend(self.iter().map(|(key, _)| key));
    }

    pub fn sorted_keys(&self) -> Vec<Vec<u8>> {
        let mut keys = Vec::with_capacity(self.len);
        self.append_sorted_keys(&mut keys);
        keys
    }

    /// Key/value pairs in byte-lexicographic key order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            map: self,
            stack: vec![Frame {
                index: 0,
                depth: 0,
                byte: 0,
            }],
            prefix: Vec::with_capacity(PREFIX_BUF_LEN),
        }
    }

    /// One line per node: `index: {child_base, child_count, child_offset, terminal, value}`.
    pub fn dump(&self) -> Dump<'_, V> {
        Dump(&self.nodes)
    }
}

impl<V> Lookup for FastStringMap<V> {
    type Value = V;

    #[inline]
    fn get_bytes(&self, key: &[u8]) -> Option<&V> {
        let node = self.walk(key)?;
        node.terminal.then_some(&node.value)
    }
}

impl<V: Default> Default for FastStringMap<V> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
            len: 0,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FastStringMap<V>
where
    K: AsRef<[u8]> + Ord,
    V: Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let pairs: BTreeMap<K, V> = iter.into_iter().collect();
        Self::new(&pairs)
    }
}

impl<V: fmt::Debug> fmt::Debug for FastStringMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.iter()
                    .map(|(k, v)| (String::from_utf8_lossy(&k).into_owned(), v)),
            )
            .finish()
    }
}

#[cfg(feature = "serde")]
impl<V: serde::Serialize> serde::Serialize for FastStringMap<V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.nodes, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, V: serde::Deserialize<'de>> serde::Deserialize<'de> for FastStringMap<V> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let nodes = <Vec<Node<V>> as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_nodes(nodes).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Iteration and dumping
// =============================================================================

#[derive(Clone, Copy)]
struct Frame {
    index: u32,
    /// Length of the key prefix leading to this node.
    depth: usize,
    /// Last byte of that prefix (unused for the root).
    byte: u8,
}

pub struct Iter<'a, V> {
    map: &'a FastStringMap<V>,
    stack: Vec<Frame>,
    prefix: Vec<u8>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Vec<u8>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            if frame.depth > 0 {
                self.prefix.truncate(frame.depth - 1);
                self.prefix.push(frame.byte);
            }

            let node = &self.map.nodes[frame.index as usize];
            for slot in (0..node.child_count).rev() {
                self.stack.push(Frame {
                    index: node.child_base + u32::from(slot),
                    depth: frame.depth + 1,
                    byte: node.child_offset + slot as u8,
                });
            }

            if node.terminal {
                return Some((self.prefix.clone(), &node.value));
            }
        }
        None
    }
}

/// Display adaptor returned by [`FastStringMap::dump`].
pub struct Dump<'a, V>(&'a [Node<V>]);

impl<V: fmt::Debug> fmt::Display for Dump<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, n) in self.0.iter().enumerate() {
            write!(f, "{i}: ")?;
            write_node(f, n.child_base, n.child_count, n.child_offset, n.terminal, &n.value)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
