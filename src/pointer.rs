//! Pointer view of a [`FastStringMap`].
//!
//! Every node holds a direct reference to its run of children instead of an
//! index, so a lookup step is a single slice bounds check. The nodes still
//! live in one array with the same indices as the flat map they came from,
//! but the references make the array impossible to persist; rebuild it from a
//! flat map instead.

use std::fmt;
use std::ptr::NonNull;
use std::slice;

use tracing::debug;

use crate::map::FastStringMap;
use crate::node::write_node;
use crate::Lookup;

/// Node of a [`PointerMap`].
pub struct PointerNode<V> {
    /// Start of the children run inside the owning map's array. Points at a
    /// valid element (or one past the end) even when `child_count` is zero.
    children: NonNull<PointerNode<V>>,
    child_count: u16,
    child_offset: u8,
    terminal: bool,
    value: V,
}

impl<V> PointerNode<V> {
    /// Reserved child slots, one per byte from `child_offset` upwards.
    #[inline]
    pub fn children(&self) -> &[PointerNode<V>] {
        // SAFETY: `children` and `child_count` describe a run inside the
        // owning map's array (checked in `PointerMap::link`). That array is
        // never mutated or reallocated after linking and outlives `&self`.
        unsafe { slice::from_raw_parts(self.children.as_ptr(), usize::from(self.child_count)) }
    }

    /// Child for the next byte `byte`, if a slot is reserved for it.
    #[inline]
    pub fn child(&self, byte: u8) -> Option<&PointerNode<V>> {
        let slot = byte.checked_sub(self.child_offset)?;
        self.children().get(usize::from(slot))
    }

    #[inline]
    pub fn child_offset(&self) -> u8 {
        self.child_offset
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }
}

/// A [`FastStringMap`] with child indices replaced by direct references.
pub struct PointerMap<V> {
    nodes: Vec<PointerNode<V>>,
    len: usize,
}

// SAFETY: the node pointers only ever target `nodes`, which the map owns and
// never mutates after construction, so sharing or sending the map is as safe
// as sharing or sending the values.
unsafe impl<V: Send> Send for PointerMap<V> {}
unsafe impl<V: Sync> Sync for PointerMap<V> {}

impl<V: Clone> PointerMap<V> {
    /// Derive the pointer view of `flat`, one node per flat node at the same index.
    pub fn from_flat(flat: &FastStringMap<V>) -> Self {
        let src = flat.nodes();
        let nodes = src
            .iter()
            .map(|n| PointerNode {
                children: NonNull::dangling(),
                child_count: n.child_count(),
                child_offset: n.child_offset(),
                terminal: n.is_terminal(),
                value: n.value().clone(),
            })
            .collect();
        let bases = src.iter().map(|n| n.child_base() as usize).collect();
        let map = Self::link(nodes, bases, flat.len());
        debug!(nodes = map.nodes.len(), keys = map.len, "derived pointer map");
        map
    }
}

impl<V> PointerMap<V> {
    /// Point every node at its children, `bases` giving each node's first
    /// child index.
    fn link(mut nodes: Vec<PointerNode<V>>, bases: Vec<usize>, len: usize) -> Self {
        let n = nodes.len();
        assert!(n > 0, "pointer map needs a root node");
        assert_eq!(bases.len(), n);
        let array = nodes.as_mut_ptr();
        for (i, base) in bases.into_iter().enumerate() {
            // SAFETY: `i < n`; `array` is the start of `nodes`, whose buffer is
            // not touched through any other path until linking is done.
            let node = unsafe { &mut *array.add(i) };
            let count = usize::from(node.child_count);
            let base = if count == 0 { 0 } else { base };
            assert!(
                base + count <= n,
                "node {i}: child range {base}..+{count} exceeds {n} nodes"
            );
            // SAFETY: `base <= n`, so the pointer is in bounds or one past the end.
            node.children = unsafe { NonNull::new_unchecked(array.add(base)) };
        }
        Self { nodes, len }
    }

    #[inline]
    pub fn root(&self) -> &PointerNode<V> {
        &self.nodes[0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<PointerNode<V>>()
    }

    /// Index of `node`'s first child in this map's array.
    fn child_base(&self, node: &PointerNode<V>) -> usize {
        // SAFETY: both pointers are into (or one past) `self.nodes`.
        let offset = unsafe { node.children.as_ptr().offset_from(self.nodes.as_ptr()) };
        offset as usize
    }

    /// Same format as [`FastStringMap::dump`]; child bases are recovered from
    /// the references.
    pub fn dump(&self) -> Dump<'_, V> {
        Dump(self)
    }
}

impl<V> Lookup for PointerMap<V> {
    type Value = V;

    #[inline]
    fn get_bytes(&self, key: &[u8]) -> Option<&V> {
        let mut node = self.root();
        for &byte in key {
            node = node.child(byte)?;
        }
        node.terminal.then_some(&node.value)
    }
}

impl<V: Clone> From<&FastStringMap<V>> for PointerMap<V> {
    fn from(flat: &FastStringMap<V>) -> Self {
        Self::from_flat(flat)
    }
}

impl<V: Clone> Clone for PointerMap<V> {
    fn clone(&self) -> Self {
        let bases: Vec<usize> = self.nodes.iter().map(|n| self.child_base(n)).collect();
        let nodes = self
            .nodes
            .iter()
            .map(|n| PointerNode {
                children: NonNull::dangling(),
                child_count: n.child_count,
                child_offset: n.child_offset,
                terminal: n.terminal,
                value: n.value.clone(),
            })
            .collect();
        Self::link(nodes, bases, self.len)
    }
}

impl<V: fmt::Debug> fmt::Debug for PointerMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerMap")
            .field("len", &self.len)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// Display adaptor returned by [`PointerMap::dump`].
pub struct Dump<'a, V>(&'a PointerMap<V>);

impl<V: fmt::Debug> fmt::Display for Dump<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.0;
        for (i, n) in map.nodes.iter().enumerate() {
            write!(f, "{i}: ")?;
            write_node(
                f,
                map.child_base(n) as u32,
                n.child_count,
                n.child_offset,
                n.terminal,
                &n.value,
            )?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<V: Clone> FastStringMap<V> {
    /// Derive the pointer view of this map.
    pub fn to_pointer_map(&self) -> PointerMap<V> {
        PointerMap::from_flat(self)
    }
}
