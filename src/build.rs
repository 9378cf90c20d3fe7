//! One-pass construction of the flat node array.
//!
//! Keys are sorted, then partitioned depth-first by their byte at the current
//! depth. Child ranges are reserved in blocks that are only ever appended to,
//! so the index handed out for a reservation stays valid; the blocks are
//! concatenated into a single array at the end.

use std::ops::Range;

use tracing::{debug, trace};

use crate::node::{Node, MAX_CHILDREN};
use crate::source::Source;

// =============================================================================
// Configuration
// =============================================================================

const DEFAULT_MAX_BLOCK_LEN: usize = 1 << 20;
const MIN_FIRST_BLOCK_LEN: usize = 1 << 4;

/// Largest node count addressable by a `u32` child base.
const MAX_NODES: usize = u32::MAX as usize;

/// Tuning for the block allocator used during construction.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Ceiling on the length of a single allocation block, in nodes.
    /// Values below 256 are raised to 256 so any child range fits one block.
    pub max_block_len: usize,
    /// Length of the first block. `None` sizes it from the key count.
    pub first_block_len: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_block_len: DEFAULT_MAX_BLOCK_LEN,
            first_block_len: None,
        }
    }
}

impl BuildConfig {
    #[inline]
    fn block_ceiling(&self) -> usize {
        self.max_block_len.max(MAX_CHILDREN)
    }

    /// Smallest power of two that is at least 16 and at least `key_count`,
    /// capped by the block ceiling.
    fn first_block_len_for(&self, key_count: usize) -> usize {
        if let Some(len) = self.first_block_len {
            return len.clamp(1, self.block_ceiling());
        }
        let ceiling = self.block_ceiling();
        let mut len = MIN_FIRST_BLOCK_LEN;
        while len < key_count && len < ceiling {
            len <<= 1;
        }
        len.min(ceiling)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Position of a node while its block has not been flattened yet.
#[derive(Clone, Copy, Debug)]
struct Slot {
    block: usize,
    pos: usize,
}

/// A node still to be initialised from `keys`, which share their first
/// `depth` bytes.
struct Pending {
    slot: Slot,
    keys: Range<usize>,
    depth: usize,
}

struct Builder<'s, S: Source> {
    src: &'s S,
    blocks: Vec<Vec<Node<S::Value>>>,
    /// Capacity the current (last) block was sized for.
    block_cap: usize,
    block_ceiling: usize,
    /// Nodes reserved so far across all blocks.
    len: usize,
}

/// Output of [`build`]: the flattened array and the number of stored keys.
pub(crate) struct Built<V> {
    pub(crate) nodes: Vec<Node<V>>,
    pub(crate) key_count: usize,
}

/// Build the flat node array for every key in `src`.
pub(crate) fn build<S>(src: &S, config: &BuildConfig) -> Built<S::Value>
where
    S: Source,
    S::Value: Default,
{
    let mut keys = Vec::new();
    src.append_keys(&mut keys);
    if keys.is_empty() {
        debug!(keys = 0, nodes = 1, "built empty map");
        return Built {
            nodes: vec![Node::default()],
            key_count: 0,
        };
    }

    keys.sort_unstable_by(|a, b| a.as_ref().cmp(b.as_ref()));
    // A well-behaved source never repeats a key; collapse repeats anyway so the
    // partitioning below can rely on strictly increasing keys.
    keys.dedup_by(|a, b| a.as_ref() == b.as_ref());

    let first_block_len = config.first_block_len_for(keys.len());
    let mut root_block = Vec::with_capacity(first_block_len);
    root_block.push(Node::default());

    let mut builder = Builder {
        src,
        blocks: vec![root_block],
        block_cap: first_block_len,
        block_ceiling: config.block_ceiling(),
        len: 1,
    };
    builder.fill(&keys);

    let block_count = builder.blocks.len();
    let nodes = builder.finish();
    debug!(
        keys = keys.len(),
        nodes = nodes.len(),
        blocks = block_count,
        "built map"
    );
    Built {
        nodes,
        key_count: keys.len(),
    }
}

impl<'s, S> Builder<'s, S>
where
    S: Source,
    S::Value: Default,
{
    /// Initialise the root and every node below it for `keys`, which are
    /// sorted and distinct.
    ///
    /// Pending nodes are kept on an explicit stack, smallest byte on top, so
    /// ranges are reserved in depth-first order and key length does not
    /// bound the call stack.
    fn fill(&mut self, keys: &[S::Key]) {
        let mut stack = vec![Pending {
            slot: Slot { block: 0, pos: 0 },
            keys: 0..keys.len(),
            depth: 0,
        }];

        while let Some(Pending { slot, keys: range, depth }) = stack.pop() {
            let mut node = Node::default();
            let mut start = range.start;
            let end = range.end;

            // A key with no more bytes sorts before all its extensions.
            if keys[start].as_ref().len() == depth {
                node.terminal = true;
                node.value = self.src.get(&keys[start]);
                start += 1;
            }
            if start == end {
                self.blocks[slot.block][slot.pos] = node;
                continue;
            }

            let lo = keys[start].as_ref()[depth];
            let hi = keys[end - 1].as_ref()[depth];
            let count = usize::from(hi - lo) + 1;
            let (base, first) = self.reserve(count);

            node.child_base = base;
            node.child_count = count as u16;
            node.child_offset = lo;
            self.blocks[slot.block][slot.pos] = node;

            // Runs of keys sharing the byte at `depth`, pushed highest first.
            let mut run_end = end;
            while run_end > start {
                let byte = keys[run_end - 1].as_ref()[depth];
                let mut run_start = run_end - 1;
                while run_start > start && keys[run_start - 1].as_ref()[depth] == byte {
                    run_start -= 1;
                }
                stack.push(Pending {
                    slot: Slot {
                        block: first.block,
                        pos: first.pos + usize::from(byte - lo),
                    },
                    keys: run_start..run_end,
                    depth: depth + 1,
                });
                run_end = run_start;
            }
        }
    }

    /// Reserve `n` contiguous default nodes, returning their final index and
    /// where they currently live.
    fn reserve(&mut self, n: usize) -> (u32, Slot) {
        debug_assert!((1..=MAX_CHILDREN).contains(&n));
        assert!(
            self.len + n <= MAX_NODES,
            "node count exceeds u32 index range"
        );
        let base = self.len as u32;
        self.len += n;

        let current = self.blocks.len() - 1;
        if self.block_cap - self.blocks[current].len() < n {
            let mut cap = self.block_cap.saturating_mul(2);
            while cap < n {
                cap *= 2;
            }
            cap = cap.min(self.block_ceiling);
            trace!(block = self.blocks.len(), cap, "new allocation block");
            self.blocks.push(Vec::with_capacity(cap));
            self.block_cap = cap;
        }

        let block = self.blocks.len() - 1;
        let pos = self.blocks[block].len();
        self.blocks[block].resize_with(pos + n, Node::default);
        (base, Slot { block, pos })
    }

    fn finish(self) -> Vec<Node<S::Value>> {
        let mut nodes = Vec::with_capacity(self.len);
        for block in self.blocks {
            nodes.extend(block);
        }
        debug_assert_eq!(nodes.len(), self.len);
        nodes
    }
}
