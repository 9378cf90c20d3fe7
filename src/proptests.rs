use super::*;

use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::BTreeMap;

/// Check every structural invariant of a freshly built node array.
fn validate_map<V>(m: &FastStringMap<V>) {
    let nodes = m.nodes();
    assert!(!nodes.is_empty(), "root must exist");

    let mut owners = vec![0usize; nodes.len()];
    owners[0] = 1;
    for (i, n) in nodes.iter().enumerate() {
        if n.child_count() == 0 {
            continue;
        }
        let base = n.child_base() as usize;
        let count = usize::from(n.child_count());
        assert!(base > i, "child range of {i} must follow it");
        assert!(base + count <= nodes.len(), "child range of {i} out of bounds");
        assert!(
            usize::from(n.child_offset()) + count <= node::MAX_CHILDREN,
            "child range of {i} exceeds byte range"
        );
        // Both ends of a reserved range are real continuations.
        let first = &nodes[base];
        let last = &nodes[base + count - 1];
        assert!(first.is_terminal() || first.child_count() > 0);
        assert!(last.is_terminal() || last.child_count() > 0);
        for owner in &mut owners[base..base + count] {
            *owner += 1;
        }
    }
    assert!(owners.iter().all(|&o| o == 1), "every node has exactly one parent");

    let terminals = nodes.iter().filter(|n| n.is_terminal()).count();
    assert_eq!(terminals, m.len(), "terminal count must match len");
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // Small alphabet with both extremes so prefixes and wide spans both occur.
    let byte = prop_oneof![
        4 => b'a'..=b'd',
        1 => Just(0u8),
        1 => Just(0xffu8),
        1 => any::<u8>(),
    ];
    prop::collection::vec(byte, 0..=12)
}

fn source_strategy() -> impl Strategy<Value = BTreeMap<Vec<u8>, u64>> {
    prop::collection::btree_map(key_strategy(), any::<u64>(), 0..=300)
}

/// A query derived either from a stored key or made up from scratch.
#[derive(Clone, Debug)]
enum Query {
    Stored(Index),
    Extended(Index, u8),
    Truncated(Index, Index),
    Random(Vec<u8>),
}

fn query_strategy() -> impl Strategy<Value = Query> {
    prop_oneof![
        any::<Index>().prop_map(Query::Stored),
        (any::<Index>(), any::<u8>()).prop_map(|(i, b)| Query::Extended(i, b)),
        (any::<Index>(), any::<Index>()).prop_map(|(i, at)| Query::Truncated(i, at)),
        key_strategy().prop_map(Query::Random),
    ]
}

impl Query {
    fn key(&self, stored: &[&Vec<u8>]) -> Vec<u8> {
        if stored.is_empty() {
            return match self {
                Query::Random(k) => k.clone(),
                _ => Vec::new(),
            };
        }
        match self {
            Query::Stored(i) => i.get(stored).to_vec(),
            Query::Extended(i, b) => {
                let mut k = i.get(stored).to_vec();
                k.push(*b);
                k
            }
            Query::Truncated(i, at) => {
                let k = i.get(stored);
                k[..at.index(k.len() + 1)].to_vec()
            }
            Query::Random(k) => k.clone(),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(src in source_strategy(), queries in prop::collection::vec(query_strategy(), 0..=200)) {
        let flat = FastStringMap::new(&src);
        let ptr = flat.to_pointer_map();
        validate_map(&flat);
        prop_assert_eq!(flat.len(), src.len());

        for (k, v) in &src {
            prop_assert_eq!(flat.get(k), Some(v));
            prop_assert_eq!(ptr.get(k), Some(v));
        }

        let stored: Vec<&Vec<u8>> = src.keys().collect();
        for query in &queries {
            let key = query.key(&stored);
            let expected = src.get(&key);
            prop_assert_eq!(flat.get(&key), expected);
            prop_assert_eq!(ptr.get(&key), expected);
            prop_assert_eq!(flat.lookup_bytes(&key), ptr.lookup_bytes(&key));
        }

        let keys: Vec<Vec<u8>> = src.keys().cloned().collect();
        prop_assert_eq!(flat.sorted_keys(), keys);
        let pairs: Vec<(Vec<u8>, u64)> = flat.iter().map(|(k, v)| (k, *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = src.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(pairs, expected);

        prop_assert_eq!(ptr.dump().to_string(), flat.dump().to_string());
    }

    #[test]
    fn prop_text_and_bytes_agree(src in prop::collection::btree_map("[a-cß€]{0,6}", any::<u32>(), 0..=100), query in "[a-cß€]{0,7}") {
        let m = FastStringMap::new(&src);
        prop_assert_eq!(m.lookup_str(&query), m.lookup_bytes(query.as_bytes()));
        prop_assert_eq!(m.get(&query), src.get(&query));
    }

    #[test]
    fn prop_block_size_does_not_change_layout(src in source_strategy(), first in 1usize..64, max in 0usize..1024) {
        let reference = FastStringMap::new(&src);
        let tuned = FastStringMap::with_config(&src, &BuildConfig {
            max_block_len: max,
            first_block_len: Some(first),
        });
        prop_assert_eq!(tuned.nodes(), reference.nodes());
    }

    #[test]
    fn prop_from_nodes_accepts_built(src in source_strategy()) {
        let m = FastStringMap::new(&src);
        let again = FastStringMap::from_nodes(m.nodes().to_vec());
        prop_assert_eq!(again, Ok(m));
    }
}

fn for_each_subset<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    for mask in 0u32..(1 << items.len()) {
        let subset = items
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, item)| item.clone())
            .collect();
        f(subset);
    }
}

#[test]
fn exhaustive_subsets_small_set() {
    let keys: Vec<Vec<u8>> = vec![
        b"".to_vec(),
        b"a".to_vec(),
        b"b".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        vec![0x00],
        vec![0xff, 0x00],
        vec![0xff],
    ];
    let all: Vec<Vec<u8>> = keys
        .iter()
        .cloned()
        .chain([b"c".to_vec(), b"aaa".to_vec(), vec![0x00, 0x00]])
        .collect();

    for_each_subset(&keys, |subset| {
        let src: BTreeMap<Vec<u8>, u64> = subset
            .into_iter()
            .enumerate()
            .map(|(i, k)| (k, i as u64 + 1))
            .collect();
        let flat = FastStringMap::new(&src);
        let ptr = flat.to_pointer_map();
        validate_map(&flat);

        for k in &all {
            assert_eq!(flat.get(k), src.get(k), "{k:?}");
            assert_eq!(ptr.get(k), src.get(k), "{k:?}");
        }
        let expected: Vec<Vec<u8>> = src.keys().cloned().collect();
        assert_eq!(flat.sorted_keys(), expected);
    });
}
