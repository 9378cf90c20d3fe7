//! Key/value providers used to seed construction.
//!
//! A [`Source`] only has to enumerate its keys and answer point lookups for
//! them. The trie never keeps a reference to the source once it is built.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Anything that can supply the keys and values a map is built from.
///
/// Implementations must not report the same key twice and `get` must answer
/// for every key reported by `append_keys`.
pub trait Source {
    /// Key type; it is walked through its raw bytes.
    type Key: AsRef<[u8]>;
    /// Value stored at each key.
    type Value;

    /// Append every key to `keys`, in any order.
    fn append_keys(&self, keys: &mut Vec<Self::Key>);

    /// Value for `key`. Always returns something, even for keys that were
    /// never reported.
    fn get(&self, key: &Self::Key) -> Self::Value;
}

impl<'a, K, V, S> Source for &'a HashMap<K, V, S>
where
    K: AsRef<[u8]> + Eq + Hash,
    V: Clone + Default,
    S: BuildHasher,
{
    type Key = &'a K;
    type Value = V;

    fn append_keys(&self, keys: &mut Vec<&'a K>) {
        keys.reserve(self.len());
        keys.extend(self.keys());
    }

    fn get(&self, key: &&'a K) -> V {
        HashMap::get(*self, *key).cloned().unwrap_or_default()
    }
}

impl<'a, K, V> Source for &'a BTreeMap<K, V>
where
    K: AsRef<[u8]> + Ord,
    V: Clone + Default,
{
    type Key = &'a K;
    type Value = V;

    fn append_keys(&self, keys: &mut Vec<&'a K>) {
        keys.reserve(self.len());
        keys.extend(self.keys());
    }

    fn get(&self, key: &&'a K) -> V {
        BTreeMap::get(*self, *key).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_map_source() {
        let mut m: HashMap<String, u32> = HashMap::new();
        m.insert("a".to_string(), 1);
        m.insert("bc".to_string(), 2);

        let src = &m;
        let mut keys = Vec::new();
        src.append_keys(&mut keys);
        keys.sort();
        assert_eq!(keys, vec![&"a".to_string(), &"bc".to_string()]);
        assert_eq!(Source::get(&src, &keys[1]), 2);
    }

    #[test]
    fn test_append_keeps_existing() {
        let m: BTreeMap<&str, u8> = [("x", 1), ("y", 2)].into_iter().collect();
        let other = "w";
        let mut keys = vec![&other];
        (&m).append_keys(&mut keys);
        assert_eq!(keys, vec![&"w", &"x", &"y"]);
    }

    #[test]
    fn test_missing_key_is_default() {
        let m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
        let missing = b"nope".to_vec();
        assert_eq!(Source::get(&&m, &&missing), 0);
    }
}
