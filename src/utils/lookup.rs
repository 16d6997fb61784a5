// src/utils/lookup.rs

//! Bulk-fetch helpers: after one query for a set of keys, build an index so
//! every per-key lookup afterwards is O(1).

use std::{collections::HashMap, hash::Hash};

/// Indexes rows by a unique key. Later rows win on duplicate keys.
pub fn index_by<K, V, F>(rows: impl IntoIterator<Item = V>, key: F) -> HashMap<K, V>
where
    K: Eq + Hash,
    F: Fn(&V) -> K,
{
    rows.into_iter().map(|row| (key(&row), row)).collect()
}

/// Groups rows by a shared key, preserving the input order inside each group.
pub fn group_by<K, V, F>(rows: impl IntoIterator<Item = V>, key: F) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash,
    F: Fn(&V) -> K,
{
    let mut groups: HashMap<K, Vec<V>> = HashMap::new();
    for row in rows {
        groups.entry(key(&row)).or_default().push(row);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_by_maps_each_key() {
        let index = index_by(vec![(1, "a"), (2, "b")], |row| row.0);
        assert_eq!(index.get(&1), Some(&(1, "a")));
        assert_eq!(index.get(&2), Some(&(2, "b")));
        assert!(index.get(&3).is_none());
    }

    #[test]
    fn group_by_keeps_order_within_group() {
        let groups = group_by(vec![(1, "a"), (2, "b"), (1, "c")], |row| row.0);
        assert_eq!(groups[&1], vec![(1, "a"), (1, "c")]);
        assert_eq!(groups[&2], vec![(2, "b")]);
    }
}
