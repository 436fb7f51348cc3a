//! The pluggable primary-key index.
//!
//! A table is agnostic to the backing structure behind its index: the
//! [`KeyIndex`] trait is the whole contract, and [`IndexStrategy`] is the
//! capability parameter a caller passes into table construction to choose
//! a backing (or to disable indexing altogether).

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::{key::Key, table::Tuple};

/// Which backing structure a table's index uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IndexStrategy {
    /// No index: keyed selects report
    /// [`Error::IndexUnavailable`](crate::Error::IndexUnavailable) and
    /// index joins cannot probe.
    None,
    /// Ordered tree map: O(log n) lookups, entries iterate in key order.
    BTree,
    /// Hash map: O(1) amortized lookups, no iteration order.
    Hash,
    /// Linear-hashing map: O(1) amortized lookups with incremental
    /// resizing, so no full-table rehash spikes.
    #[default]
    LinHash,
}

impl IndexStrategy {
    pub(crate) fn make(self) -> Option<Box<dyn KeyIndex>> {
        match self {
            IndexStrategy::None => None,
            IndexStrategy::BTree => Some(Box::new(BTreeIndex::new())),
            IndexStrategy::Hash => Some(Box::new(HashIndex::new())),
            IndexStrategy::LinHash => Some(Box::new(LinHashIndex::new())),
        }
    }
}

/// The get/put contract every index backing implements.
pub trait KeyIndex: std::fmt::Debug {
    /// Look up the tuple stored under `key`, if any.
    fn get(&self, key: &Key) -> Option<&Tuple>;

    /// Store `tuple` under `key`, returning the tuple it displaced if the
    /// key was already present.
    fn put(&mut self, key: Key, tuple: Tuple) -> Option<Tuple>;

    /// Number of distinct keys stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, cloned out for diagnostics. Only the ordered backing
    /// guarantees an iteration order (ascending by key).
    fn entries(&self) -> Vec<(Key, Tuple)>;
}

/// Ordered backing on [`BTreeMap`].
#[derive(Debug, Default)]
pub struct BTreeIndex {
    map: BTreeMap<Key, Tuple>,
}

impl BTreeIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyIndex for BTreeIndex {
    fn get(&self, key: &Key) -> Option<&Tuple> {
        self.map.get(key)
    }

    fn put(&mut self, key: Key, tuple: Tuple) -> Option<Tuple> {
        self.map.insert(key, tuple)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn entries(&self) -> Vec<(Key, Tuple)> {
        self.map
            .iter()
            .map(|(k, t)| (k.clone(), t.clone()))
            .collect()
    }
}

/// Hash backing on [`hashbrown::HashMap`].
#[derive(Debug, Default)]
pub struct HashIndex {
    map: hashbrown::HashMap<Key, Tuple>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyIndex for HashIndex {
    fn get(&self, key: &Key) -> Option<&Tuple> {
        self.map.get(key)
    }

    fn put(&mut self, key: Key, tuple: Tuple) -> Option<Tuple> {
        self.map.insert(key, tuple)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn entries(&self) -> Vec<(Key, Tuple)> {
        self.map
            .iter()
            .map(|(k, t)| (k.clone(), t.clone()))
            .collect()
    }
}

const BUCKET_CAPACITY: usize = 4;
const INITIAL_BUCKETS: usize = 4;

/// Linear-hashing backing.
///
/// The table grows one bucket at a time: when the load factor passes the
/// threshold, only the bucket at the split pointer is rehashed, so an
/// insert never pays for a full-table rehash. Buckets before the split
/// pointer have already been split in the current round and address with
/// the next round's modulus.
#[derive(Debug)]
pub struct LinHashIndex {
    buckets: Vec<Vec<(Key, Tuple)>>,
    /// Next bucket to split in the current round.
    split: usize,
    /// Completed doubling rounds; the round modulus is
    /// `INITIAL_BUCKETS << level`.
    level: u32,
    len: usize,
}

impl Default for LinHashIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LinHashIndex {
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); INITIAL_BUCKETS],
            split: 0,
            level: 0,
            len: 0,
        }
    }

    fn hash(key: &Key) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() as usize
    }

    fn bucket_of(&self, key: &Key) -> usize {
        let h = Self::hash(key);
        let round = INITIAL_BUCKETS << self.level;
        let mut b = h % round;
        if b < self.split {
            // already split this round, use the finer modulus
            b = h % (round << 1);
        }
        b
    }

    fn split_one(&mut self) {
        let next_round = (INITIAL_BUCKETS << self.level) << 1;
        self.buckets.push(Vec::new());
        let drained = std::mem::take(&mut self.buckets[self.split]);
        for (key, tuple) in drained {
            let b = Self::hash(&key) % next_round;
            self.buckets[b].push((key, tuple));
        }
        self.split += 1;
        if self.split == INITIAL_BUCKETS << self.level {
            self.level += 1;
            self.split = 0;
        }
    }

    fn overloaded(&self) -> bool {
        self.len > self.buckets.len() * BUCKET_CAPACITY * 3 / 4
    }
}

impl KeyIndex for LinHashIndex {
    fn get(&self, key: &Key) -> Option<&Tuple> {
        let b = self.bucket_of(key);
        self.buckets[b]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, t)| t)
    }

    fn put(&mut self, key: Key, tuple: Tuple) -> Option<Tuple> {
        let b = self.bucket_of(&key);
        if let Some(slot) = self.buckets[b].iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, tuple));
        }
        self.buckets[b].push((key, tuple));
        self.len += 1;
        if self.overloaded() {
            self.split_one();
        }
        None
    }

    fn len(&self) -> usize {
        self.len
    }

    fn entries(&self) -> Vec<(Key, Tuple)> {
        self.buckets.iter().flatten().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{BTreeIndex, HashIndex, IndexStrategy, KeyIndex, LinHashIndex};
    use crate::{key::Key, table::Tuple, value::Value};

    fn key(i: i64) -> Key {
        Key::new(vec![Value::Int(i)])
    }

    fn tuple(i: i64) -> Tuple {
        Tuple::new(vec![Value::Int(i), Value::from(format!("row{}", i))])
    }

    fn exercise(ix: &mut dyn KeyIndex) {
        for i in 0..200 {
            assert_eq!(ix.put(key(i), tuple(i)), None);
        }
        assert_eq!(ix.len(), 200);

        for i in 0..200 {
            assert_eq!(ix.get(&key(i)), Some(&tuple(i)));
        }
        assert_eq!(ix.get(&key(777)), None);

        // overwriting returns the displaced tuple and keeps len stable
        let displaced = ix.put(key(7), tuple(1007));
        assert_eq!(displaced, Some(tuple(7)));
        assert_eq!(ix.len(), 200);
        assert_eq!(ix.get(&key(7)), Some(&tuple(1007)));

        assert_eq!(ix.entries().len(), 200);
    }

    #[test]
    fn btree_backing() {
        let mut ix = BTreeIndex::new();
        exercise(&mut ix);

        // ordered backing iterates in key order
        let entries = ix.entries();
        for pair in entries.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }

    #[test]
    fn hash_backing() {
        let mut ix = HashIndex::new();
        exercise(&mut ix);
    }

    #[test]
    fn linhash_backing() {
        let mut ix = LinHashIndex::new();
        exercise(&mut ix);
        // growth happened one bucket at a time past the initial allocation
        assert!(ix.buckets.len() > super::INITIAL_BUCKETS);
    }

    #[test]
    fn linhash_addresses_stay_consistent_across_splits() {
        let mut ix = LinHashIndex::new();
        for i in 0..1000 {
            ix.put(key(i), tuple(i));
        }
        for i in 0..1000 {
            assert!(ix.get(&key(i)).is_some(), "lost key {} after splits", i);
        }
    }

    #[test]
    fn strategy_capability() {
        assert!(IndexStrategy::None.make().is_none());
        assert!(IndexStrategy::BTree.make().is_some());
        assert!(IndexStrategy::Hash.make().is_some());
        assert!(IndexStrategy::LinHash.make().is_some());
    }
}
