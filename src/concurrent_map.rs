use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};

/// Lock-striped map: a fixed number of (mutex, map) shards, with the shard
/// for a key picked by hash modulo. Accesses to different shards never
/// block each other; accesses to the same shard serialize. Used by the
/// parallel ranking path so many workers can bump per-document relevance
/// sums without one global lock.
#[derive(Debug)]
pub struct ConcurrentMap<K, V> {
    shards: Vec<Mutex<HashMap<K, V>>>,
    hasher: RandomState,
}

impl<K: Hash + Eq, V: Default> ConcurrentMap<K, V> {
    /// `shard_count` is fixed for the lifetime of the map
    pub fn new(shard_count: usize) -> Self {
        assert!(shard_count > 0, "shard count must be positive");
        Self {
            shards: (0..shard_count).map(|_| Mutex::new(HashMap::new())).collect(),
            hasher: RandomState::new(),
        }
    }

    fn shard_for(&self, key: &K) -> usize {
        let mut state = self.hasher.build_hasher();
        key.hash(&mut state);
        (state.finish() % self.shards.len() as u64) as usize
    }

    /// Lock one shard and return the value under `key`, inserting the
    /// default if absent. The shard stays locked for exactly the lifetime
    /// of the returned guard.
    pub fn access(&self, key: K) -> MappedMutexGuard<'_, V> {
        let guard = self.shards[self.shard_for(&key)].lock();
        MutexGuard::map(guard, |shard| shard.entry(key).or_default())
    }

    /// Drop `key` from its shard; other shards are untouched
    pub fn erase(&self, key: &K) {
        self.shards[self.shard_for(key)].lock().remove(key);
    }

    /// Merge every shard into one ordinary map. Taking `self` by value
    /// means every producer has been joined before the merge can start.
    pub fn into_map(self) -> HashMap<K, V> {
        let mut merged = HashMap::new();
        for shard in self.shards {
            merged.extend(shard.into_inner());
        }
        merged
    }
}
