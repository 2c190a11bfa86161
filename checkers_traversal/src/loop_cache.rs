//! Cross-game cache of board hashes known to end in a repetition loop.
//!
//! Sharded the way the teacher engine's `TranspositionTable` buckets its
//! entries, so concurrent lookups (shared lock) and insertions (exclusive
//! lock) scale across shards instead of contending on one table.

use std::collections::HashSet;
use std::sync::RwLock;

/// Fixed shard count, matching the original implementation exactly so shard
/// assignment (and therefore checkpoint layout) is reproducible.
pub const SHARD_COUNT: usize = 64;

/// The 64-bit golden-ratio constant, used to spread board hashes evenly
/// across shards regardless of how clustered the hashes themselves are.
const FIBONACCI_MULTIPLIER: u64 = 0x9E3779B97F4A7C15;

fn shard_index(hash: u64) -> usize {
    (hash.wrapping_mul(FIBONACCI_MULTIPLIER) >> (64 - 6)) as usize
}

#[derive(Debug)]
pub struct LoopCache {
    shards: Vec<RwLock<HashSet<u64>>>,
}

impl LoopCache {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(HashSet::new())).collect(),
        }
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.shards[shard_index(hash)].read().unwrap().contains(&hash)
    }

    pub fn insert(&self, hash: u64) {
        self.shards[shard_index(hash)].write().unwrap().insert(hash);
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().unwrap().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.write().unwrap().clear();
        }
    }

    /// Snapshots every shard's contents, in shard order, for checkpointing.
    pub fn shard_snapshots(&self) -> Vec<Vec<u64>> {
        self.shards
            .iter()
            .map(|shard| shard.read().unwrap().iter().copied().collect())
            .collect()
    }

    /// Replaces every shard's contents from a checkpoint. `shards` must have
    /// exactly `SHARD_COUNT` entries; extra or missing entries are a caller
    /// bug in the checkpoint reader, not a runtime condition to guard here.
    pub fn load_shard_snapshots(&self, shards: Vec<Vec<u64>>) {
        for (shard, hashes) in self.shards.iter().zip(shards) {
            let mut guard = shard.write().unwrap();
            guard.clear();
            guard.extend(hashes);
        }
    }
}

impl Default for LoopCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_then_contains() {
        let cache = LoopCache::new();
        assert!(!cache.contains(12345));
        cache.insert(12345);
        assert!(cache.contains(12345));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn round_trips_through_snapshot() {
        let cache = LoopCache::new();
        for h in [1u64, 2, 3, 1_000_000_007, u64::MAX] {
            cache.insert(h);
        }

        let snapshot = cache.shard_snapshots();
        assert_eq!(snapshot.len(), SHARD_COUNT);

        let restored = LoopCache::new();
        restored.load_shard_snapshots(snapshot);

        for h in [1u64, 2, 3, 1_000_000_007, u64::MAX] {
            assert!(restored.contains(h));
        }
        assert_eq!(restored.len(), cache.len());
    }

    #[test]
    fn shard_index_stays_in_range() {
        for h in [0u64, 1, u64::MAX, 0x9E3779B97F4A7C15] {
            assert!(shard_index(h) < SHARD_COUNT);
        }
    }
}
