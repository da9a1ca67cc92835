use alloy_primitives::Address;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache key for a factory pair lookup. Token order is normalized so (A, B) and (B, A) share an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub factory: Address,
    pub token_lo: Address,
    pub token_hi: Address,
}

impl PairKey {
    pub fn new(factory: Address, token_a: Address, token_b: Address) -> Self {
        let (token_lo, token_hi) = if token_a <= token_b { (token_a, token_b) } else { (token_b, token_a) };
        Self { factory, token_lo, token_hi }
    }
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub inserts: AtomicU64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 { 0.0 } else { hits as f64 / total as f64 }
    }
}

/// Read-through cache of factory `getPair` answers, shared by concurrent scans.
///
/// Entries are never evicted: a pair address does not change once created, and a
/// zero address records "no pool". Stale reserves are filtered elsewhere.
#[derive(Debug, Default)]
pub struct PairCache {
    pairs: DashMap<PairKey, Address>,
    pub stats: CacheStats,
}

impl PairCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PairKey) -> Option<Address> {
        match self.pairs.get(key) {
            Some(entry) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(*entry)
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert if absent. Concurrent inserts for the same key are idempotent.
    pub fn insert(&self, key: PairKey, pool: Address) {
        self.pairs.entry(key).or_insert_with(|| {
            self.stats.inserts.fetch_add(1, Ordering::Relaxed);
            pool
        });
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
