//! Direct-mapped operation cache with adaptive sizing.
//!
//! Each key hashes to exactly one slot; collisions overwrite the previous entry.
//! Lookups are counted in epochs of `capacity` lookups. At the end of an epoch
//! the cache doubles itself as long as the hit rate keeps improving after the
//! previous doubling, up to `2^max_bits` slots. Once a doubling does not pay
//! off, the size is frozen.

use log::debug;

use crate::utils::MyHash;

pub struct Cache<K, V> {
    entries: Vec<Option<(K, V)>>,
    bits: usize,
    max_bits: usize,
    bitmask: u64,
    hits: usize,
    misses: usize,
    faults: usize,
    epoch_lookups: usize,
    epoch_hits: usize,
    last_rate: Option<f64>,
    growing: bool,
}

impl<K, V> Cache<K, V> {
    /// Creates a new cache with `2^bits` slots that may grow up to `2^max_bits`.
    pub fn new(bits: usize, max_bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits must be in range 0..=31, got {}", bits);
        assert!(bits <= max_bits, "Initial cache bits {} exceed maximum {}", bits, max_bits);

        let size = 1usize << bits;
        Self {
            entries: (0..size).map(|_| None).collect(),
            bits,
            max_bits: max_bits.min(31),
            bitmask: (size - 1) as u64,
            hits: 0,
            misses: 0,
            faults: 0,
            epoch_lookups: 0,
            epoch_hits: 0,
            last_rate: None,
            growing: bits < max_bits,
        }
    }

    /// Returns the number of slots in the cache.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Returns the number of misses caused by a slot holding a different key.
    pub fn faults(&self) -> usize {
        self.faults
    }

    /// Drops all entries. The size and the counters are kept.
    pub fn clear(&mut self) {
        self.entries.fill_with(|| None);
    }
}

impl<K, V> Cache<K, V>
where
    K: MyHash + Eq + Copy,
    V: Copy,
{
    #[inline]
    fn index(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    /// Looks up a key in the cache.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let idx = self.index(key);
        let result = match &self.entries[idx] {
            Some((k, v)) if k == key => {
                self.hits += 1;
                self.epoch_hits += 1;
                Some(*v)
            }
            Some(_) => {
                self.faults += 1;
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        };
        self.epoch_lookups += 1;
        if self.epoch_lookups >= self.entries.len() {
            self.end_epoch();
        }
        result
    }

    /// Inserts a key-value pair, overwriting any entry in the same slot.
    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.index(&key);
        self.entries[idx] = Some((key, value));
    }

    fn end_epoch(&mut self) {
        let rate = self.epoch_hits as f64 / self.epoch_lookups as f64;
        self.epoch_lookups = 0;
        self.epoch_hits = 0;
        if !self.growing {
            return;
        }
        match self.last_rate {
            Some(last) if rate <= last => {
                debug!("cache: hit rate {:.3} did not improve over {:.3}, freezing at 2^{}", rate, last, self.bits);
                self.growing = false;
            }
            _ => {
                self.last_rate = Some(rate);
                self.resize(self.bits + 1);
                if self.bits >= self.max_bits {
                    self.growing = false;
                }
            }
        }
    }

    fn resize(&mut self, bits: usize) {
        debug!("cache: resizing from 2^{} to 2^{}", self.bits, bits);
        let size = 1usize << bits;
        let old = std::mem::replace(&mut self.entries, (0..size).map(|_| None).collect());
        self.bits = bits;
        self.bitmask = (size - 1) as u64;
        for (k, v) in old.into_iter().flatten() {
            let idx = self.index(&k);
            self.entries[idx] = Some((k, v));
        }
    }
}
