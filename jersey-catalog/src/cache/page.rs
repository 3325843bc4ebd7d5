//! Memo of recently served catalog pages
//!
//! Memory only, short-lived, bounded. Once the memo holds more than its
//! capacity the oldest inserted page is dropped; there is no recency
//! tracking on reads.

use crate::cache::entry::CacheEntry;
use crate::cache::types::CacheKey;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::debug;

/// Bounded FIFO of page results keyed by normalized query
#[derive(Debug)]
pub struct PageMemo {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry>,

    /// Insertion order, oldest first
    order: VecDeque<CacheKey>,

    capacity: usize,
    ttl: Duration,
}

impl PageMemo {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            ttl,
        }
    }

    /// Look up a page younger than the TTL. Expired pages are dropped.
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        let expired = match self.entries.get(key) {
            Some(entry) => !entry.is_fresh(self.ttl),
            None => return None,
        };

        if expired {
            debug!("Page memo entry expired: {}", key);
            self.remove(key);
            return None;
        }

        self.entries.get(key)
    }

    /// Insert a page, returning how many older pages were evicted
    pub fn insert(&mut self, entry: CacheEntry) -> usize {
        let key = entry.key.clone();
        if self.entries.insert(key.clone(), entry).is_some() {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    debug!("Evicting page memo entry due to capacity: {}", oldest);
                    self.entries.remove(&oldest);
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }

    /// Remove a page
    pub fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    /// Drop every page whose key matches, returning the dropped keys
    pub fn remove_where<P: Fn(&str) -> bool>(&mut self, predicate: P) -> Vec<CacheKey> {
        let doomed: Vec<CacheKey> = self
            .order
            .iter()
            .filter(|k| predicate(k.as_str()))
            .cloned()
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
