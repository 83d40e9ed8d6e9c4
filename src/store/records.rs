// src/store/records.rs

//! Per-source proxy buckets and filtered queries over their union.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rand::seq::SliceRandom;

use crate::models::{Proxy, ProxyEndpoint};
use crate::store::filter::ProxyFilter;

/// Opaque, stable identifier of one source's bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketId(u64);

/// Owns one bucket of proxies per source and answers filtered queries
/// over the union of all buckets.
///
/// Buckets are replaced wholesale, never merged incrementally; each bucket
/// carries its own lock so replacing one source never blocks queries from
/// assembling the others.
pub struct ProxyStore {
    buckets: RwLock<HashMap<BucketId, Arc<RwLock<HashSet<Proxy>>>>>,
    next_id: AtomicU64,
}

impl ProxyStore {
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Allocate a fresh, empty bucket.
    pub fn create_bucket(&self) -> BucketId {
        let id = BucketId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.buckets
            .write()
            .insert(id, Arc::new(RwLock::new(HashSet::new())));
        id
    }

    /// Atomically replace a bucket's contents. An empty set clears it.
    /// Unknown ids are ignored.
    pub fn replace_bucket(&self, id: BucketId, proxies: HashSet<Proxy>) {
        if let Some(bucket) = self.bucket(id) {
            *bucket.write() = proxies;
        }
    }

    /// Discard one proxy from one bucket. Absent proxies and unknown
    /// buckets are ignored.
    pub fn remove_proxy(&self, id: BucketId, proxy: &Proxy) {
        if let Some(bucket) = self.bucket(id) {
            bucket.write().remove(proxy);
        }
    }

    /// One uniformly random proxy among the matches, or `None` when
    /// nothing matches.
    pub fn select_one(
        &self,
        filter: &ProxyFilter,
        denylist: &HashSet<ProxyEndpoint>,
    ) -> Option<Proxy> {
        let matches = self.select_all(filter, denylist)?;
        matches.choose(&mut rand::thread_rng()).cloned()
    }

    /// All matching proxies, unordered, or `None` when nothing matches.
    ///
    /// An empty store and a store whose contents are all filtered out are
    /// reported identically.
    pub fn select_all(
        &self,
        filter: &ProxyFilter,
        denylist: &HashSet<ProxyEndpoint>,
    ) -> Option<Vec<Proxy>> {
        // Snapshot the bucket handles, then read each bucket on its own
        // lock; the union dedups full-tuple duplicates across sources.
        let handles: Vec<_> = self.buckets.read().values().cloned().collect();

        let mut merged: HashSet<Proxy> = HashSet::new();
        for bucket in handles {
            merged.extend(bucket.read().iter().cloned());
        }

        let matches: Vec<Proxy> = merged
            .into_iter()
            .filter(|p| filter.matches(p) && !denylist.contains(&p.endpoint()))
            .collect();

        if matches.is_empty() { None } else { Some(matches) }
    }

    fn bucket(&self, id: BucketId) -> Option<Arc<RwLock<HashSet<Proxy>>>> {
        self.buckets.read().get(&id).cloned()
    }
}

impl Default for ProxyStore {
    fn default() -> Self {
        Self::new()
    }
}
