// src/collector.rs

//! Proxy collector.
//!
//! The collector is the piece callers hold on to: it owns one cache and
//! one bucket per source, refreshes stale sources before every read, and
//! applies the persistent filter and denylist to whatever the buckets
//! currently hold. All methods take `&self`; a collector is shared across
//! tasks behind an `Arc`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use futures::future;
use parking_lot::Mutex;

use crate::error::{AppError, Result};
use crate::models::{CollectorConfig, Proxy, ProxyEndpoint};
use crate::registry::SourceRegistry;
use crate::store::{BucketId, FilterOptions, ProxyFilter, ProxyStore, SourceCache};

/// Construction options for a [`Collector`].
///
/// At least one of `source_types` or `sources` must name something; types
/// are resolved to their member sources through the registry and the two
/// sets are unioned.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Source type groups to collect from (http, socks5, ...)
    pub source_types: Vec<String>,

    /// Individual sources to collect from
    pub sources: Vec<String>,

    /// Minimum interval between refreshes of one source
    pub refresh_interval: Duration,

    /// Optional upper bound on one source fetch
    pub fetch_timeout: Option<Duration>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            source_types: Vec::new(),
            sources: Vec::new(),
            refresh_interval: Duration::from_secs(3600),
            fetch_timeout: None,
        }
    }
}

impl CollectorOptions {
    /// Collect from the named type groups.
    pub fn for_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source_types: types.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Collect from the named individual sources.
    pub fn for_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Options from the `[collector]` section of a config file.
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self {
            source_types: config.source_types.clone(),
            sources: config.sources.clone(),
            refresh_interval: config.refresh_interval(),
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

struct SourceSlot {
    cache: SourceCache,
    bucket: BucketId,
}

/// Aggregates proxies from a group of sources and serves filtered picks.
pub struct Collector {
    store: ProxyStore,
    sources: HashMap<String, SourceSlot>,
    filter: Mutex<ProxyFilter>,
    default_filter: ProxyFilter,
    denylist: Mutex<HashSet<ProxyEndpoint>>,
}

impl Collector {
    /// Build a collector over sources resolved from the registry.
    ///
    /// Fails with [`AppError::Config`] when neither sources nor types are
    /// given, or when any requested name is unknown to the registry.
    pub fn new(registry: &SourceRegistry, options: CollectorOptions) -> Result<Self> {
        if options.source_types.is_empty() && options.sources.is_empty() {
            return Err(AppError::config("no source or source type given"));
        }

        let mut resolved = BTreeSet::new();
        for type_name in &options.source_types {
            let members = registry.sources_for_type(type_name).ok_or_else(|| {
                AppError::config(format!("{type_name} is not a defined source type"))
            })?;
            resolved.extend(members.iter().cloned());
        }
        for name in &options.sources {
            if !registry.contains_source(name) {
                return Err(AppError::config(format!("{name} is not a defined source")));
            }
            resolved.insert(name.clone());
        }

        let default_filter = if options.source_types.is_empty() {
            ProxyFilter::empty()
        } else {
            ProxyFilter::for_protocols(options.source_types.iter().cloned())
        };

        let store = ProxyStore::new();
        let mut sources = HashMap::new();
        for name in resolved {
            let fetcher = registry
                .fetcher(&name)
                .ok_or_else(|| AppError::config(format!("{name} is not a defined source")))?;
            let mut cache = SourceCache::new(&name, fetcher, options.refresh_interval);
            if let Some(timeout) = options.fetch_timeout {
                cache = cache.with_fetch_timeout(timeout);
            }
            let bucket = store.create_bucket();
            sources.insert(name, SourceSlot { cache, bucket });
        }

        Ok(Self {
            store,
            sources,
            filter: Mutex::new(default_filter.clone()),
            default_filter,
            denylist: Mutex::new(HashSet::new()),
        })
    }

    /// One random proxy matching the persistent filter plus any per-call
    /// options, refreshing stale sources first.
    ///
    /// Per-call options are merged into a throwaway copy of the filter and
    /// never persisted. `Ok(None)` means no proxy is currently available,
    /// whether because every source is empty, dead, or filtered out.
    pub async fn get(&self, opts: Option<&FilterOptions>) -> Result<Option<Proxy>> {
        let merged = self.merged_filter(opts)?;
        self.refresh_all(false).await;
        let denylist = self.denylist.lock().clone();
        Ok(self.store.select_one(&merged, &denylist))
    }

    /// All matching proxies, unordered. Same semantics as [`get`](Self::get).
    pub async fn get_all(&self, opts: Option<&FilterOptions>) -> Result<Option<Vec<Proxy>>> {
        let merged = self.merged_filter(opts)?;
        self.refresh_all(false).await;
        let denylist = self.denylist.lock().clone();
        Ok(self.store.select_all(&merged, &denylist))
    }

    /// Refresh every source, each gated by its own TTL unless forced.
    ///
    /// Sources fetch concurrently and fail independently; a dead source
    /// keeps its previous bucket. This is the only place buckets are
    /// written.
    pub async fn refresh_all(&self, force: bool) {
        let jobs = self.sources.values().map(|slot| async move {
            if let Some(proxies) = slot.cache.refresh(force).await {
                self.store.replace_bucket(slot.bucket, proxies);
            }
        });
        future::join_all(jobs).await;
    }

    /// Union filter options into the persistent filter.
    ///
    /// Value sets accumulate per key; an unrecognized key rejects the
    /// whole call and leaves the filter unchanged.
    pub fn apply_filter(&self, opts: &FilterOptions) -> Result<()> {
        self.filter.lock().merge_options(opts)
    }

    /// Reset the filter to its construction-time default: the original
    /// source-type set when the collector was built from types, empty
    /// otherwise.
    pub fn clear_filter(&self) {
        *self.filter.lock() = self.default_filter.clone();
    }

    /// Exclude an endpoint from all future picks until undenylisted.
    /// Accepts a `&Proxy` or a `(host, port)` pair.
    pub fn denylist(&self, endpoint: impl Into<ProxyEndpoint>) {
        self.denylist.lock().insert(endpoint.into());
    }

    /// Remove an endpoint from the denylist.
    pub fn undenylist(&self, endpoint: impl Into<ProxyEndpoint>) {
        self.denylist.lock().remove(&endpoint.into());
    }

    /// Drop all denylist entries.
    pub fn clear_denylist(&self) {
        self.denylist.lock().clear();
    }

    /// Remove one proxy from its source's bucket.
    ///
    /// Unlike denylisting, the proxy may come back on the next refresh.
    /// Fails with [`AppError::InvalidSource`] when the proxy's source is
    /// not one this collector owns.
    pub fn remove_proxy(&self, proxy: &Proxy) -> Result<()> {
        let slot = self
            .sources
            .get(&proxy.source)
            .ok_or_else(|| AppError::invalid_source(&proxy.source))?;
        self.store.remove_proxy(slot.bucket, proxy);
        Ok(())
    }

    /// The source names this collector owns, sorted.
    pub fn source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn merged_filter(&self, opts: Option<&FilterOptions>) -> Result<ProxyFilter> {
        let mut merged = self.filter.lock().clone();
        if let Some(opts) = opts {
            merged.merge_options(opts)?;
        }
        Ok(merged)
    }
}
