// src/store/mod.rs

//! Caching and query engine: per-source refresh gating, bucketed storage,
//! and query-time filtering.

mod filter;
mod records;
mod source_cache;

pub use filter::{FilterKey, FilterOptions, ProxyFilter};
pub use records::{BucketId, ProxyStore};
pub use source_cache::{ProxyFetcher, SourceCache};
