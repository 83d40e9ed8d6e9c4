// src/registry.rs

//! Source registry.
//!
//! Maps source names to their fetchers and groups sources into named
//! types (http, https, socks4, ...). A registry is an explicit value
//! handed to [`Collector::new`](crate::collector::Collector::new), so
//! tests and embedders can wire their own sources without touching any
//! process-wide state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::store::ProxyFetcher;

/// Named fetchers plus type groupings over them.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn ProxyFetcher>>,
    types: HashMap<String, HashSet<String>>,
}

impl SourceRegistry {
    /// An empty registry with no sources or types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fetcher under a unique name, optionally adding it to
    /// existing type groups.
    pub fn register_source(
        &mut self,
        name: &str,
        fetcher: Arc<dyn ProxyFetcher>,
        types: &[&str],
    ) -> Result<()> {
        if self.sources.contains_key(name) {
            return Err(AppError::SourceAlreadyDefined(name.to_string()));
        }
        for type_name in types {
            if !self.types.contains_key(*type_name) {
                return Err(AppError::InvalidSourceType(type_name.to_string()));
            }
        }

        self.sources.insert(name.to_string(), fetcher);
        for type_name in types {
            if let Some(group) = self.types.get_mut(*type_name) {
                group.insert(name.to_string());
            }
        }
        Ok(())
    }

    /// Register a type group over already-registered sources.
    pub fn register_type(&mut self, name: &str, sources: &[&str]) -> Result<()> {
        if self.types.contains_key(name) {
            return Err(AppError::SourceTypeAlreadyDefined(name.to_string()));
        }
        for source in sources {
            if !self.sources.contains_key(*source) {
                return Err(AppError::InvalidSource(source.to_string()));
            }
        }

        self.types.insert(
            name.to_string(),
            sources.iter().map(|s| s.to_string()).collect(),
        );
        Ok(())
    }

    /// The source names grouped under a type, if the type exists.
    pub fn sources_for_type(&self, type_name: &str) -> Option<&HashSet<String>> {
        self.types.get(type_name)
    }

    /// The fetcher registered under a name, if any.
    pub fn fetcher(&self, name: &str) -> Option<Arc<dyn ProxyFetcher>> {
        self.sources.get(name).cloned()
    }

    pub fn contains_source(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// All registered source names, sorted.
    pub fn source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
