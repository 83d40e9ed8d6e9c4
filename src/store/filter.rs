// src/store/filter.rs

//! Query-time proxy filtering.
//!
//! A filter is a conjunction across attribute keys of disjunctions across
//! accepted values: a proxy matches when, for every key present in the
//! filter, the proxy's value for that attribute is one of the accepted
//! values. A proxy missing a filtered attribute never matches.

use std::collections::{HashMap, HashSet};

use crate::error::{AppError, Result};
use crate::models::Proxy;

/// The recognized filter attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    /// Two-letter country code (us, ca, ...)
    Code,
    /// Country name (united states, canada, ...)
    Country,
    /// Anonymity flag, matched against "true" / "false"
    Anonymous,
    /// Proxy protocol (http, https, socks4, socks5, ...)
    Protocol,
}

impl FilterKey {
    /// Parse a caller-supplied key name.
    ///
    /// `type` and `protocol` are aliases for the same attribute.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "code" => Ok(Self::Code),
            "country" => Ok(Self::Country),
            "anonymous" => Ok(Self::Anonymous),
            "type" | "protocol" => Ok(Self::Protocol),
            other => Err(AppError::invalid_filter_option(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Country => "country",
            Self::Anonymous => "anonymous",
            Self::Protocol => "type",
        }
    }
}

/// The value a proxy exposes for one filter attribute, if set.
fn attribute<'a>(proxy: &'a Proxy, key: FilterKey) -> Option<&'a str> {
    match key {
        FilterKey::Code => proxy.code.as_deref(),
        FilterKey::Country => proxy.country.as_deref(),
        FilterKey::Anonymous => proxy.anonymous.map(|a| if a { "true" } else { "false" }),
        FilterKey::Protocol => proxy.protocol.as_deref(),
    }
}

/// Caller-facing bag of raw filter options, validated on apply.
///
/// Keys are plain strings so that an unrecognized key is reported as an
/// [`AppError::InvalidFilterOption`] at the point of use rather than a
/// compile error in the caller.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    entries: Vec<(String, Vec<String>)>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add accepted values for a key. Repeated keys accumulate.
    pub fn with<K, V, I>(mut self, key: K, values: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        self.entries.push((
            key.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(String, Vec<String>)] {
        &self.entries
    }
}

/// A validated filter: accepted values per recognized key.
#[derive(Debug, Clone, Default)]
pub struct ProxyFilter {
    accepted: HashMap<FilterKey, HashSet<String>>,
}

impl ProxyFilter {
    /// The filter that matches everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A filter accepting only the given protocols.
    ///
    /// Used as the construction-time default when a collector is built
    /// from source types.
    pub fn for_protocols<I, S>(protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::empty();
        filter
            .accepted
            .insert(FilterKey::Protocol, protocols.into_iter().map(Into::into).collect());
        filter
    }

    /// Build a validated filter from raw options.
    pub fn from_options(opts: &FilterOptions) -> Result<Self> {
        let mut filter = Self::empty();
        filter.merge_options(opts)?;
        Ok(filter)
    }

    /// Union raw options into this filter.
    ///
    /// Validates every key before applying anything: one bad key rejects
    /// the whole call and leaves the filter unchanged.
    pub fn merge_options(&mut self, opts: &FilterOptions) -> Result<()> {
        let mut parsed = Vec::with_capacity(opts.entries().len());
        for (key, values) in opts.entries() {
            parsed.push((FilterKey::parse(key)?, values));
        }

        for (key, values) in parsed {
            self.accepted
                .entry(key)
                .or_default()
                .extend(values.iter().cloned());
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Whether a proxy passes every key of this filter.
    pub fn matches(&self, proxy: &Proxy) -> bool {
        self.accepted.iter().all(|(key, values)| {
            attribute(proxy, *key).is_some_and(|value| values.contains(value))
        })
    }
}
