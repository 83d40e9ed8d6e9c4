// src/sources/mod.rs

//! Built-in proxy sources.
//!
//! Each source fetches one public listing and parses it into a set of
//! proxies. The collector core never sees any of this; it only consumes
//! the [`ProxyFetcher`](crate::store::ProxyFetcher) contract.

mod free_proxy_list;
mod proxy_daily;
mod proxyscrape_api;

pub use free_proxy_list::ProxyTableSource;
pub use proxy_daily::{ProxyDailySection, ProxyDailySource};
pub use proxyscrape_api::{ProxyscrapeApiOptions, ProxyscrapeApiSource};

use std::sync::Arc;

use reqwest::Client;

use crate::error::Result;
use crate::registry::SourceRegistry;

/// A registry wired with all built-in sources and the standard type
/// groups (`http`, `https`, `socks4`, `socks5`).
pub fn default_registry(client: Client) -> Result<SourceRegistry> {
    let mut registry = SourceRegistry::new();

    registry.register_source(
        "anonymous-proxy",
        Arc::new(ProxyTableSource::anonymous(client.clone())),
        &[],
    )?;
    registry.register_source(
        "free-proxy-list",
        Arc::new(ProxyTableSource::free_proxy_list(client.clone())),
        &[],
    )?;
    registry.register_source(
        "uk-proxy",
        Arc::new(ProxyTableSource::uk(client.clone())),
        &[],
    )?;
    registry.register_source(
        "us-proxy",
        Arc::new(ProxyTableSource::us(client.clone())),
        &[],
    )?;
    registry.register_source(
        "ssl-proxy",
        Arc::new(ProxyTableSource::ssl(client.clone())),
        &[],
    )?;
    registry.register_source(
        "socks-proxy",
        Arc::new(ProxyTableSource::socks(client.clone())),
        &[],
    )?;
    registry.register_source(
        "proxy-daily-http",
        Arc::new(ProxyDailySource::new(client.clone(), ProxyDailySection::Http)),
        &[],
    )?;
    registry.register_source(
        "proxy-daily-socks4",
        Arc::new(ProxyDailySource::new(
            client.clone(),
            ProxyDailySection::Socks4,
        )),
        &[],
    )?;
    registry.register_source(
        "proxy-daily-socks5",
        Arc::new(ProxyDailySource::new(client, ProxyDailySection::Socks5)),
        &[],
    )?;

    registry.register_type(
        "http",
        &[
            "us-proxy",
            "uk-proxy",
            "free-proxy-list",
            "proxy-daily-http",
            "anonymous-proxy",
        ],
    )?;
    registry.register_type(
        "https",
        &[
            "us-proxy",
            "uk-proxy",
            "free-proxy-list",
            "ssl-proxy",
            "anonymous-proxy",
        ],
    )?;
    registry.register_type("socks4", &["socks-proxy", "proxy-daily-socks4"])?;
    registry.register_type("socks5", &["socks-proxy", "proxy-daily-socks5"])?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_wires_all_sources_and_types() {
        let registry = default_registry(Client::new()).unwrap();
        assert_eq!(registry.source_names().len(), 9);
        assert_eq!(
            registry.type_names(),
            vec!["http", "https", "socks4", "socks5"]
        );
        assert_eq!(registry.sources_for_type("http").unwrap().len(), 5);
        assert_eq!(registry.sources_for_type("socks5").unwrap().len(), 2);
    }
}
