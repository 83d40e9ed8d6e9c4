// src/sources/proxyscrape_api.rs

//! Source backed by the proxyscrape.com download API.
//!
//! Unlike the HTML listings, this API takes its filters as query
//! parameters and answers with bare `host:port` lines, so the proxy
//! metadata is derived from the request parameters themselves.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, FetchError, FetchResult, Result};
use crate::models::Proxy;
use crate::store::ProxyFetcher;
use crate::utils::http::fetch_text;

const API_URL: &str = "https://api.proxyscrape.com";

/// Query parameters for the download API. `"all"` leaves a dimension
/// unconstrained.
#[derive(Debug, Clone)]
pub struct ProxyscrapeApiOptions {
    /// One of `http`, `socks4`, `socks5`, `all`
    pub proxy_type: String,

    /// Maximum response time of returned proxies, in milliseconds
    pub timeout_ms: u32,

    /// One of `yes`, `no`, `all`
    pub ssl: String,

    /// One of `elite`, `anonymous`, `transparent`, `all`
    pub anonymity: String,

    /// Alpha-2 ISO country code, or `all`
    pub country: String,
}

impl Default for ProxyscrapeApiOptions {
    fn default() -> Self {
        Self {
            proxy_type: "all".into(),
            timeout_ms: 10_000,
            ssl: "all".into(),
            anonymity: "all".into(),
            country: "all".into(),
        }
    }
}

/// A parameterized proxyscrape.com API source.
pub struct ProxyscrapeApiSource {
    client: Client,
    name: String,
    url: Url,
    code: Option<String>,
    anonymous: bool,
    protocol: Option<String>,
}

impl ProxyscrapeApiSource {
    /// Validate the options and build the source.
    ///
    /// The source name is derived from the parameters, so differently
    /// parameterized sources register under different names.
    pub fn new(client: Client, options: ProxyscrapeApiOptions) -> Result<Self> {
        let proxy_type = options.proxy_type.to_lowercase();
        let ssl = options.ssl.to_lowercase();
        let anonymity = options.anonymity.to_lowercase();
        let country = options.country.to_lowercase();

        if !matches!(proxy_type.as_str(), "http" | "socks4" | "socks5" | "all") {
            return Err(AppError::config(format!(
                "proxytype {proxy_type} is not valid"
            )));
        }
        if options.timeout_ms == 0 {
            return Err(AppError::config("timeout must be greater than 0"));
        }
        if !matches!(ssl.as_str(), "yes" | "no" | "all") {
            return Err(AppError::config(format!("ssl {ssl} is not valid")));
        }
        if !matches!(
            anonymity.as_str(),
            "elite" | "anonymous" | "transparent" | "all"
        ) {
            return Err(AppError::config(format!(
                "anonymity {anonymity} is not valid"
            )));
        }
        if country != "all" && country.len() != 2 {
            return Err(AppError::config(format!("country {country} is not valid")));
        }

        let name = format!(
            "proxyscrape|proxytype={proxy_type}|timeout={}|ssl={ssl}|anonymity={anonymity}|country={country}",
            options.timeout_ms
        );
        let timeout = options.timeout_ms.to_string();
        let url = Url::parse_with_params(
            API_URL,
            &[
                ("request", "getproxies"),
                ("proxytype", proxy_type.as_str()),
                ("timeout", timeout.as_str()),
                ("ssl", ssl.as_str()),
                ("anonymity", anonymity.as_str()),
                ("country", country.as_str()),
            ],
        )?;

        Ok(Self {
            client,
            name,
            url,
            code: (country != "all").then_some(country),
            anonymous: matches!(anonymity.as_str(), "elite" | "anonymous"),
            protocol: (proxy_type != "all").then_some(proxy_type),
        })
    }

    /// The derived source name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, body: &str) -> FetchResult<HashSet<Proxy>> {
        let mut proxies = HashSet::new();
        for token in body.split_whitespace() {
            let (host, port) = token.split_once(':').ok_or_else(|| {
                FetchError::malformed(format!("proxyscrape: unexpected line {token:?}"))
            })?;

            let mut proxy = Proxy::new(host, port, &self.name);
            proxy.code = self.code.clone();
            proxy.anonymous = Some(self.anonymous);
            proxy.protocol = self.protocol.clone();
            proxies.insert(proxy);
        }
        Ok(proxies)
    }
}

#[async_trait]
impl ProxyFetcher for ProxyscrapeApiSource {
    async fn fetch(&self) -> FetchResult<HashSet<Proxy>> {
        let body = fetch_text(&self.client, self.url.as_str()).await?;
        self.parse(&body)
    }
}
