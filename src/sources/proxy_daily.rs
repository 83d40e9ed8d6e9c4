// src/sources/proxy_daily.rs

//! Sources backed by proxy-daily.com.
//!
//! The site publishes one page with three plain-text blocks of
//! `host:port` lines (http, socks4, socks5 in that order); each block is
//! exposed as its own source.

use std::collections::HashSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{FetchError, FetchResult};
use crate::models::Proxy;
use crate::store::ProxyFetcher;
use crate::utils::http::fetch_text;

const PROXY_DAILY_URL: &str = "https://proxy-daily.com";

/// One `host:port` line. Hosts are IPs or hostnames; ports are numeric.
fn endpoint_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9A-Za-z][0-9A-Za-z.\-]*):(\d{1,5})$").expect("static pattern")
    })
}

/// Which block of the page a source reads.
#[derive(Debug, Clone, Copy)]
pub enum ProxyDailySection {
    Http,
    Socks4,
    Socks5,
}

impl ProxyDailySection {
    fn index(&self) -> usize {
        match self {
            Self::Http => 0,
            Self::Socks4 => 1,
            Self::Socks5 => 2,
        }
    }

    fn protocol(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Socks4 => "socks4",
            Self::Socks5 => "socks5",
        }
    }

    fn source_id(&self) -> &'static str {
        match self {
            Self::Http => "proxy-daily-http",
            Self::Socks4 => "proxy-daily-socks4",
            Self::Socks5 => "proxy-daily-socks5",
        }
    }
}

/// One protocol block of the proxy-daily.com listing.
pub struct ProxyDailySource {
    client: Client,
    section: ProxyDailySection,
}

impl ProxyDailySource {
    pub fn new(client: Client, section: ProxyDailySection) -> Self {
        Self { client, section }
    }

    pub fn source_id(&self) -> &'static str {
        self.section.source_id()
    }

    fn parse(&self, html: &str) -> FetchResult<HashSet<Proxy>> {
        let document = Html::parse_document(html);
        let section_selector =
            Selector::parse("div#free-proxy-list center").expect("static selector");

        let block = document
            .select(&section_selector)
            .nth(self.section.index())
            .ok_or_else(|| {
                FetchError::malformed(format!(
                    "{}: proxy list section not found",
                    self.source_id()
                ))
            })?;

        let text: String = block.text().collect();
        let mut proxies = HashSet::new();
        for line in text.lines() {
            let line = line.trim().trim_matches(|c| c == '"' || c == '\'');
            if line.is_empty() {
                continue;
            }
            let captures = endpoint_pattern().captures(line).ok_or_else(|| {
                FetchError::malformed(format!(
                    "{}: unexpected line {line:?}",
                    self.source_id()
                ))
            })?;

            let mut proxy = Proxy::new(&captures[1], &captures[2], self.source_id());
            proxy.protocol = Some(self.section.protocol().to_string());
            proxies.insert(proxy);
        }

        if proxies.is_empty() {
            return Err(FetchError::malformed(format!(
                "{}: proxy list section is empty",
                self.source_id()
            )));
        }
        Ok(proxies)
    }
}

#[async_trait]
impl ProxyFetcher for ProxyDailySource {
    async fn fetch(&self) -> FetchResult<HashSet<Proxy>> {
        let body = fetch_text(&self.client, PROXY_DAILY_URL).await?;
        self.parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> String {
        "<html><body><div id=\"free-proxy-list\">\
         <center><div>10.0.0.1:8080\n10.0.0.2:3128</div></center>\
         <center><div>10.0.1.1:1080</div></center>\
         <center><div>10.0.2.1:1080\n10.0.2.2:9050</div></center>\
         </div></body></html>"
            .to_string()
    }

    #[test]
    fn each_section_reads_its_own_block() {
        let http = ProxyDailySource::new(Client::new(), ProxyDailySection::Http);
        let proxies = http.parse(&page()).unwrap();
        assert_eq!(proxies.len(), 2);
        assert!(proxies.iter().all(|p| p.protocol.as_deref() == Some("http")));
        assert!(proxies.iter().all(|p| p.source == "proxy-daily-http"));

        let socks5 = ProxyDailySource::new(Client::new(), ProxyDailySection::Socks5);
        let proxies = socks5.parse(&page()).unwrap();
        assert_eq!(proxies.len(), 2);
        assert!(proxies.iter().any(|p| p.host == "10.0.2.2" && p.port == "9050"));
    }

    #[test]
    fn metadata_is_unset_for_plain_listings() {
        let source = ProxyDailySource::new(Client::new(), ProxyDailySection::Socks4);
        let proxies = source.parse(&page()).unwrap();
        let proxy = proxies.iter().next().unwrap();
        assert_eq!(proxy.code, None);
        assert_eq!(proxy.country, None);
        assert_eq!(proxy.anonymous, None);
        assert_eq!(proxy.protocol.as_deref(), Some("socks4"));
    }

    #[test]
    fn missing_section_is_malformed() {
        let html = "<html><body><div id=\"free-proxy-list\">\
                    <center><div>10.0.0.1:8080</div></center></div></body></html>";
        let source = ProxyDailySource::new(Client::new(), ProxyDailySection::Socks5);
        assert!(matches!(source.parse(html), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn garbage_line_is_malformed() {
        let html = "<html><body><div id=\"free-proxy-list\">\
                    <center><div>not a proxy line</div></center>\
                    <center><div></div></center><center><div></div></center>\
                    </div></body></html>";
        let source = ProxyDailySource::new(Client::new(), ProxyDailySection::Http);
        assert!(matches!(source.parse(html), Err(FetchError::Malformed(_))));
    }
}
