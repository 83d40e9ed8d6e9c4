// src/sources/free_proxy_list.rs

//! Sources backed by the free-proxy-list family of sites.
//!
//! All of these sites render the same `proxylisttable` HTML table and
//! differ only in which listing they serve and how the protocol column is
//! expressed, so one parametrized source covers the whole family.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{FetchError, FetchResult};
use crate::models::Proxy;
use crate::store::ProxyFetcher;
use crate::utils::http::fetch_text;

/// How a listing encodes the proxy protocol.
#[derive(Debug, Clone, Copy)]
enum TableLayout {
    /// Columns: ip, port, code, country, anonymity, google, https-flag.
    /// Protocol is `https` when the flag column says "yes", else `http`.
    HttpsFlag,
    /// Columns: ip, port, code, country, version, anonymity. Protocol is
    /// the version column verbatim (socks4 / socks5).
    VersionColumn,
    /// Columns: ip, port, code, country, anonymity. Protocol is fixed by
    /// the listing itself.
    Fixed(&'static str),
}

impl TableLayout {
    /// Minimum number of cells a data row must carry.
    fn min_cells(&self) -> usize {
        match self {
            Self::HttpsFlag => 7,
            Self::VersionColumn => 6,
            Self::Fixed(_) => 5,
        }
    }
}

/// One `proxylisttable`-style listing.
pub struct ProxyTableSource {
    client: Client,
    url: &'static str,
    source_id: &'static str,
    layout: TableLayout,
}

impl ProxyTableSource {
    /// The front page of free-proxy-list.net.
    pub fn free_proxy_list(client: Client) -> Self {
        Self {
            client,
            url: "https://free-proxy-list.net",
            source_id: "free-proxy-list",
            layout: TableLayout::HttpsFlag,
        }
    }

    /// The anonymous-only listing on free-proxy-list.net.
    pub fn anonymous(client: Client) -> Self {
        Self {
            client,
            url: "https://free-proxy-list.net/anonymous-proxy.html",
            source_id: "anonymous-proxy",
            layout: TableLayout::HttpsFlag,
        }
    }

    /// The UK listing on free-proxy-list.net.
    pub fn uk(client: Client) -> Self {
        Self {
            client,
            url: "https://free-proxy-list.net/uk-proxy.html",
            source_id: "uk-proxy",
            layout: TableLayout::HttpsFlag,
        }
    }

    /// us-proxy.org.
    pub fn us(client: Client) -> Self {
        Self {
            client,
            url: "https://www.us-proxy.org",
            source_id: "us-proxy",
            layout: TableLayout::HttpsFlag,
        }
    }

    /// sslproxies.org; everything listed there is https.
    pub fn ssl(client: Client) -> Self {
        Self {
            client,
            url: "https://www.sslproxies.org",
            source_id: "ssl-proxy",
            layout: TableLayout::Fixed("https"),
        }
    }

    /// socks-proxy.net; the version column carries socks4/socks5.
    pub fn socks(client: Client) -> Self {
        Self {
            client,
            url: "https://www.socks-proxy.net",
            source_id: "socks-proxy",
            layout: TableLayout::VersionColumn,
        }
    }

    pub fn source_id(&self) -> &'static str {
        self.source_id
    }

    fn parse(&self, html: &str) -> FetchResult<HashSet<Proxy>> {
        let document = Html::parse_document(html);
        let row_selector = Selector::parse("table#proxylisttable tbody tr")
            .expect("static selector");
        let cell_selector = Selector::parse("td").expect("static selector");

        let mut proxies = HashSet::new();
        let mut saw_rows = false;
        for row in document.select(&row_selector) {
            saw_rows = true;
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|c| c.text().collect::<String>().trim().to_string())
                .collect();
            proxies.insert(self.parse_row(&cells)?);
        }

        if !saw_rows {
            return Err(FetchError::malformed(format!(
                "{}: no proxy table rows found",
                self.source_id
            )));
        }
        Ok(proxies)
    }

    fn parse_row(&self, cells: &[String]) -> FetchResult<Proxy> {
        if cells.len() < self.layout.min_cells() {
            return Err(FetchError::malformed(format!(
                "{}: table row has {} cells, expected at least {}",
                self.source_id,
                cells.len(),
                self.layout.min_cells()
            )));
        }

        let (anonymous, protocol) = match self.layout {
            TableLayout::HttpsFlag => {
                let anonymous = is_anonymous(&cells[4]);
                let protocol = if cells[6].eq_ignore_ascii_case("yes") {
                    "https"
                } else {
                    "http"
                };
                (anonymous, protocol.to_string())
            }
            TableLayout::VersionColumn => (is_anonymous(&cells[5]), cells[4].to_lowercase()),
            TableLayout::Fixed(protocol) => (is_anonymous(&cells[4]), protocol.to_string()),
        };

        Ok(Proxy {
            host: cells[0].clone(),
            port: cells[1].clone(),
            code: Some(cells[2].to_lowercase()),
            country: Some(cells[3].to_lowercase()),
            anonymous: Some(anonymous),
            protocol: Some(protocol),
            source: self.source_id.to_string(),
        })
    }
}

fn is_anonymous(cell: &str) -> bool {
    matches!(cell.to_lowercase().as_str(), "anonymous" | "elite proxy")
}

#[async_trait]
impl ProxyFetcher for ProxyTableSource {
    async fn fetch(&self) -> FetchResult<HashSet<Proxy>> {
        let body = fetch_text(&self.client, self.url).await?;
        self.parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &str) -> String {
        format!(
            "<html><body><table id=\"proxylisttable\"><thead><tr><th>IP</th></tr></thead>\
             <tbody>{rows}</tbody></table></body></html>"
        )
    }

    fn https_flag_row(ip: &str, port: &str, anonymity: &str, https: &str) -> String {
        format!(
            "<tr><td>{ip}</td><td>{port}</td><td>US</td><td>United States</td>\
             <td>{anonymity}</td><td>no</td><td>{https}</td><td>1 min ago</td></tr>"
        )
    }

    #[test]
    fn parses_https_flag_listing() {
        let html = table(&format!(
            "{}{}",
            https_flag_row("10.0.0.1", "8080", "elite proxy", "yes"),
            https_flag_row("10.0.0.2", "3128", "transparent", "no"),
        ));
        let source = ProxyTableSource::free_proxy_list(Client::new());
        let proxies = source.parse(&html).unwrap();
        assert_eq!(proxies.len(), 2);

        let elite = proxies.iter().find(|p| p.host == "10.0.0.1").unwrap();
        assert_eq!(elite.code.as_deref(), Some("us"));
        assert_eq!(elite.country.as_deref(), Some("united states"));
        assert_eq!(elite.anonymous, Some(true));
        assert_eq!(elite.protocol.as_deref(), Some("https"));
        assert_eq!(elite.source, "free-proxy-list");

        let transparent = proxies.iter().find(|p| p.host == "10.0.0.2").unwrap();
        assert_eq!(transparent.anonymous, Some(false));
        assert_eq!(transparent.protocol.as_deref(), Some("http"));
    }

    #[test]
    fn parses_version_column_listing() {
        let html = table(
            "<tr><td>10.0.0.3</td><td>1080</td><td>DE</td><td>Germany</td>\
             <td>Socks5</td><td>Anonymous</td><td>yes</td><td>1 min ago</td></tr>",
        );
        let source = ProxyTableSource::socks(Client::new());
        let proxies = source.parse(&html).unwrap();
        let proxy = proxies.iter().next().unwrap();
        assert_eq!(proxy.protocol.as_deref(), Some("socks5"));
        assert_eq!(proxy.anonymous, Some(true));
        assert_eq!(proxy.source, "socks-proxy");
    }

    #[test]
    fn fixed_protocol_listing_overrides_columns() {
        let html = table(
            "<tr><td>10.0.0.4</td><td>443</td><td>CA</td><td>Canada</td>\
             <td>elite proxy</td><td>no</td><td>no</td><td>1 min ago</td></tr>",
        );
        let source = ProxyTableSource::ssl(Client::new());
        let proxies = source.parse(&html).unwrap();
        let proxy = proxies.iter().next().unwrap();
        // The https-flag column says "no" but the listing is https-only.
        assert_eq!(proxy.protocol.as_deref(), Some("https"));
    }

    #[test]
    fn missing_table_is_malformed() {
        let source = ProxyTableSource::free_proxy_list(Client::new());
        assert!(matches!(
            source.parse("<html><body>maintenance</body></html>"),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn short_row_is_malformed() {
        let html = table("<tr><td>10.0.0.1</td><td>8080</td></tr>");
        let source = ProxyTableSource::free_proxy_list(Client::new());
        assert!(matches!(source.parse(&html), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn duplicate_rows_dedup() {
        let row = https_flag_row("10.0.0.1", "8080", "elite proxy", "yes");
        let html = table(&format!("{row}{row}"));
        let source = ProxyTableSource::free_proxy_list(Client::new());
        assert_eq!(source.parse(&html).unwrap().len(), 1);
    }
}
