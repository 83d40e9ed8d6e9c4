//! Proxy data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A proxy endpoint scraped from one source.
///
/// Two proxies with identical fields are the same proxy for set-membership
/// purposes, even when they came from different fetches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Proxy {
    /// Host address (IP or domain)
    pub host: String,

    /// Port, kept as text exactly as scraped
    pub port: String,

    /// Two-letter country code, lowercased (us, ca, ...)
    pub code: Option<String>,

    /// Country name, lowercased (united states, canada, ...)
    pub country: Option<String>,

    /// Whether the proxy advertises itself as anonymous
    pub anonymous: Option<bool>,

    /// Protocol (http, https, socks4, socks5, ...)
    pub protocol: Option<String>,

    /// Name of the source that produced this proxy
    pub source: String,
}

impl Proxy {
    /// Create a proxy with only the endpoint and source set.
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            code: None,
            country: None,
            anonymous: None,
            protocol: None,
            source: source.into(),
        }
    }

    /// The `(host, port)` identity used for denylisting.
    pub fn endpoint(&self) -> ProxyEndpoint {
        ProxyEndpoint {
            host: self.host.clone(),
            port: self.port.clone(),
        }
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.protocol {
            Some(protocol) => write!(f, "{}://{}:{}", protocol, self.host, self.port),
            None => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

/// A network endpoint identity.
///
/// Proxies sharing a `(host, port)` pair are the same endpoint regardless
/// of their other fields; the denylist operates on these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: String,
}

impl From<&Proxy> for ProxyEndpoint {
    fn from(proxy: &Proxy) -> Self {
        proxy.endpoint()
    }
}

impl From<(&str, &str)> for ProxyEndpoint {
    fn from((host, port): (&str, &str)) -> Self {
        Self {
            host: host.to_string(),
            port: port.to_string(),
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
