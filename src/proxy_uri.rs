//! Splitting a Proxy-Uri into the part that must stay readable for the proxy
//! and the part that gets protected.

use core::convert::TryFrom;
use std::collections::LinkedList;

use crate::{error::Error, Result};

/// A Proxy-Uri split into the options it stands for.
#[derive(Debug, PartialEq)]
pub struct ProxyUri {
    pub proxy_scheme: String,
    pub uri_host: String,
    pub uri_port: Option<String>,
    pub uri_path: Option<String>,
    pub uri_query: Option<String>,
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl TryFrom<&[u8]> for ProxyUri {
    type Error = Error;

    /// Splits a Proxy-Uri into the Proxy-Scheme, Uri-Host, Uri-Port, Uri-Path
    /// and Uri-Query options.
    fn try_from(bytes: &[u8]) -> Result<ProxyUri> {
        let proxy_uri = String::from_utf8(bytes.to_vec())?;

        let scheme_end = proxy_uri.find("://").ok_or(Error::InvalidProxyUri)?;
        let (proxy_scheme, rest) =
            (&proxy_uri[..scheme_end], &proxy_uri[scheme_end + 3..]);
        if proxy_scheme.is_empty() {
            return Err(Error::InvalidProxyUri);
        }

        // The query is everything after the first '?'
        let (rest, uri_query) = match rest.find('?') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, ""),
        };
        // The path is everything after the first '/' of the remainder
        let (authority, uri_path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, ""),
        };
        let (uri_host, uri_port) = match authority.rfind(':') {
            Some(i) => (&authority[..i], &authority[i + 1..]),
            None => (authority, ""),
        };
        if uri_host.is_empty() {
            return Err(Error::InvalidProxyUri);
        }

        Ok(ProxyUri {
            proxy_scheme: proxy_scheme.to_string(),
            uri_host: uri_host.to_string(),
            uri_port: non_empty(uri_port),
            uri_path: non_empty(uri_path),
            uri_query: non_empty(uri_query),
        })
    }
}

impl ProxyUri {
    /// Returns the path segments as Uri-Path option values.
    pub fn get_path_list(&self) -> Option<LinkedList<Vec<u8>>> {
        self.uri_path.as_deref().map(|path| split_list(path, '/'))
    }

    /// Returns the query arguments as Uri-Query option values.
    pub fn get_query_list(&self) -> Option<LinkedList<Vec<u8>>> {
        self.uri_query.as_deref().map(|query| split_list(query, '&'))
    }

    /// Returns the class U option value for Proxy-Uri.
    pub fn compose_proxy_uri(&self) -> Vec<u8> {
        let mut composed = format!("{}://{}", self.proxy_scheme, self.uri_host);
        if let Some(port) = &self.uri_port {
            composed.push(':');
            composed.push_str(port);
        }

        composed.into_bytes()
    }
}

fn split_list(s: &str, separator: char) -> LinkedList<Vec<u8>> {
    s.split(separator)
        .filter(|part| !part.is_empty())
        .map(|part| part.as_bytes().to_vec())
        .collect()
}
