//! Responders
//!
//! A responder maps a requested (domain, path) to response content. It is
//! called once per `Get` request, from the connection's own thread.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::protocol::{GetResponse, WireString};

/// Produces the response for a `Get` request
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, domain: &WireString, path: &WireString) -> GetResponse;
}

impl<F> Responder for F
where
    F: Fn(&WireString, &WireString) -> GetResponse + Send + Sync + 'static,
{
    fn respond(&self, domain: &WireString, path: &WireString) -> GetResponse {
        self(domain, path)
    }
}

/// Responder that answers every request with "Hello, world!"
pub fn hello_world() -> impl Responder {
    |_domain: &WireString, _path: &WireString| GetResponse::success("Hello, world!")
}

/// In-memory set of pages keyed by domain and path
///
/// - path not starting with `/` → `BadPath`
/// - unknown domain → `UnknownDomain`
/// - known domain, unknown path → `PageNotFound`
#[derive(Default)]
pub struct StaticSite {
    domains: RwLock<HashMap<Vec<u8>, HashMap<Vec<u8>, Bytes>>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a page; registers the domain if needed
    pub fn insert(&self, domain: &str, path: &str, content: impl Into<Bytes>) {
        self.domains
            .write()
            .entry(domain.as_bytes().to_vec())
            .or_default()
            .insert(path.as_bytes().to_vec(), content.into());
    }

    /// Register a domain with no pages
    pub fn add_domain(&self, domain: &str) {
        self.domains.write().entry(domain.as_bytes().to_vec()).or_default();
    }

    /// Remove a page, returning its content
    pub fn remove(&self, domain: &str, path: &str) -> Option<Bytes> {
        self.domains
            .write()
            .get_mut(domain.as_bytes())
            .and_then(|pages| pages.remove(path.as_bytes()))
    }

    pub fn page_count(&self) -> usize {
        self.domains.read().values().map(HashMap::len).sum()
    }
}

impl Responder for StaticSite {
    fn respond(&self, domain: &WireString, path: &WireString) -> GetResponse {
        if path.first() != Some(&b'/') {
            return GetResponse::bad_path();
        }

        let domains = self.domains.read();
        let Some(pages) = domains.get(domain.as_bytes()) else {
            return GetResponse::unknown_domain();
        };

        match pages.get(path.as_bytes()) {
            // Bytes clones are reference-counted, no copy of the page
            Some(content) => GetResponse::success(content.clone()),
            None => GetResponse::page_not_found(),
        }
    }
}
