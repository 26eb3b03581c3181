pub mod http;

use std::collections::BTreeMap;

use url::Url;

use crate::error::LayerResult;

/// Form parameters of a request, sorted by key.
pub type FormParams = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub params: Option<FormParams>,
    pub use_gzip: bool,
}

impl Request {
    pub fn post(url: Url, params: Option<FormParams>, use_gzip: bool) -> Self {
        Self {
            method: Method::Post,
            url,
            params,
            use_gzip,
        }
    }

    pub fn get(url: Url, use_gzip: bool) -> Self {
        Self {
            method: Method::Get,
            url,
            params: None,
            use_gzip,
        }
    }

    /// Value of the `op` query parameter, if any.
    pub fn op(&self) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == "op")
            .map(|(_, value)| value.into_owned())
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|params| params.get(key))
            .map(|value| value.as_str())
    }
}

/// Executes a single round trip and returns the raw response body.
///
/// Implementations must be reentrant: a client may be shared between threads and issue requests
/// concurrently through the same transport.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &Request) -> LayerResult<String>;
}
