use std::time::Duration;

use url::Url;

use crate::error::LayerResult;

/// Connection settings shared by every request a client issues. Set once at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionConfig {
    base_url: Url,
    use_gzip: bool,
    timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Create a config for the given REST root. A trailing slash is added when missing so that
    /// resource paths are appended below it rather than replacing its last segment.
    pub fn new(base_url: &str) -> LayerResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            use_gzip: false,
            timeout: None,
        })
    }

    pub fn with_gzip(mut self, use_gzip: bool) -> Self {
        self.use_gzip = use_gzip;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn use_gzip(&self) -> bool {
        self.use_gzip
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
