// HTTP client settings shared by the v1 and v2 clients.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout; firmware uploads need a generous one.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("metal-api-rs/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` that asks for JSON on every request.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_keep_other_defaults() {
        let cfg = TransportConfig::default()
            .with_user_agent("metalctl/1.2.3")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(cfg.user_agent, "metalctl/1.2.3");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
        assert!(cfg.build_client().is_ok());
    }
}
