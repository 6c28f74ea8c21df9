use serde::{Deserialize, Serialize};
use url::Url;

/// Where and how to reach the CAB server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server root; endpoint paths (`/cab/...`) are resolved against it.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn base(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)
    }
}
