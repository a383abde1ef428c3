use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// MediaWiki `api.php` endpoint used for `opensearch` title lookups.
    #[serde(default = "default_search_url")]
    pub search_url: String,
    /// REST base for `page/summary/<title>` lookups.
    #[serde(default = "default_summary_url")]
    pub summary_url: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    6
}

fn default_search_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}

fn default_summary_url() -> String {
    "https://en.wikipedia.org/api/rest_v1/page/summary".into()
}

fn default_limit() -> usize {
    2
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_timeout_secs(),
            search_url: default_search_url(),
            summary_url: default_summary_url(),
            limit: default_limit(),
        }
    }
}
