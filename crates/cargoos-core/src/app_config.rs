use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide settings, read once at startup from `CARGOOS_*` env vars.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub user_agent: String,
    /// Search results endpoint; `keywords` and `page` are appended per page.
    pub search_base_url: String,
    /// Overall wall-clock budget for one search run, across all pages.
    pub search_deadline_secs: u64,
    pub offline_dir: PathBuf,
    pub exports_dir: PathBuf,
    pub scoring_rules_path: PathBuf,
    pub extract_max_candidates: usize,
    pub extract_detail_marker: String,
    pub fx_cbr_url: String,
    pub fx_cache_path: PathBuf,
    pub fx_cache_ttl_secs: u64,
    pub fx_target_currency: String,
    pub fx_timeout_secs: u64,
}
