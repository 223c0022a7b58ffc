use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub platforms_path: PathBuf,
    pub api_keys: Vec<String>,
    pub ebay_client_id: Option<String>,
    pub ebay_client_secret: Option<String>,
    pub ebay_base_url: String,
    pub ebay_auth_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub search_max_concurrency: usize,
    pub collect_max_concurrency: usize,
}

impl AppConfig {
    /// Both eBay OAuth credentials are present.
    #[must_use]
    pub fn has_ebay_credentials(&self) -> bool {
        self.ebay_client_id.is_some() && self.ebay_client_secret.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("platforms_path", &self.platforms_path)
            .field("database_url", &"[redacted]")
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .field("ebay_client_id", &self.ebay_client_id)
            .field(
                "ebay_client_secret",
                &self.ebay_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("ebay_base_url", &self.ebay_base_url)
            .field("ebay_auth_url", &self.ebay_auth_url)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("search_max_concurrency", &self.search_max_concurrency)
            .field("collect_max_concurrency", &self.collect_max_concurrency)
            .finish()
    }
}
