use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend location and transport timeouts.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Search defaults shared by the public locator and the admin store listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_radius")]
    pub default_radius_miles: f64,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_page_limit")]
    pub admin_page_limit: u32,
    #[serde(default = "default_nationwide_radius")]
    pub nationwide_radius_miles: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_miles: default_radius(),
            page_limit: default_page_limit(),
            admin_page_limit: default_page_limit(),
            nationwide_radius_miles: default_nationwide_radius(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self { Self { store_path: default_store_path() } }
}

fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_connect_timeout() -> u64 { 5 }
fn default_request_timeout() -> u64 { 30 }
fn default_radius() -> f64 { 50.0 }
fn default_page_limit() -> u32 { 10 }
fn default_nationwide_radius() -> f64 { 5000.0 }
fn default_store_path() -> String { "data/session.json".to_string() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if !std::path::Path::new(&path).exists() {
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.api.normalize_from_env();
        self.api.validate()?;
        self.search.validate()?;
        if self.session.store_path.trim().is_empty() {
            self.session.store_path = default_store_path();
        }
        Ok(())
    }
}

impl ApiConfig {
    /// `LOCATOR_API_URL` wins over the file; a blank URL falls back to the default.
    pub fn normalize_from_env(&mut self) {
        if let Ok(url) = std::env::var("LOCATOR_API_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        if self.base_url.trim().is_empty() {
            self.base_url = default_base_url();
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("api.base_url must start with http:// or https://"));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(anyhow!("api timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.default_radius_miles.is_finite() && self.default_radius_miles > 0.0) {
            return Err(anyhow!("search.default_radius_miles must be > 0"));
        }
        if !(self.nationwide_radius_miles.is_finite() && self.nationwide_radius_miles > 0.0) {
            return Err(anyhow!("search.nationwide_radius_miles must be > 0"));
        }
        if self.page_limit == 0 || self.admin_page_limit == 0 {
            return Err(anyhow!("search page limits must be >= 1"));
        }
        Ok(())
    }
}
