//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default desktop Chrome User-Agent sent by the plain HTTP fetcher.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Render pages in headless Chromium before reading them
    #[serde(default = "default_true")]
    pub render: bool,

    /// Fall back to a plain HTTP GET when rendering is unavailable or fails
    #[serde(default = "default_true")]
    pub http_fallback: bool,

    /// Explicit Chromium/Chrome executable (auto-detected when unset)
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Proxy URL for the HTTP fetcher (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// User-Agent for the HTTP fetcher
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page navigation budget in milliseconds
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Budget for each popup dismissal attempt in milliseconds
    #[serde(default = "default_popup_timeout_ms")]
    pub popup_timeout_ms: u64,

    /// Pause after scrolling to the bottom, for lazy-loaded content
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    /// How long to wait for a known price element to appear
    #[serde(default = "default_selector_wait_ms")]
    pub selector_wait_ms: u64,

    /// Plain HTTP request timeout in milliseconds
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_navigation_timeout_ms() -> u64 {
    15_000
}

fn default_popup_timeout_ms() -> u64 {
    1_500
}

fn default_scroll_settle_ms() -> u64 {
    1_500
}

fn default_selector_wait_ms() -> u64 {
    8_000
}

fn default_http_timeout_ms() -> u64 {
    15_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render: true,
            http_fallback: true,
            chrome_path: None,
            proxy: None,
            user_agent: default_user_agent(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            popup_timeout_ms: default_popup_timeout_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            selector_wait_ms: default_selector_wait_ms(),
            http_timeout_ms: default_http_timeout_ms(),
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("pricepin.toml");
        if local_config.exists() {
            debug!("Found pricepin.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("pricepin").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Some(render) = env_flag("PRICEPIN_RENDER") {
            self.render = render;
        }

        if let Some(fallback) = env_flag("PRICEPIN_HTTP_FALLBACK") {
            self.http_fallback = fallback;
        }

        if let Ok(chrome) = std::env::var("PRICEPIN_CHROME") {
            self.chrome_path = Some(PathBuf::from(chrome));
        }

        if let Ok(proxy) = std::env::var("PRICEPIN_PROXY") {
            self.proxy = Some(proxy);
        }

        self
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn popup_timeout(&self) -> Duration {
        Duration::from_millis(self.popup_timeout_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn selector_wait(&self) -> Duration {
        Duration::from_millis(self.selector_wait_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

/// Reads a boolean environment flag; unparsable values are ignored.
fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: table, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.render);
        assert!(config.http_fallback);
        assert!(config.chrome_path.is_none());
        assert!(config.proxy.is_none());
        assert_eq!(config.navigation_timeout_ms, 15_000);
        assert_eq!(config.popup_timeout_ms, 1_500);
        assert_eq!(config.scroll_settle_ms, 1_500);
        assert_eq!(config.selector_wait_ms, 8_000);
        assert_eq!(config.http_timeout_ms, 15_000);
        assert_eq!(config.format, OutputFormat::Table);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_durations() {
        let config = Config::new();
        assert_eq!(config.navigation_timeout(), Duration::from_secs(15));
        assert_eq!(config.popup_timeout(), Duration::from_millis(1500));
        assert_eq!(config.selector_wait(), Duration::from_secs(8));
        assert_eq!(config.http_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);

        let err = "csv".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("table, json"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            render = false
            selector_wait_ms = 10000
            format = "json"
            chrome_path = "/usr/bin/chromium"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.render);
        assert!(config.http_fallback);
        assert_eq!(config.selector_wait_ms, 10_000);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(config.navigation_timeout_ms, 15_000);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            http_fallback = false
            proxy = "socks5://localhost:1080"
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(!config.http_fallback);
        assert_eq!(config.proxy.as_deref(), Some("socks5://localhost:1080"));
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "popup_timeout_ms = 500").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.popup_timeout_ms, 500);
    }

    #[test]
    fn test_config_with_env() {
        let orig_render = std::env::var("PRICEPIN_RENDER").ok();
        let orig_chrome = std::env::var("PRICEPIN_CHROME").ok();

        std::env::set_var("PRICEPIN_RENDER", "off");
        std::env::set_var("PRICEPIN_CHROME", "/opt/chrome/chrome");

        let config = Config::new().with_env();
        assert!(!config.render);
        assert_eq!(config.chrome_path, Some(PathBuf::from("/opt/chrome/chrome")));

        match orig_render {
            Some(v) => std::env::set_var("PRICEPIN_RENDER", v),
            None => std::env::remove_var("PRICEPIN_RENDER"),
        }
        match orig_chrome {
            Some(v) => std::env::set_var("PRICEPIN_CHROME", v),
            None => std::env::remove_var("PRICEPIN_CHROME"),
        }
    }

    #[test]
    fn test_config_with_env_invalid_flag() {
        let orig = std::env::var("PRICEPIN_HTTP_FALLBACK").ok();

        std::env::set_var("PRICEPIN_HTTP_FALLBACK", "maybe");
        let config = Config::new().with_env();
        assert!(config.http_fallback);

        match orig {
            Some(v) => std::env::set_var("PRICEPIN_HTTP_FALLBACK", v),
            None => std::env::remove_var("PRICEPIN_HTTP_FALLBACK"),
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config { render: false, format: OutputFormat::Json, ..Config::default() };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.render, config.render);
        assert_eq!(parsed.format, config.format);
        assert_eq!(parsed.user_agent, config.user_agent);
    }
}
