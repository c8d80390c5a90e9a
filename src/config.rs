use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub quoter: QuoterConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for the remembered session and log files
    #[serde(default = "default_state_dir")]
    pub state: String,
}

fn default_state_dir() -> String {
    ".sigec".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state: default_state_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate_ms: u64,
    /// Rows per page in list screens
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Where downloaded quote documents are written (empty = current directory)
    #[serde(default)]
    pub download_dir: String,
}

fn default_refresh_rate() -> u64 {
    250
}

fn default_page_size() -> usize {
    10
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: default_refresh_rate(),
            page_size: default_page_size(),
            download_dir: String::new(),
        }
    }
}

/// Business option tables offered by the quote wizard.
///
/// These are commercial policy, not logic: operators change them per
/// campaign without a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuoterConfig {
    #[serde(default = "default_commercial_discounts")]
    pub commercial_discounts: Vec<u32>,
    #[serde(default = "default_affinity_discounts")]
    pub affinity_discounts: Vec<u32>,
    #[serde(default = "default_card_discounts")]
    pub card_discounts: Vec<u32>,
    #[serde(default = "default_monotributo_categories")]
    pub monotributo_categories: Vec<String>,
}

fn default_commercial_discounts() -> Vec<u32> {
    vec![0, 5, 10, 15, 20, 25, 30]
}

fn default_affinity_discounts() -> Vec<u32> {
    vec![0, 5, 10, 15, 20]
}

fn default_card_discounts() -> Vec<u32> {
    vec![0, 5, 10]
}

fn default_monotributo_categories() -> Vec<String> {
    ('A'..='K').map(|c| c.to_string()).collect()
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            commercial_discounts: default_commercial_discounts(),
            affinity_discounts: default_affinity_discounts(),
            card_discounts: default_card_discounts(),
            monotributo_categories: default_monotributo_categories(),
        }
    }
}

impl Config {
    /// Project-local config file, checked before the user-level one
    pub fn local_config_path() -> PathBuf {
        PathBuf::from("sigec.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Embedded defaults so sigec works without any config file
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/sigec/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sigec").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with SIGEC_ prefix, e.g. SIGEC_API__BASE_URL
        builder = builder.add_source(
            config::Environment::with_prefix("SIGEC")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to ./sigec.toml
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::local_config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        absolutize(&self.paths.state)
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// File holding a remembered session between runs
    pub fn session_file_path(&self) -> PathBuf {
        self.state_path().join("session.json")
    }

    pub fn download_path(&self) -> PathBuf {
        if self.ui.download_dir.is_empty() {
            std::env::current_dir().unwrap_or_default()
        } else {
            absolutize(&self.ui.download_dir)
        }
    }
}

fn absolutize(raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            paths: PathsConfig::default(),
            logging: LoggingConfig::default(),
            ui: UiConfig::default(),
            quoter: QuoterConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_point_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.ui.page_size, 10);
    }

    #[test]
    fn test_default_discount_tables_start_at_zero() {
        let quoter = QuoterConfig::default();
        assert_eq!(quoter.commercial_discounts.first(), Some(&0));
        assert_eq!(quoter.affinity_discounts.first(), Some(&0));
        assert_eq!(quoter.card_discounts.first(), Some(&0));
        assert_eq!(quoter.monotributo_categories.len(), 11);
        assert_eq!(quoter.monotributo_categories[0], "A");
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "http://backend.test/api"

[quoter]
card_discounts = [0, 15]
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.api.base_url, "http://backend.test/api");
        assert_eq!(config.quoter.card_discounts, vec![0, 15]);
        // Untouched sections keep their defaults
        assert_eq!(config.quoter.affinity_discounts, vec![0, 5, 10, 15, 20]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_round_trips_through_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("sigec.toml");

        let mut config = Config::default();
        config.ui.page_size = 25;
        config.save_to(&path).unwrap();

        let reloaded = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(reloaded.ui.page_size, 25);
    }

    #[test]
    fn test_state_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.state = temp_dir.path().to_string_lossy().to_string();

        assert!(config.logs_path().ends_with("logs"));
        assert!(config.session_file_path().ends_with("session.json"));
        assert!(config.session_file_path().starts_with(temp_dir.path()));
    }
}
