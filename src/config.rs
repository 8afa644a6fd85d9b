use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub ui: UiConfig,
    #[serde(default)]
    pub wizard: WizardConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub rest_api: RestApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for logs and saved config
    pub state: String,
    /// Optional JSON fixtures replacing the built-in seed data
    #[serde(default)]
    pub fixtures: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub refresh_rate_ms: u64,
    /// Rows per page in list views
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Seconds a status-bar notice stays visible
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
}

fn default_page_size() -> usize {
    10
}

fn default_notice_secs() -> u64 {
    4
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Seconds before a verification code can be resent (default: 60)
    #[serde(default = "default_resend_cooldown")]
    pub resend_cooldown_secs: u64,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
}

fn default_resend_cooldown() -> u64 {
    60
}

fn default_password_min_length() -> usize {
    crate::wizard::validate::DEFAULT_PASSWORD_MIN
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            resend_cooldown_secs: default_resend_cooldown(),
            password_min_length: default_password_min_length(),
        }
    }
}

/// Mock backend behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Simulated round-trip latency per call
    #[serde(default = "default_latency")]
    pub latency_ms: u64,
    /// Lifetime of password reset codes (default: 600 = 10 min)
    #[serde(default = "default_reset_code_ttl")]
    pub reset_code_ttl_secs: u64,
}

fn default_latency() -> u64 {
    400
}

fn default_reset_code_ttl() -> u64 {
    600 // 10 minutes
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency(),
            reset_code_ttl_secs: default_reset_code_ttl(),
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

/// REST API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestApiConfig {
    /// Start the server together with the TUI
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rest_port")]
    pub port: u16,
}

fn default_rest_port() -> u16 {
    7180
}

impl Default for RestApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_rest_port(),
        }
    }
}

impl Config {
    /// Project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".sensorflow/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Embedded defaults so the console works without config files
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

        // User config in ~/.config/sensorflow/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sensorflow").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SENSORFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .sensorflow/config.toml
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::local_config_path())
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        absolute(&self.paths.state)
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// Fixtures file, if one is configured
    pub fn fixtures_path(&self) -> Option<PathBuf> {
        self.paths.fixtures.as_deref().map(absolute)
    }

    pub fn resend_cooldown(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.wizard.resend_cooldown_secs)
    }
}

fn absolute(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                state: ".sensorflow".to_string(),
                fixtures: None,
            },
            logging: LoggingConfig::default(),
            ui: UiConfig {
                refresh_rate_ms: 250,
                page_size: default_page_size(),
                notice_secs: default_notice_secs(),
            },
            wizard: WizardConfig::default(),
            backend: BackendConfig::default(),
            rest_api: RestApiConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.wizard.resend_cooldown_secs, 60);
        assert_eq!(config.wizard.password_min_length, 8);
        assert_eq!(config.rest_api.port, 7180);
        assert!(!config.rest_api.enabled);
        assert!(config.fixtures_path().is_none());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[wizard]\nresend_cooldown_secs = 30\n\n[ui]\nrefresh_rate_ms = 100\npage_size = 25\n",
        )
        .unwrap();

        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.wizard.resend_cooldown_secs, 30);
        assert_eq!(config.ui.page_size, 25);
        // Untouched sections keep their defaults
        assert_eq!(config.backend.reset_code_ttl_secs, 600);
    }

    #[test]
    fn test_save_roundtrips_through_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.backend.latency_ms = 0;
        config.paths.fixtures = Some("fixtures.json".to_string());
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed.backend.latency_ms, 0);
        assert_eq!(parsed.paths.fixtures.as_deref(), Some("fixtures.json"));
    }

    #[test]
    fn test_relative_paths_are_resolved() {
        let config = Config::default();
        assert!(config.state_path().is_absolute());
        assert!(config.logs_path().ends_with("logs"));
    }
}
