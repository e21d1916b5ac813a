use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths::resolve_home_dir;

const DEFAULT_SUBDIR: &str = ".dashkit";

/// Application configuration: where the API lives, how lists behave and
/// where logs go.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Data directory for logs and exports; normalized to an absolute path.
    #[serde(default)]
    pub home_dir: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    /// Logging sections (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout; 0 disables it.
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ListingConfig {
    pub default_page_size: u32,
    pub debounce_ms: u64,
    pub show_error_toast: bool,
    /// Relative paths resolve against `home_dir`.
    pub export_dir: String,
}

/// Logging configuration - maps target prefixes to their logging settings.
/// Key "default" is the catch-all for targets without their own section.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/dashkit.log"; empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8087".to_string(),
            timeout_sec: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_sec > 0).then(|| Duration::from_secs(self.timeout_sec))
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            debounce_ms: 300,
            show_error_toast: true,
            export_dir: "exports".to_string(),
        }
    }
}

impl ListingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/dashkit.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            // Empty => ~/.dashkit (%APPDATA%/.dashkit on Windows)
            home_dir: String::new(),
            api: ApiConfig::default(),
            listing: ListingConfig::default(),
            logging: Some(default_logging_config()),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let path = config_path.as_ref();
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }

        // Logging stays None unless YAML/ENV provide it.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(path))
            // APP__LISTING__DEBOUNCE_MS=150 maps to listing.debounce_ms
            .merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        config.finalize()?;
        Ok(config)
    }

    /// Load configuration from file or fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                c.finalize().context("Invalid default configuration")?;
                Ok(c)
            }
        }
    }

    fn finalize(&mut self) -> Result<()> {
        normalize_home_dir_inplace(self).context("Failed to resolve home_dir")?;
        self.validate()
    }

    /// Reject values the list layer cannot work with.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: '{}'", self.api.base_url))?;
        if self.listing.default_page_size == 0 {
            bail!("listing.default_page_size must be > 0");
        }
        Ok(())
    }

    /// Absolute export directory.
    pub fn export_dir(&self) -> PathBuf {
        let p = Path::new(&self.listing.export_dir);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            Path::new(&self.home_dir).join(p)
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(base_url) = &args.base_url {
            self.api.base_url = base_url.clone();
        }

        // -v / -vv raise the console level of the "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }
}

/// Command line arguments that affect configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub base_url: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
}

fn normalize_home_dir_inplace(config: &mut AppConfig) -> Result<()> {
    let raw = Some(config.home_dir.clone()).filter(|s| !s.trim().is_empty());
    let resolved: PathBuf =
        resolve_home_dir(raw, DEFAULT_SUBDIR, /*create*/ true).context("home_dir normalization failed")?;
    config.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}
