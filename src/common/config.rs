//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Application under test
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Accessibility bridge process
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Translation catalog
    #[serde(default)]
    pub locale: LocaleConfig,

    /// Polling and settle timing
    #[serde(default)]
    pub timing: Timing,

    /// Step engine limits
    #[serde(default)]
    pub steps: StepsConfig,

    /// System settings side channel
    #[serde(default)]
    pub side_channel: SideChannelConfig,
}

/// Application under test
#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationConfig {
    /// Accessible name of the application root node
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Launch a fresh instance before each scenario and terminate it after
    #[serde(default = "default_true")]
    pub launch_per_scenario: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            launch_per_scenario: true,
        }
    }
}

fn default_app_name() -> String {
    "eog".to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration for the accessibility bridge
#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    /// Path to the bridge executable
    #[serde(default = "default_bridge")]
    pub path: PathBuf,

    /// Additional arguments to pass to the bridge
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            path: default_bridge(),
            args: Vec::new(),
        }
    }
}

fn default_bridge() -> PathBuf {
    PathBuf::from("a11y-bridge")
}

impl BridgeConfig {
    /// Resolve the bridge executable, searching PATH for bare names
    pub fn resolve_path(&self) -> PathBuf {
        if self.path.components().count() == 1 {
            if let Ok(found) = which::which(&self.path) {
                return found;
            }
        }
        self.path.clone()
    }
}

/// Translation catalog settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LocaleConfig {
    /// YAML file mapping source strings to the running locale
    pub catalog: Option<PathBuf>,
}

/// Timing settings
#[derive(Debug, Deserialize, Clone)]
pub struct Timing {
    /// Attempts for polled reads
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,

    /// Delay between polled reads in milliseconds
    #[serde(default = "default_poll_delay")]
    pub poll_delay_ms: u64,

    /// Multiplier applied to every settle wait (0 disables them)
    #[serde(default = "default_settle_scale")]
    pub settle_scale: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_attempts: default_poll_attempts(),
            poll_delay_ms: default_poll_delay(),
            settle_scale: default_settle_scale(),
        }
    }
}

fn default_poll_attempts() -> u32 {
    10
}
fn default_poll_delay() -> u64 {
    500
}
fn default_settle_scale() -> f64 {
    1.0
}

impl Timing {
    /// Timing with no waits at all, for in-process tests
    pub fn instant() -> Self {
        Self {
            poll_attempts: default_poll_attempts(),
            poll_delay_ms: 0,
            settle_scale: 0.0,
        }
    }

    /// Scale a settle wait
    pub fn settle(&self, base: Duration) -> Duration {
        if self.settle_scale <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(base.as_secs_f64() * self.settle_scale)
            .unwrap_or(Duration::ZERO)
    }
}

/// Step engine limits
#[derive(Debug, Deserialize, Clone)]
pub struct StepsConfig {
    /// Maximum nesting of steps executing other steps
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    8
}

/// System settings query configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SideChannelConfig {
    /// gsettings executable
    #[serde(default = "default_gsettings")]
    pub gsettings: String,
}

impl Default for SideChannelConfig {
    fn default() -> Self {
        Self {
            gsettings: default_gsettings(),
        }
    }
}

fn default_gsettings() -> String {
    "gsettings".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = super::Error::read_file(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;

        if !config.timing.settle_scale.is_finite() {
            return Err(super::Error::ConfigParse(format!(
                "timing.settle_scale must be a finite number, got {}",
                config.timing.settle_scale
            )));
        }
        Ok(config)
    }
}
