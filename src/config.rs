use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialConfig;
use crate::duration::deserialize_duration;

/// Default console region.
fn default_region() -> String {
    "ap-northeast-1".to_string()
}

/// Target console configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Full console URL. When unset, built from `region`.
    pub url: Option<String>,

    /// Console region, used to build the URL when `url` is unset.
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            url: None,
            region: default_region(),
        }
    }
}

impl ConsoleConfig {
    /// The URL the login flow navigates to.
    pub fn resolve_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("https://{}.run.claw.cloud/", self.region),
        }
    }
}

/// Browser discovery and launch options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Explicit path to a Chrome/Chromium binary. Skips discovery when set.
    pub binary: Option<PathBuf>,

    /// Run the browser headless. Turn off to watch the flow for debugging.
    pub headless: bool,

    /// Browser window width in pixels.
    pub window_width: u32,

    /// Browser window height in pixels.
    pub window_height: u32,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            binary: None,
            headless: true,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

fn default_element_wait() -> Duration {
    Duration::from_secs(10)
}

fn default_consent_wait() -> Duration {
    Duration::from_secs(5)
}

fn default_oauth_redirect() -> Duration {
    Duration::from_secs(20)
}

fn default_settle_min() -> Duration {
    Duration::from_secs(3)
}

fn default_settle_max() -> Duration {
    Duration::from_secs(5)
}

fn default_keystroke_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_notify_request() -> Duration {
    Duration::from_secs(10)
}

/// Timed-wait configuration for the login walk.
///
/// All values accept human-readable duration strings ("10s", "500ms").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long to wait for a login form element to appear.
    #[serde(
        default = "default_element_wait",
        deserialize_with = "deserialize_duration"
    )]
    pub element_wait: Duration,

    /// How long to wait for the OAuth consent button.
    #[serde(
        default = "default_consent_wait",
        deserialize_with = "deserialize_duration"
    )]
    pub consent_wait: Duration,

    /// How long to wait for the OAuth redirect back to the console.
    #[serde(
        default = "default_oauth_redirect",
        deserialize_with = "deserialize_duration"
    )]
    pub oauth_redirect: Duration,

    /// Lower bound of the randomized settle delay between steps.
    #[serde(
        default = "default_settle_min",
        deserialize_with = "deserialize_duration"
    )]
    pub settle_min: Duration,

    /// Upper bound of the randomized settle delay between steps.
    #[serde(
        default = "default_settle_max",
        deserialize_with = "deserialize_duration"
    )]
    pub settle_max: Duration,

    /// Pacing between individual keystrokes when typing the TOTP code.
    #[serde(
        default = "default_keystroke_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub keystroke_delay: Duration,

    /// Request timeout for the notification webhook.
    #[serde(
        default = "default_notify_request",
        deserialize_with = "deserialize_duration"
    )]
    pub notify_request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            element_wait: default_element_wait(),
            consent_wait: default_consent_wait(),
            oauth_redirect: default_oauth_redirect(),
            settle_min: default_settle_min(),
            settle_max: default_settle_max(),
            keystroke_delay: default_keystroke_delay(),
            notify_request: default_notify_request(),
        }
    }
}

/// Default session max age (24 hours).
fn default_session_max_age() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

/// Session cookie reuse configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Apply cached cookies before navigating, and store them after a
    /// successful login.
    pub reuse: bool,

    /// How old cached cookies can be before they're ignored.
    #[serde(
        default = "default_session_max_age",
        deserialize_with = "deserialize_duration"
    )]
    pub max_age: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reuse: true,
            max_age: default_session_max_age(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root for screenshots and the session cache. If relative, resolved
    /// from the config file location. Defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// Target console settings.
    pub console: ConsoleConfig,

    /// Browser discovery and launch settings.
    pub browser: BrowserOptions,

    /// Timed-wait settings.
    pub timeouts: TimeoutConfig,

    /// Session cookie reuse settings.
    pub session: SessionConfig,

    /// Credential backend selection.
    pub credentials: CredentialConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.timeouts.settle_min > self.timeouts.settle_max {
            anyhow::bail!(
                "timeouts.settle_min must not exceed timeouts.settle_max ({:?} > {:?})",
                self.timeouts.settle_min,
                self.timeouts.settle_max
            );
        }
        Ok(())
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to `config_dir`.
    /// If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The resolved data directory path.
    pub data_dir: PathBuf,

    /// Where result/error screenshots land.
    pub screenshot_dir: PathBuf,

    /// Where cached session cookies land.
    pub session_dir: PathBuf,

    /// The console URL the flow navigates to.
    pub console_url: String,

    /// Browser discovery and launch settings.
    pub browser: BrowserOptions,

    /// Timed-wait settings.
    pub timeouts: TimeoutConfig,

    /// Session cookie reuse settings.
    pub session: SessionConfig,

    /// Credential backend selection.
    pub credentials: CredentialConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./clawkeeper.toml` if it exists in current directory
/// 2. `~/.local/share/clawkeeper/clawkeeper.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("clawkeeper.toml");
    if local_config.exists() {
        return local_config;
    }

    // XDG data directory fallback
    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("clawkeeper").join("clawkeeper.toml");
    }

    // Final fallback to local
    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    ///
    /// The data directory is resolved relative to the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        let data_dir = config.resolve_data_dir(config_dir);

        Ok(Self::from_parts(config, data_dir))
    }

    /// Load config, creating a default if the file doesn't exist.
    ///
    /// If the config file doesn't exist, uses the config file's intended
    /// parent directory as the data directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            // Resolve the config path relative to current directory
            let config_path = if config_path.is_relative() {
                std::env::current_dir()
                    .context("Failed to get current directory")?
                    .join(config_path)
            } else {
                config_path.to_path_buf()
            };

            // Use the intended config directory as data dir
            let config_dir = config_path
                .parent()
                .context("Config path has no parent directory")?;

            Ok(Self::from_parts(Config::default(), config_dir.to_path_buf()))
        }
    }

    fn from_parts(config: Config, data_dir: PathBuf) -> Self {
        Self {
            screenshot_dir: data_dir.join("screenshots"),
            session_dir: data_dir.join("sessions"),
            console_url: config.console.resolve_url(),
            data_dir,
            browser: config.browser,
            timeouts: config.timeouts,
            session: config.session,
            credentials: config.credentials,
        }
    }
}
