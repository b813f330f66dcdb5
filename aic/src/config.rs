//! aic configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main aic configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `$sh(...)` execution limits
    pub shell: ShellConfig,

    /// `$http(...)` client settings
    pub http: HttpConfig,

    /// Prompt watcher timing
    pub watch: WatchConfig,

    /// Post-action execution
    pub actions: ActionsConfig,

    /// Leader-key sequences
    pub sequence: SequenceConfig,

    /// Prompt history retention
    pub history: HistoryConfig,

    /// Log level used when `--log-level` is not given
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .aic.yml
        let local_config = PathBuf::from(".aic.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/aic/aic.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("aic").join("aic.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Shell command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Interpreter invoked as `<program> -c <command>`
    pub program: String,

    /// Kill the command after this many milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Output beyond this many bytes is truncated
    #[serde(rename = "max-output-bytes")]
    pub max_output_bytes: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "sh".to_string(),
            timeout_ms: 2_000,
            max_output_bytes: 256 * 1024,
        }
    }
}

impl ShellConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// HTTP fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: "aic".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Prompt watcher timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// How often the prompt file is stat'ed
    #[serde(rename = "poll-ms")]
    pub poll_ms: u64,

    /// Quiet period after the last change before a pass runs
    #[serde(rename = "debounce-ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_ms: 200,
            debounce_ms: 350,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Post-action execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    /// Pause between consecutive actions
    #[serde(rename = "step-delay-ms")]
    pub step_delay_ms: u64,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self { step_delay_ms: 50 }
    }
}

impl ActionsConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// Leader-key sequence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Leader characters typed in order before the command key
    pub leader: Vec<char>,

    /// Maximum gap between two keys of one sequence
    #[serde(rename = "step-timeout-ms")]
    pub step_timeout_ms: u64,

    /// Repeated key-down events of the same key inside this window are dropped
    #[serde(rename = "dedupe-ms")]
    pub dedupe_ms: u64,

    /// Where key events come from
    pub source: KeySourceKind,
}

/// Key event source for sequences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeySourceKind {
    /// System-wide keyboard hook; falls back to `terminal` when unavailable
    #[default]
    Global,
    /// Raw-mode reads from the controlling terminal
    Terminal,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            leader: vec![' ', '\'', ';'],
            step_timeout_ms: 2_500,
            dedupe_ms: 60,
            source: KeySourceKind::Global,
        }
    }
}

impl SequenceConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn dedupe_window(&self) -> Duration {
        Duration::from_millis(self.dedupe_ms)
    }
}

/// Prompt history retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Snapshots beyond this count are pruned oldest-first
    #[serde(rename = "max-entries")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}
