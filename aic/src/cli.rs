//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// aic - expand $calls in ai/prompt.md and copy the result
#[derive(Parser)]
#[command(
    name = "aic",
    about = "Prompt token interpreter: expands $calls in ai/prompt.md to the clipboard",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the prompt once, print it and copy it to the clipboard
    Run {
        /// Print only; leave the clipboard and history alone
        #[arg(long)]
        no_copy: bool,

        /// Skip queued mouse/keyboard actions and $clear()
        #[arg(long)]
        no_actions: bool,
    },

    /// Re-render whenever ai/prompt.md changes
    Watch {
        /// Poll interval in milliseconds
        #[arg(long)]
        poll_ms: Option<u64>,

        /// Quiet period after a change before rendering, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Also listen for leader-key sequences on this terminal
        #[arg(long)]
        keys: bool,
    },

    /// Listen for leader-key sequences on this terminal
    Listen,

    /// Create ai/ in the current directory
    Init {
        /// Recreate ai/ if it already exists
        #[arg(long)]
        force: bool,
    },

    /// Show how the prompt is tokenized and which calls validated
    Tokens {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List prompt history snapshots, newest first
    History {
        /// Print the Nth newest snapshot (1 = newest)
        #[arg(long, value_name = "N")]
        show: Option<usize>,
    },
}

impl Default for Command {
    fn default() -> Self {
        Self::Run {
            no_copy: false,
            no_actions: false,
        }
    }
}

/// Result of checking an external tool
pub struct ToolCheck {
    pub name: &'static str,
    pub available: bool,
    pub version: Option<String>,
}

impl ToolCheck {
    /// Check if a tool is available and get its version
    pub fn check(name: &'static str, version_args: &[&str]) -> Self {
        debug!(name, ?version_args, "ToolCheck::check: called");
        match std::process::Command::new(name).args(version_args).output() {
            Ok(output) if output.status.success() => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                Self {
                    name,
                    available: true,
                    version: Some(parse_version(&text)),
                }
            }
            _ => {
                debug!(name, "ToolCheck::check: tool not available");
                Self {
                    name,
                    available: false,
                    version: None,
                }
            }
        }
    }
}

/// Extract the first version-like word (`1.2.3` or `v1.2.3`)
fn parse_version(output: &str) -> String {
    for word in output.split_whitespace() {
        let word = word.trim_start_matches('v');
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let version: String = word.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
            if !version.is_empty() {
                return version;
            }
        }
    }
    "unknown".to_string()
}

/// Clipboard and automation helpers for this platform
pub fn check_platform_tools() -> Vec<ToolCheck> {
    debug!("check_platform_tools: called");
    if cfg!(target_os = "macos") {
        vec![ToolCheck::check("cliclick", &["-V"]), ToolCheck::check("pbcopy", &["-help"])]
    } else {
        vec![
            ToolCheck::check("xdotool", &["version"]),
            ToolCheck::check("xclip", &["-version"]),
            ToolCheck::check("wl-copy", &["--version"]),
        ]
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aic")
        .join("logs")
        .join("aic.log")
}

/// Generate the after_help text with tool checks
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::from("Platform Tools:\n");
    for tool in check_platform_tools() {
        let icon = if tool.available { "\u{2705}" } else { "\u{274C}" };
        let version = tool.version.as_deref().unwrap_or("not found");
        help.push_str(&format!("  {} {:<10} {}\n", icon, tool.name, version));
    }
    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for `aic tokens`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
