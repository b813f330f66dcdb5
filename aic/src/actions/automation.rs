//! Mouse and keyboard synthesis backends

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::MouseButton;
use crate::keys::{self, Modifier};

/// Errors raised while executing a post-action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {message}")]
    Backend { program: &'static str, message: String },

    #[error("could not parse pointer position from {0:?}")]
    Position(String),

    #[error("variable {0} is not defined")]
    UndefinedVar(String),

    #[error("variable {name}={value:?} is not an integer")]
    NotAnInteger { name: String, value: String },

    #[error("failed to clear prompt: {0}")]
    Clear(String),
}

/// Synthesizes pointer and keyboard input
#[async_trait]
pub trait Automation: Send + Sync {
    async fn move_mouse(&self, x: i64, y: i64) -> Result<(), ActionError>;

    async fn click(&self, button: MouseButton) -> Result<(), ActionError>;

    /// Press and release one normalized key (see [`keys::normalize_key`])
    async fn press_key(&self, key: &str) -> Result<(), ActionError>;

    /// Type text while holding `modifiers`, pausing `delay` between characters
    async fn type_text(&self, text: &str, modifiers: &[Modifier], delay: Duration) -> Result<(), ActionError>;

    async fn mouse_position(&self) -> Result<(i64, i64), ActionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Xdotool,
    Cliclick,
}

impl Backend {
    fn program(&self) -> &'static str {
        match self {
            Self::Xdotool => "xdotool",
            Self::Cliclick => "cliclick",
        }
    }
}

/// Automation through `xdotool` (Linux/X11) or `cliclick` (macOS)
#[derive(Debug, Clone)]
pub struct SystemAutomation {
    backend: Backend,
}

impl Default for SystemAutomation {
    fn default() -> Self {
        Self::detect()
    }
}

impl SystemAutomation {
    /// Pick the backend for the current platform
    pub fn detect() -> Self {
        let backend = if cfg!(target_os = "macos") {
            Backend::Cliclick
        } else {
            Backend::Xdotool
        };
        debug!(?backend, "SystemAutomation::detect: called");
        Self { backend }
    }

    pub fn program(&self) -> &'static str {
        self.backend.program()
    }

    async fn run(&self, args: &[String]) -> Result<String, ActionError> {
        let program = self.backend.program();
        debug!(program, ?args, "SystemAutomation::run: called");
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| ActionError::Spawn { program, source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(status = ?output.status, %stderr, "SystemAutomation::run: backend failed");
            return Err(ActionError::Backend {
                program,
                message: if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                },
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Automation for SystemAutomation {
    async fn move_mouse(&self, x: i64, y: i64) -> Result<(), ActionError> {
        let args = match self.backend {
            Backend::Xdotool => vec!["mousemove".to_string(), x.to_string(), y.to_string()],
            Backend::Cliclick => vec![format!("m:{},{}", x, y)],
        };
        self.run(&args).await.map(|_| ())
    }

    async fn click(&self, button: MouseButton) -> Result<(), ActionError> {
        let args = match (self.backend, button) {
            (Backend::Xdotool, MouseButton::Left) => vec!["click".to_string(), "1".to_string()],
            (Backend::Xdotool, MouseButton::Right) => vec!["click".to_string(), "3".to_string()],
            (Backend::Cliclick, MouseButton::Left) => vec!["c:.".to_string()],
            (Backend::Cliclick, MouseButton::Right) => vec!["rc:.".to_string()],
        };
        self.run(&args).await.map(|_| ())
    }

    async fn press_key(&self, key: &str) -> Result<(), ActionError> {
        let args = match self.backend {
            Backend::Xdotool => vec!["key".to_string(), keys::xdotool_key(key)],
            Backend::Cliclick => match keys::cliclick_key(key) {
                Some(name) => vec![format!("kp:{}", name)],
                None => vec![format!("t:{}", key)],
            },
        };
        self.run(&args).await.map(|_| ())
    }

    async fn type_text(&self, text: &str, modifiers: &[Modifier], delay: Duration) -> Result<(), ActionError> {
        let delay_ms = delay.as_millis().to_string();
        let args = match self.backend {
            Backend::Xdotool => {
                let mut args = Vec::new();
                for m in modifiers {
                    args.extend(["keydown".to_string(), m.xdotool_name().to_string()]);
                }
                args.extend([
                    "type".to_string(),
                    "--delay".to_string(),
                    delay_ms,
                    "--".to_string(),
                    text.to_string(),
                ]);
                for m in modifiers.iter().rev() {
                    args.extend(["keyup".to_string(), m.xdotool_name().to_string()]);
                }
                args
            }
            Backend::Cliclick => {
                let mut args = vec!["-w".to_string(), delay_ms];
                if !modifiers.is_empty() {
                    let names: Vec<&str> = modifiers.iter().map(|m| m.cliclick_name()).collect();
                    args.push(format!("kd:{}", names.join(",")));
                }
                args.push(format!("t:{}", text));
                if !modifiers.is_empty() {
                    let names: Vec<&str> = modifiers.iter().map(|m| m.cliclick_name()).collect();
                    args.push(format!("ku:{}", names.join(",")));
                }
                args
            }
        };
        self.run(&args).await.map(|_| ())
    }

    async fn mouse_position(&self) -> Result<(i64, i64), ActionError> {
        match self.backend {
            Backend::Xdotool => {
                let out = self
                    .run(&["getmouselocation".to_string(), "--shell".to_string()])
                    .await?;
                parse_xdotool_location(&out).ok_or(ActionError::Position(out))
            }
            Backend::Cliclick => {
                let out = self.run(&["p:.".to_string()]).await?;
                parse_cliclick_position(&out).ok_or(ActionError::Position(out))
            }
        }
    }
}

/// Parse `X=..\nY=..` lines printed by `xdotool getmouselocation --shell`
fn parse_xdotool_location(out: &str) -> Option<(i64, i64)> {
    let mut x = None;
    let mut y = None;
    for line in out.lines() {
        if let Some(v) = line.strip_prefix("X=") {
            x = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("Y=") {
            y = v.trim().parse().ok();
        }
    }
    Some((x?, y?))
}

/// Parse `x,y` printed by `cliclick p:.`
fn parse_cliclick_position(out: &str) -> Option<(i64, i64)> {
    let (x, y) = out.trim().split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}
