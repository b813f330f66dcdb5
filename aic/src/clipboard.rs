//! Clipboard access

use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: &'static str, status: String },
}

/// Destination for rendered prompts
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard backed by the platform's copy utility
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    program: &'static str,
    args: &'static [&'static str],
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::detect()
    }
}

impl SystemClipboard {
    /// `pbcopy` on macOS, `wl-copy` under Wayland, `xclip` otherwise
    pub fn detect() -> Self {
        let clip = if cfg!(target_os = "macos") {
            Self {
                program: "pbcopy",
                args: &[],
            }
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self {
                program: "wl-copy",
                args: &[],
            }
        } else {
            Self {
                program: "xclip",
                args: &["-selection", "clipboard"],
            }
        };
        debug!(program = clip.program, "SystemClipboard::detect: called");
        clip
    }

    pub fn program(&self) -> &'static str {
        self.program
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        debug!(program = self.program, len = text.len(), "SystemClipboard::write_text: called");
        let program = self.program;
        let mut child = tokio::process::Command::new(program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ClipboardError::Spawn { program, source })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|source| ClipboardError::Spawn { program, source })?;
        }

        let status = child
            .wait()
            .await
            .map_err(|source| ClipboardError::Spawn { program, source })?;
        if !status.success() {
            return Err(ClipboardError::Failed {
                program,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
