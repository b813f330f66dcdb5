//! sh command - run a shell command and include its output

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

use crate::commands::{Call, CommandContext, CommandError, CommandHandler, RenderScope, one_string};
use crate::prompt::Arg;

const MAX_COMMAND_BYTES: usize = 4096;
const TRUNCATION_MARKER: &str = "\n...[truncated]\n";

/// Execute a shell command in the project root
///
/// Registered as both `sh` and `shell`.
pub struct ShellCommand {
    name: &'static str,
}

impl ShellCommand {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl CommandHandler for ShellCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn usage(&self) -> &'static str {
        "$sh(\"command\") - run a shell command in the project root and include its output"
    }

    fn validate(&self, args: &[Arg], _ctx: &CommandContext) -> Result<Call, CommandError> {
        debug!(name = self.name, ?args, "ShellCommand::validate: called");
        let command = one_string(self.name, args)?;
        if command.contains('\0') {
            return Err(CommandError::InvalidArgument("command contains a NUL byte".to_string()));
        }
        if command.len() > MAX_COMMAND_BYTES {
            return Err(CommandError::InvalidArgument(format!(
                "command longer than {} bytes",
                MAX_COMMAND_BYTES
            )));
        }
        Ok(Call::Shell {
            command: command.to_string(),
        })
    }

    async fn render(&self, call: &Call, ctx: &CommandContext, _scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        let Call::Shell { command } = call else {
            return Err(CommandError::CallMismatch { name: self.name });
        };
        debug!(%command, "ShellCommand::render: called");

        let timeout = ctx.shell.timeout();
        let child = tokio::process::Command::new(&ctx.shell.program)
            .arg("-c")
            .arg(format!("exec 2>&1\n{}", command))
            .current_dir(&ctx.root)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => {
                debug!(status = ?output.status, "ShellCommand::render: command completed");
                output
            }
            Ok(Err(e)) => {
                debug!(%e, "ShellCommand::render: failed to spawn");
                return Ok(format!("sh ERROR: {}\nCMD: {}\n", e, command));
            }
            Err(_) => {
                debug!("ShellCommand::render: command timed out");
                return Ok(format!(
                    "sh ERROR: timeout after {}\nCMD: {}\n",
                    format_timeout(timeout),
                    command
                ));
            }
        };

        let mut out = output.stdout;
        let text = is_text(&out);
        if out.len() > ctx.shell.max_output_bytes {
            debug!(len = out.len(), text, "ShellCommand::render: truncating output");
            let cut = if text {
                floor_char_boundary(&out, ctx.shell.max_output_bytes)
            } else {
                ctx.shell.max_output_bytes
            };
            out.truncate(cut);
            out.extend_from_slice(TRUNCATION_MARKER.as_bytes());
        }

        if output.status.success() {
            return Ok(render_output(command, &out, text));
        }

        let status = match output.status.code() {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        debug!(%status, "ShellCommand::render: command failed");
        let mut rendered = format!("sh ERROR: {}\nCMD: {}\n", status, command);
        if !out.is_empty() {
            rendered.push_str(&render_output(command, &out, text));
            if !rendered.ends_with('\n') {
                rendered.push('\n');
            }
        }
        Ok(rendered)
    }
}

/// Valid UTF-8 without NUL bytes
fn is_text(out: &[u8]) -> bool {
    !out.contains(&0) && std::str::from_utf8(out).is_ok()
}

/// Largest cut at or below `max` that does not split a UTF-8 sequence
fn floor_char_boundary(out: &[u8], max: usize) -> usize {
    let mut cut = max.min(out.len());
    while cut > 0 && cut < out.len() && (out[cut] & 0b1100_0000) == 0b1000_0000 {
        cut -= 1;
    }
    cut
}

/// Text output is returned with CRLF normalized; anything else is base64
fn render_output(command: &str, out: &[u8], is_text: bool) -> String {
    if is_text {
        String::from_utf8_lossy(out).replace("\r\n", "\n")
    } else {
        format!("sh OUTPUT (base64)\nCMD: {}\n{}\n", command, STANDARD.encode(out))
    }
}

fn format_timeout(d: Duration) -> String {
    let ms = d.as_millis();
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Phase;
    use crate::config::ShellConfig;
    use tempfile::tempdir;

    async fn run(ctx: &CommandContext, command: &str) -> String {
        let cmd = ShellCommand::new("sh");
        let call = cmd.validate(&[Arg::Str(command.to_string())], ctx).unwrap();
        let mut actions = Vec::new();
        let mut scope = RenderScope::new(0, "$sh(..)", Phase::After, &mut actions);
        cmd.render(&call, ctx, &mut scope).await.unwrap()
    }

    #[tokio::test]
    async fn test_basic_output() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        assert_eq!(run(&ctx, "echo hello").await, "hello\n");
    }

    #[tokio::test]
    async fn test_runs_in_project_root() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        assert_eq!(run(&ctx, "ls").await, "marker.txt\n");
    }

    #[tokio::test]
    async fn test_stderr_combined_with_stdout() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        let out = run(&ctx, "echo out; echo err >&2; echo out2").await;
        assert_eq!(out, "out\nerr\nout2\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        let out = run(&ctx, "echo oops; exit 3").await;
        assert_eq!(out, "sh ERROR: exit status 3\nCMD: echo oops; exit 3\noops\n");
    }

    #[tokio::test]
    async fn test_timeout() {
        let temp = tempdir().unwrap();
        let shell = ShellConfig {
            timeout_ms: 100,
            ..Default::default()
        };
        let ctx = CommandContext::new(temp.path().to_path_buf()).with_shell(shell);
        let out = run(&ctx, "sleep 5").await;
        assert_eq!(out, "sh ERROR: timeout after 100ms\nCMD: sleep 5\n");
    }

    #[tokio::test]
    async fn test_output_truncated() {
        let temp = tempdir().unwrap();
        let shell = ShellConfig {
            max_output_bytes: 8,
            ..Default::default()
        };
        let ctx = CommandContext::new(temp.path().to_path_buf()).with_shell(shell);
        let out = run(&ctx, "printf 'abcdefghijklmnop'").await;
        assert_eq!(out, "abcdefgh\n...[truncated]\n");
    }

    #[tokio::test]
    async fn test_truncation_keeps_multibyte_text() {
        let temp = tempdir().unwrap();
        let shell = ShellConfig {
            max_output_bytes: 2,
            ..Default::default()
        };
        let ctx = CommandContext::new(temp.path().to_path_buf()).with_shell(shell);
        let out = run(&ctx, "printf 'a\\303\\251\\303\\251\\303\\251'").await;
        assert_eq!(out, "a\n...[truncated]\n");
    }

    #[test]
    fn test_floor_char_boundary() {
        let text = "aé€".as_bytes();
        assert_eq!(floor_char_boundary(text, 0), 0);
        assert_eq!(floor_char_boundary(text, 1), 1);
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(floor_char_boundary(text, 3), 3);
        assert_eq!(floor_char_boundary(text, 4), 3);
        assert_eq!(floor_char_boundary(text, 5), 3);
        assert_eq!(floor_char_boundary(text, 6), 6);
        assert_eq!(floor_char_boundary(text, 99), 6);
    }

    #[tokio::test]
    async fn test_binary_output_base64() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        let out = run(&ctx, "printf 'a\\000b'").await;
        assert_eq!(out, format!("sh OUTPUT (base64)\nCMD: printf 'a\\000b'\n{}\n", STANDARD.encode(b"a\0b")));
    }

    #[test]
    fn test_validate_rejects_bad_commands() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        let cmd = ShellCommand::new("shell");

        assert!(cmd.validate(&[], &ctx).is_err());
        assert!(cmd.validate(&[Arg::Str(String::new())], &ctx).is_err());
        assert!(cmd.validate(&[Arg::Str("a\0b".into())], &ctx).is_err());
        assert!(cmd.validate(&[Arg::Str("x".repeat(4097))], &ctx).is_err());
        assert!(cmd.validate(&[Arg::Str("ls".into()), Arg::Str("-la".into())], &ctx).is_err());
    }

    #[test]
    fn test_format_timeout() {
        assert_eq!(format_timeout(Duration::from_secs(2)), "2s");
        assert_eq!(format_timeout(Duration::from_millis(1500)), "1500ms");
    }
}
