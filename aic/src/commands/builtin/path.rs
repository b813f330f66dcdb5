//! path command - include project files

use async_trait::async_trait;
use tracing::debug;

use crate::aidir::{collect_files, render_files};
use crate::commands::{Call, CommandContext, CommandError, CommandHandler, RenderScope};
use crate::prompt::Arg;

/// Include a file or directory from the project root
///
/// Registered as both `path` and `at`.
pub struct PathCommand {
    name: &'static str,
}

impl PathCommand {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl CommandHandler for PathCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn usage(&self) -> &'static str {
        "$path(\"dir\", \"file\", ...) - include files under the project root (\".\" for everything)"
    }

    fn validate(&self, args: &[Arg], ctx: &CommandContext) -> Result<Call, CommandError> {
        debug!(name = self.name, ?args, "PathCommand::validate: called");
        if args.is_empty() {
            return Err(CommandError::Usage {
                name: self.name,
                expected: "at least one path string",
            });
        }

        let mut segments = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Str(s) if !s.is_empty() => segments.push(s.clone()),
                _ => {
                    return Err(CommandError::Usage {
                        name: self.name,
                        expected: "non-empty path strings",
                    });
                }
            }
        }

        let target = ctx.validate_path(&segments)?;
        Ok(Call::Include { target })
    }

    async fn render(&self, call: &Call, ctx: &CommandContext, _scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        let Call::Include { target } = call else {
            return Err(CommandError::CallMismatch { name: self.name });
        };
        debug!(?target, "PathCommand::render: called");

        let root = ctx.canonical_root();
        let files = collect_files(&root, target, &ctx.ignore);
        Ok(render_files(&files)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Phase;
    use crate::aidir::IgnoreRules;
    use std::fs;
    use tempfile::tempdir;

    fn strs(parts: &[&str]) -> Vec<Arg> {
        parts.iter().map(|s| Arg::Str(s.to_string())).collect()
    }

    #[tokio::test]
    async fn test_include_single_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "hello").unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        let cmd = PathCommand::new("path");

        let call = cmd.validate(&strs(&["notes.txt"]), &ctx).unwrap();
        let mut actions = Vec::new();
        let mut scope = RenderScope::new(0, "$path(\"notes.txt\")", Phase::After, &mut actions);
        let out = cmd.render(&call, &ctx, &mut scope).await.unwrap();

        let abs = temp.path().canonicalize().unwrap().join("notes.txt");
        assert_eq!(
            out,
            format!("FILE: {}\nhello\n\nread [1 files] [1 lines] [5 characters]\n", abs.display())
        );
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_include_root_applies_ignore() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("build")).unwrap();
        fs::write(temp.path().join("a.rs"), "a").unwrap();
        fs::write(temp.path().join("build/out.rs"), "b").unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf()).with_ignore(IgnoreRules::parse("build/\n"));
        let cmd = PathCommand::new("at");

        let call = cmd.validate(&strs(&["."]), &ctx).unwrap();
        let mut actions = Vec::new();
        let mut scope = RenderScope::new(0, "$at(\".\")", Phase::After, &mut actions);
        let out = cmd.render(&call, &ctx, &mut scope).await.unwrap();

        assert!(out.contains("a.rs"));
        assert!(!out.contains("out.rs"));
        assert!(out.ends_with("read [1 files] [1 lines] [1 characters]\n"));
    }

    #[test]
    fn test_validate_rejections() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        let cmd = PathCommand::new("path");

        assert!(cmd.validate(&[], &ctx).is_err());
        assert!(cmd.validate(&[Arg::Int(3)], &ctx).is_err());
        assert!(cmd.validate(&strs(&["missing.txt"]), &ctx).is_err());
        assert!(matches!(
            cmd.validate(&strs(&["/etc"]), &ctx),
            Err(CommandError::AbsolutePath(_))
        ));
    }
}
