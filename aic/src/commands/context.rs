//! CommandContext - host facts commands validate and render against

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::CommandError;
use crate::aidir::IgnoreRules;
use crate::config::{HttpConfig, ShellConfig};

/// Execution context for commands - scoped to one project root
///
/// Every file a command touches must resolve under `root`.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Project root (the directory holding `ai/`)
    pub root: PathBuf,

    /// `ai/skills`, when present
    pub skills_dir: Option<PathBuf>,

    /// Ignore rules applied while walking included directories
    pub ignore: IgnoreRules,

    pub shell: ShellConfig,

    pub http: HttpConfig,
}

impl CommandContext {
    /// Create a context with default limits and no ignore rules
    pub fn new(root: PathBuf) -> Self {
        debug!(?root, "CommandContext::new: called");
        Self {
            root,
            skills_dir: None,
            ignore: IgnoreRules::default(),
            shell: ShellConfig::default(),
            http: HttpConfig::default(),
        }
    }

    pub fn with_skills_dir(mut self, dir: PathBuf) -> Self {
        self.skills_dir = Some(dir);
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreRules) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_shell(mut self, shell: ShellConfig) -> Self {
        self.shell = shell;
        self
    }

    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Canonical project root, falling back to the configured path
    pub fn canonical_root(&self) -> PathBuf {
        self.root.canonicalize().unwrap_or_else(|_| self.root.clone())
    }

    /// Resolve user-supplied path segments to an existing path under the root
    ///
    /// A single `.` or `*` means the root itself. Absolute segments are
    /// rejected. Symlinks are resolved before the containment check.
    pub fn validate_path(&self, segments: &[String]) -> Result<PathBuf, CommandError> {
        debug!(?segments, "CommandContext::validate_path: called");

        if let [only] = segments
            && (only == "." || only == "*")
        {
            debug!("CommandContext::validate_path: root shorthand");
            return Ok(self.canonical_root());
        }

        let mut relative = PathBuf::new();
        for seg in segments {
            let p = Path::new(seg);
            if p.is_absolute() || p.components().any(|c| matches!(c, Component::Prefix(_) | Component::RootDir)) {
                debug!(%seg, "CommandContext::validate_path: absolute segment");
                return Err(CommandError::AbsolutePath(seg.clone()));
            }
            relative.push(p);
        }

        let joined = self.root.join(&relative);
        if !joined.exists() {
            debug!(?joined, "CommandContext::validate_path: target does not exist");
            return Err(CommandError::NotFound { path: joined });
        }

        let canonical = joined.canonicalize()?;
        let root = self.canonical_root();
        if canonical.starts_with(&root) {
            debug!("CommandContext::validate_path: path is within root");
            Ok(canonical)
        } else {
            debug!("CommandContext::validate_path: sandbox violation detected");
            Err(CommandError::SandboxViolation { path: relative, root })
        }
    }
}
