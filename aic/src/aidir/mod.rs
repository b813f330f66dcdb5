//! The `ai/` project directory
//!
//! ```text
//! <project>/
//!   ai/
//!     prompt.md     the prompt document
//!     skills/       *.md documents for $skill(...)
//!     rules/        always appended to the output unless $norules()
//!     vars/         KEY=VALUE host variables
//!     prompts/      history snapshots
//! ```

mod files;
mod ignore;
mod layout;

pub mod history;
pub mod vars;

pub use files::{ReadStats, collect_files, read_text_file, render_files};
pub use ignore::IgnoreRules;
pub use layout::{DEFAULT_HEADER, PROMPT_MARKER, Sections, clear_body, split_sections, strip_comments};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::actions::{ActionError, PromptClearer};

/// Errors from locating or managing the `ai/` directory
#[derive(Debug, Error)]
pub enum AiDirError {
    #[error("no ai/ directory found from {start} (searched upward)")]
    NotFound { start: PathBuf },

    #[error("ai/ already exists at {path} (use --force to recreate)")]
    AlreadyExists { path: PathBuf },

    #[error("{path} exists but is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("could not choose a unique snapshot filename")]
    SnapshotName,

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AiDirError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

const SUBDIRS: [&str; 4] = ["skills", "rules", "vars", "prompts"];

/// A project root holding an `ai/` directory
#[derive(Debug, Clone)]
pub struct AiDir {
    root: PathBuf,
}

impl AiDir {
    /// Create `ai/` under `project` with a default prompt document
    ///
    /// An existing `ai/` is an error unless `force` is set, in which case it
    /// is removed and recreated.
    pub fn init(project: &Path, force: bool) -> Result<Self, AiDirError> {
        debug!(?project, force, "AiDir::init: called");
        let root = project.canonicalize().map_err(|e| AiDirError::io(project, e))?;
        let ai = root.join("ai");

        if let Ok(meta) = fs::symlink_metadata(&ai) {
            if !meta.is_dir() {
                return Err(AiDirError::NotADirectory { path: ai });
            }
            if !force {
                return Err(AiDirError::AlreadyExists { path: ai });
            }
            debug!("AiDir::init: removing existing ai dir");
            fs::remove_dir_all(&ai).map_err(|e| AiDirError::io(&ai, e))?;
        }

        fs::create_dir_all(&ai).map_err(|e| AiDirError::io(&ai, e))?;
        let dir = Self { root };
        dir.ensure_subdirs()?;
        fs::write(dir.prompt_path(), DEFAULT_HEADER).map_err(|e| AiDirError::io(&dir.prompt_path(), e))?;
        Ok(dir)
    }

    /// Find the nearest ancestor of the working directory holding `ai/`
    pub fn open() -> Result<Self, AiDirError> {
        let cwd = std::env::current_dir().map_err(|e| AiDirError::io(Path::new("."), e))?;
        Self::open_from(&cwd)
    }

    /// Find the nearest ancestor of `start` (inclusive) holding `ai/`
    pub fn open_from(start: &Path) -> Result<Self, AiDirError> {
        debug!(?start, "AiDir::open_from: called");
        let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());

        for dir in start.ancestors() {
            let ai = dir.join("ai");
            if fs::symlink_metadata(&ai).is_ok_and(|m| m.is_dir()) {
                debug!(?dir, "AiDir::open_from: found project root");
                let found = Self { root: dir.to_path_buf() };
                found.ensure_subdirs()?;
                return Ok(found);
            }
        }
        Err(AiDirError::NotFound { start })
    }

    fn ensure_subdirs(&self) -> Result<(), AiDirError> {
        for sub in SUBDIRS {
            let path = self.ai_dir().join(sub);
            fs::create_dir_all(&path).map_err(|e| AiDirError::io(&path, e))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ai_dir(&self) -> PathBuf {
        self.root.join("ai")
    }

    pub fn prompt_path(&self) -> PathBuf {
        self.ai_dir().join("prompt.md")
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.ai_dir().join("skills")
    }

    pub fn rules_dir(&self) -> PathBuf {
        self.ai_dir().join("rules")
    }

    pub fn vars_dir(&self) -> PathBuf {
        self.ai_dir().join("vars")
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.ai_dir().join("prompts")
    }

    /// Prompt text with CRLF normalized; a missing file reads as the default header
    pub fn read_prompt(&self) -> Result<String, AiDirError> {
        let path = self.prompt_path();
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text.replace("\r\n", "\n")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DEFAULT_HEADER.to_string()),
            Err(e) => Err(AiDirError::io(&path, e)),
        }
    }

    /// Rewrite the prompt keeping only its context section
    pub fn clear_prompt_body(&self) -> Result<(), AiDirError> {
        let path = self.prompt_path();
        let current = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(AiDirError::io(&path, e)),
        };
        let cleared = clear_body(&current);
        debug!(?path, "AiDir::clear_prompt_body: writing cleared prompt");
        fs::write(&path, cleared).map_err(|e| AiDirError::io(&path, e))
    }

    pub fn load_ignore(&self) -> IgnoreRules {
        IgnoreRules::load(&self.root)
    }

    pub fn load_vars(&self) -> Result<HashMap<String, String>, AiDirError> {
        let dir = self.vars_dir();
        vars::load_vars(&dir).map_err(|e| AiDirError::io(&dir, e))
    }

    /// Every readable file under `ai/rules` as `FILE: <path>` blocks
    pub fn rules_text(&self, ignore: &IgnoreRules) -> Result<String, AiDirError> {
        let dir = self.rules_dir();
        if !dir.is_dir() {
            return Ok(String::new());
        }

        let mut out = String::new();
        for path in collect_files(&self.root, &dir, ignore) {
            let Some(content) = read_text_file(&path).map_err(|e| AiDirError::io(&path, e))? else {
                continue;
            };
            out.push_str(&format!("FILE: {}\n{}", path.display(), content));
            if !content.ends_with('\n') {
                out.push('\n');
            }
        }
        Ok(out)
    }

    pub fn stash_prompt(&self, raw: &str, max_entries: usize) -> Result<PathBuf, AiDirError> {
        history::stash(&self.prompts_dir(), raw, max_entries)
    }

    pub fn history(&self) -> Result<Vec<PathBuf>, AiDirError> {
        history::list(&self.prompts_dir())
    }
}

impl PromptClearer for AiDir {
    fn clear_prompt(&self) -> Result<(), ActionError> {
        self.clear_prompt_body().map_err(|e| ActionError::Clear(e.to_string()))
    }
}
