//! Command error types

use std::path::PathBuf;
use thiserror::Error;

use crate::prompt::ArgError;

/// Errors raised while validating or rendering a command
///
/// Validation errors downgrade the call to raw text. Render errors abort the
/// whole render.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: ${name}")]
    UnknownCommand { name: String },

    #[error("${name} was not written as a call")]
    NotACall { name: String },

    #[error("bad arguments: {0}")]
    Args(#[from] ArgError),

    #[error("${name} expects {expected}")]
    Usage { name: &'static str, expected: &'static str },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("absolute paths are not allowed: {0}")]
    AbsolutePath(String),

    #[error("path {path} escapes project root {root}")]
    SandboxViolation { path: PathBuf, root: PathBuf },

    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    #[error("no skills directory configured")]
    NoSkillsDir,

    #[error("invalid url {url}: {reason}")]
    BadUrl { url: String, reason: String },

    #[error("${name} cannot render this call")]
    CallMismatch { name: &'static str },

    #[error("command name already registered: {name}")]
    DuplicateCommand { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
