//! aic - prompt token interpreter and leader-key sequencer
//!
//! aic turns a hand-edited prompt document (`ai/prompt.md`) into an
//! expanded payload on the clipboard. `$name(args)` calls embedded in the
//! text pull in files, command output, HTTP responses and skill documents,
//! or queue mouse/keyboard actions that run around the clipboard write.
//!
//! # Modules
//!
//! - [`prompt`] - scanner, argument grammar, validation and rendering
//! - [`commands`] - the `$call` registry and built-in handlers
//! - [`actions`] - post-actions and the automation backends that run them
//! - [`aidir`] - the `ai/` project directory: layout, rules, vars, history
//! - [`pipeline`] - one render pass from document to clipboard
//! - [`watcher`] - re-run the pipeline on document changes
//! - [`sequence`] - leader-key sequence matching and dispatch
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod actions;
pub mod aidir;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod keys;
pub mod pipeline;
pub mod prompt;
pub mod sequence;
pub mod watcher;

// Re-export commonly used types
pub use actions::{ActionKind, Automation, Phase, PostAction, PostActionExecutor, SystemAutomation};
pub use aidir::{AiDir, AiDirError};
pub use clipboard::{Clipboard, SystemClipboard};
pub use commands::{Call, CommandContext, CommandError, CommandHandler, CommandRegistry};
pub use config::Config;
pub use pipeline::{PassOutcome, PipelineOptions, PromptPipeline};
pub use prompt::{Interpreter, Rendered, Token, ValidatedDocument, render, scan, validate_or_downgrade};
pub use sequence::{Sequence, SequenceHandle, SequenceListener, SequenceMatcher, SequenceRegistry};
pub use watcher::{PromptWatcher, WatchEvent};
