//! PromptPipeline - one pass from prompt document to clipboard
//!
//! A pass reads `ai/prompt.md`, strips comment lines, renders the context
//! section and the prompt body, assembles the labelled output, and then
//! runs side effects in a fixed order: `Before` actions, clipboard write,
//! history snapshot, `After` actions.

use eyre::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::actions::{Automation, ExecutionReport, Phase, PostAction, PostActionExecutor};
use crate::aidir::{AiDir, split_sections, strip_comments};
use crate::clipboard::Clipboard;
use crate::commands::{Call, CommandContext, CommandRegistry};
use crate::config::Config;
use crate::prompt::{ValidatedDocument, render, scan, validate_or_downgrade};

/// Variables holding the pointer position at the start of a pass
pub const X_START_VAR: &str = "AIC_X_START";
pub const Y_START_VAR: &str = "AIC_Y_START";

/// Switches for one pipeline
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Write the output to the clipboard
    pub copy: bool,
    /// Execute queued post-actions
    pub run_actions: bool,
    /// Skip passes whose prompt body is blank
    pub skip_empty_body: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            copy: true,
            run_actions: true,
            skip_empty_body: false,
        }
    }
}

/// Result of one pass
#[derive(Debug, Clone, Default)]
pub struct PassOutcome {
    /// The body was blank and the pass did nothing
    pub skipped: bool,
    pub output: String,
    pub actions: Vec<PostAction>,
    pub copied: bool,
    pub snapshot: Option<PathBuf>,
    pub before: ExecutionReport,
    pub after: ExecutionReport,
}

/// Join the labelled output sections
///
/// Without context or rules the trimmed body is returned unlabelled.
pub fn assemble_output(context: &str, rules: &str, body: &str) -> String {
    let mut blocks = Vec::new();
    if !context.trim().is_empty() {
        blocks.push(format!("=== CONTEXT ===\n{}", context.trim()));
    }
    if !rules.trim().is_empty() {
        blocks.push(format!("=== RULES ===\n{}", rules.trim()));
    }
    if blocks.is_empty() {
        return body.trim().to_string();
    }
    blocks.push(format!("=== PROMPT ===\n{}", body.trim()));
    blocks.join("\n\n")
}

pub struct PromptPipeline {
    dir: AiDir,
    config: Config,
    registry: CommandRegistry,
    clipboard: Arc<dyn Clipboard>,
    automation: Arc<dyn Automation>,
    options: PipelineOptions,
}

impl PromptPipeline {
    pub fn new(dir: AiDir, config: Config, clipboard: Arc<dyn Clipboard>, automation: Arc<dyn Automation>) -> Self {
        debug!(root = ?dir.root(), "PromptPipeline::new: called");
        Self {
            dir,
            config,
            registry: CommandRegistry::standard(),
            clipboard,
            automation,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn dir(&self) -> &AiDir {
        &self.dir
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Command context for the current state of the project
    pub fn command_context(&self) -> CommandContext {
        CommandContext::new(self.dir.root().to_path_buf())
            .with_skills_dir(self.dir.skills_dir())
            .with_ignore(self.dir.load_ignore())
            .with_shell(self.config.shell.clone())
            .with_http(self.config.http.clone())
    }

    /// Validate the document's two sections
    ///
    /// Context automation runs `Before` the clipboard write; body automation
    /// runs `After`. Body indices continue after the context's.
    pub fn parse(&self, text: &str, ctx: &CommandContext) -> (ValidatedDocument, ValidatedDocument) {
        let stripped = strip_comments(text);
        let sections = split_sections(&stripped);

        let context = validate_or_downgrade(scan(sections.context.unwrap_or("")), &self.registry, ctx)
            .in_phase(Phase::Before);
        let body = validate_or_downgrade(scan(sections.body), &self.registry, ctx)
            .in_phase(Phase::After)
            .with_base_index(context.len());
        (context, body)
    }

    /// Run one full pass
    pub async fn run_once(&self) -> Result<PassOutcome> {
        debug!("PromptPipeline::run_once: called");
        let raw = self.dir.read_prompt().context("Failed to read prompt")?;
        let ctx = self.command_context();
        let (context_doc, body_doc) = self.parse(&raw, &ctx);

        let body_blank = body_doc.items().iter().all(|i| i.literal().trim().is_empty());
        if self.options.skip_empty_body && body_blank {
            debug!("PromptPipeline::run_once: prompt body is empty, skipping");
            return Ok(PassOutcome {
                skipped: true,
                ..Default::default()
            });
        }

        let context_out = render(&context_doc, &ctx).await.context("Failed to render context")?;
        let body_out = render(&body_doc, &ctx).await.context("Failed to render prompt")?;

        let no_rules = [&context_doc, &body_doc]
            .iter()
            .any(|doc| doc.has_call(|c| matches!(c, Call::NoRules)));
        let rules = if no_rules {
            debug!("PromptPipeline::run_once: rules suppressed");
            String::new()
        } else {
            self.dir.rules_text(&ctx.ignore).context("Failed to read rules")?
        };

        let output = assemble_output(&context_out.output, &rules, &body_out.output);
        let mut actions = context_out.actions;
        actions.extend(body_out.actions);

        let mut outcome = PassOutcome {
            output,
            actions,
            ..Default::default()
        };

        let run_actions = self.options.run_actions && !outcome.actions.is_empty();
        let vars = if run_actions { self.snapshot_vars().await } else { HashMap::new() };
        let executor = PostActionExecutor::new(self.automation.clone(), self.config.actions.step_delay())
            .with_clearer(Arc::new(self.dir.clone()));

        if run_actions {
            outcome.before = executor.execute(&outcome.actions, Phase::Before, &vars).await;
        }

        if self.options.copy {
            self.clipboard
                .write_text(&outcome.output)
                .await
                .context("Failed to write clipboard")?;
            outcome.copied = true;
            info!(chars = outcome.output.len(), "copied output to clipboard");

            match self.dir.stash_prompt(&raw, self.config.history.max_entries) {
                Ok(path) => outcome.snapshot = Some(path),
                Err(e) => warn!(error = %e, "failed to stash prompt history"),
            }
        }

        // After actions (clear included) need a successful clipboard write
        if run_actions && outcome.copied {
            outcome.after = executor.execute(&outcome.actions, Phase::After, &vars).await;
        } else if run_actions {
            debug!("PromptPipeline::run_once: nothing copied, skipping after actions");
        }

        Ok(outcome)
    }

    /// Host variables from `ai/vars` plus the starting pointer position
    async fn snapshot_vars(&self) -> HashMap<String, String> {
        let mut vars = match self.dir.load_vars() {
            Ok(vars) => vars,
            Err(e) => {
                warn!(error = %e, "failed to load vars");
                HashMap::new()
            }
        };
        match self.automation.mouse_position().await {
            Ok((x, y)) => {
                vars.insert(X_START_VAR.to_string(), x.to_string());
                vars.insert(Y_START_VAR.to_string(), y.to_string());
            }
            Err(e) => debug!(error = %e, "PromptPipeline::snapshot_vars: pointer position unavailable"),
        }
        vars
    }
}
