//! Prompt token language
//!
//! Text flows through three stages: [`scan`] splits it into tokens,
//! [`validate_or_downgrade`] decides which `$name(...)` calls are real, and
//! [`render`] expands them into output text plus queued post-actions.

mod args;
mod document;
mod scanner;
mod token;

pub use args::{Arg, ArgError, parse_args, parse_quoted_prefix};
pub use document::{
    BoundToken, Rendered, TokenReport, Validated, ValidatedCall, ValidatedDocument, render, validate_or_downgrade,
};
pub use scanner::scan;
pub use token::Token;

use tracing::debug;

use crate::commands::{CommandContext, CommandError, CommandRegistry};

/// Scanner, registry and context bundled for one project
#[derive(Debug, Clone)]
pub struct Interpreter {
    registry: CommandRegistry,
    ctx: CommandContext,
}

impl Interpreter {
    pub fn new(registry: CommandRegistry, ctx: CommandContext) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    /// Scan and validate text
    pub fn parse(&self, text: &str) -> ValidatedDocument {
        debug!(len = text.len(), "Interpreter::parse: called");
        validate_or_downgrade(scan(text), &self.registry, &self.ctx)
    }

    /// Render a validated document against this interpreter's context
    pub async fn render(&self, doc: &ValidatedDocument) -> Result<Rendered, CommandError> {
        render(doc, &self.ctx).await
    }

    /// Scan, validate and render in one step
    pub async fn render_text(&self, text: &str) -> Result<Rendered, CommandError> {
        let doc = self.parse(text);
        self.render(&doc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_render_text_plain() {
        let temp = tempdir().unwrap();
        let interp = Interpreter::new(CommandRegistry::standard(), CommandContext::new(temp.path().to_path_buf()));
        let out = interp.render_text("nothing to expand").await.unwrap();
        assert_eq!(out.output, "nothing to expand");
        assert!(out.actions.is_empty());
    }
}
