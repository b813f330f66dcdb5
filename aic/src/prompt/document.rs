//! Validated documents and rendering
//!
//! Validation decides, once, which command tokens are real calls. Anything
//! that does not validate is downgraded to raw text carrying the identical
//! literal, so a bad call can never change the prompt's meaning.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::args::parse_args;
use super::token::Token;
use crate::actions::{Phase, PostAction};
use crate::commands::{Call, CommandContext, CommandError, CommandHandler, CommandRegistry, RenderScope};

/// A command token that passed validation
#[derive(Clone)]
pub struct ValidatedCall {
    pub literal: String,
    pub name: String,
    pub call: Call,
    handler: Arc<dyn CommandHandler>,
}

impl std::fmt::Debug for ValidatedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedCall")
            .field("literal", &self.literal)
            .field("name", &self.name)
            .field("call", &self.call)
            .finish()
    }
}

/// One token of a validated document
#[derive(Debug, Clone)]
pub enum Validated {
    Raw(String),
    Escaped(String),
    Call(ValidatedCall),
}

impl Validated {
    pub fn literal(&self) -> &str {
        match self {
            Self::Raw(s) | Self::Escaped(s) => s,
            Self::Call(c) => &c.literal,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Escaped(_) => "escaped",
            Self::Call(_) => "call",
        }
    }
}

/// A read-only view of one token with access to its neighbours
#[derive(Debug, Clone, Copy)]
pub struct BoundToken<'a> {
    doc: &'a ValidatedDocument,
    index: usize,
}

impl<'a> BoundToken<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn token(&self) -> &'a Validated {
        &self.doc.items[self.index]
    }

    pub fn prev(&self) -> Option<BoundToken<'a>> {
        self.index.checked_sub(1).and_then(|i| self.doc.bound(i))
    }

    pub fn next(&self) -> Option<BoundToken<'a>> {
        self.doc.bound(self.index + 1)
    }
}

/// Serializable summary of one validated token
#[derive(Debug, Serialize)]
pub struct TokenReport<'a> {
    pub index: usize,
    pub kind: &'static str,
    pub literal: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<&'a Call>,
}

/// Output of rendering a document
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub output: String,
    pub actions: Vec<PostAction>,
}

/// Tokens after validation, ready to render
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    items: Vec<Validated>,
    phase: Phase,
    base_index: usize,
}

impl ValidatedDocument {
    /// Queue automation from this document in `phase` (default `After`)
    pub fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Shift action indices so several documents order as one
    pub fn with_base_index(mut self, base: usize) -> Self {
        self.base_index = base;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Validated] {
        &self.items
    }

    pub fn bound(&self, index: usize) -> Option<BoundToken<'_>> {
        (index < self.items.len()).then_some(BoundToken { doc: self, index })
    }

    /// Whether any validated call matches `pred`
    pub fn has_call(&self, pred: impl Fn(&Call) -> bool) -> bool {
        self.items.iter().any(|item| matches!(item, Validated::Call(c) if pred(&c.call)))
    }

    /// Concatenated literals; always equals the scanned text
    pub fn source(&self) -> String {
        self.items.iter().map(Validated::literal).collect()
    }

    pub fn report(&self) -> Vec<TokenReport<'_>> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| TokenReport {
                index: self.base_index + i,
                kind: item.kind(),
                literal: item.literal(),
                call: match item {
                    Validated::Call(c) => Some(&c.call),
                    _ => None,
                },
            })
            .collect()
    }
}

/// Validate every command token, downgrading the ones that fail
pub fn validate_or_downgrade(tokens: Vec<Token>, registry: &CommandRegistry, ctx: &CommandContext) -> ValidatedDocument {
    debug!(count = tokens.len(), "validate_or_downgrade: called");
    let items = tokens
        .into_iter()
        .map(|token| match token {
            Token::Raw { literal } => Validated::Raw(literal),
            Token::Escaped { literal } => Validated::Escaped(literal),
            Token::Command {
                literal,
                name,
                args_raw,
            } => match validate_command(&name, args_raw.as_deref(), registry, ctx) {
                Ok((call, handler)) => Validated::Call(ValidatedCall {
                    literal,
                    name,
                    call,
                    handler,
                }),
                Err(reason) => {
                    debug!(%literal, %reason, "validate_or_downgrade: downgrading to raw");
                    Validated::Raw(literal)
                }
            },
        })
        .collect();

    ValidatedDocument {
        items,
        phase: Phase::After,
        base_index: 0,
    }
}

fn validate_command(
    name: &str,
    args_raw: Option<&str>,
    registry: &CommandRegistry,
    ctx: &CommandContext,
) -> Result<(Call, Arc<dyn CommandHandler>), CommandError> {
    let handler = registry.lookup(name).ok_or_else(|| CommandError::UnknownCommand {
        name: name.to_string(),
    })?;
    let raw = args_raw.ok_or_else(|| CommandError::NotACall { name: name.to_string() })?;
    let args = parse_args(raw)?;
    let call = handler.validate(&args, ctx)?;
    Ok((call, Arc::clone(handler)))
}

/// Render a validated document
///
/// Raw text passes through, escaped calls lose their backslash, and calls
/// render through their handler. The first handler error aborts the render.
pub async fn render(doc: &ValidatedDocument, ctx: &CommandContext) -> Result<Rendered, CommandError> {
    debug!(count = doc.items.len(), phase = %doc.phase, "render: called");
    let mut rendered = Rendered::default();

    for (i, item) in doc.items.iter().enumerate() {
        match item {
            Validated::Raw(text) => rendered.output.push_str(text),
            Validated::Escaped(text) => rendered.output.push_str(text.strip_prefix('\\').unwrap_or(text)),
            Validated::Call(vc) => {
                let mut scope = RenderScope::new(doc.base_index + i, &vc.literal, doc.phase, &mut rendered.actions);
                let text = vc.handler.render(&vc.call, ctx, &mut scope).await?;
                rendered.output.push_str(&text);
            }
        }
    }

    debug!(
        output_len = rendered.output.len(),
        actions = rendered.actions.len(),
        "render: complete"
    );
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionKind;
    use crate::prompt::scan;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, CommandRegistry, CommandContext) {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        (temp, CommandRegistry::standard(), ctx)
    }

    fn validate(text: &str, registry: &CommandRegistry, ctx: &CommandContext) -> ValidatedDocument {
        validate_or_downgrade(scan(text), registry, ctx)
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_calls_render_verbatim() {
        let (_t, registry, ctx) = setup();
        let text = r#"a $nope(1) b $sh() c $path("missing.txt") d $jump("x") e $HOME f"#;
        let doc = validate(text, &registry, &ctx);

        assert!(doc.items().iter().all(|i| !matches!(i, Validated::Call(_))));
        assert_eq!(doc.source(), text);
        let out = render(&doc, &ctx).await.unwrap();
        assert_eq!(out.output, text);
        assert!(out.actions.is_empty());
    }

    #[tokio::test]
    async fn test_escaped_call_drops_backslash() {
        let (_t, registry, ctx) = setup();
        let doc = validate(r#"use \$sh("ls") literally"#, &registry, &ctx);
        let out = render(&doc, &ctx).await.unwrap();
        assert_eq!(out.output, r#"use $sh("ls") literally"#);
    }

    #[tokio::test]
    async fn test_unterminated_call_is_raw() {
        let (_t, registry, ctx) = setup();
        let text = r#"x $sh("echo hi" y"#;
        let out = render(&validate(text, &registry, &ctx), &ctx).await.unwrap();
        assert_eq!(out.output, text);
    }

    #[tokio::test]
    async fn test_actions_indexed_and_phased() {
        let (_t, registry, ctx) = setup();
        let doc = validate("go $jump(1, 2) then $click() $clear()", &registry, &ctx)
            .in_phase(Phase::Before)
            .with_base_index(10);
        let out = render(&doc, &ctx).await.unwrap();

        assert_eq!(out.output, "go  then  ");
        assert_eq!(out.actions.len(), 3);
        assert_eq!(out.actions[0].index, 11);
        assert_eq!(out.actions[0].phase, Phase::Before);
        assert_eq!(out.actions[1].kind, ActionKind::Click { button: Default::default() });
        assert_eq!(out.actions[2].kind, ActionKind::Clear);
        assert_eq!(out.actions[2].phase, Phase::After);
    }

    #[tokio::test]
    async fn test_render_resets_queue_each_pass() {
        let (_t, registry, ctx) = setup();
        let doc = validate("$click()", &registry, &ctx);
        let first = render(&doc, &ctx).await.unwrap();
        let second = render(&doc, &ctx).await.unwrap();
        assert_eq!(first.actions.len(), 1);
        assert_eq!(second.actions.len(), 1);
    }

    #[test]
    fn test_bound_token_navigation() {
        let (_t, registry, ctx) = setup();
        let doc = validate("a $clear() b", &registry, &ctx);

        let mid = doc.bound(1).unwrap();
        assert_eq!(mid.token().kind(), "call");
        assert_eq!(mid.prev().unwrap().token().literal(), "a ");
        assert_eq!(mid.next().unwrap().token().literal(), " b");
        assert!(doc.bound(0).unwrap().prev().is_none());
        assert!(doc.bound(2).unwrap().next().is_none());
        assert!(doc.bound(3).is_none());
    }

    #[test]
    fn test_has_call_and_report() {
        let (_t, registry, ctx) = setup();
        let doc = validate("x $norules() y", &registry, &ctx);
        assert!(doc.has_call(|c| matches!(c, Call::NoRules)));
        assert!(!doc.has_call(|c| matches!(c, Call::Clear)));

        let report = doc.report();
        assert_eq!(report.len(), 3);
        assert_eq!(report[1].kind, "call");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json[1]["call"]["call"], "no_rules");
        assert!(json[0].get("call").is_none());
    }
}
