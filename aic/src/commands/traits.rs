//! CommandHandler trait definition

use async_trait::async_trait;
use tracing::debug;

use super::{Call, CommandContext, CommandError};
use crate::actions::{ActionKind, Phase, PostAction};
use crate::prompt::Arg;

/// A `$name(...)` command
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name the command is invoked by (without the `$`)
    fn name(&self) -> &'static str;

    /// Short usage line; `aic tokens` prints it under calls that did not validate
    fn usage(&self) -> &'static str;

    /// Check argument shape against the host context and decide the call
    fn validate(&self, args: &[Arg], ctx: &CommandContext) -> Result<Call, CommandError>;

    /// Produce this call's text, queueing post-actions on `scope` if needed
    async fn render(&self, call: &Call, ctx: &CommandContext, scope: &mut RenderScope<'_>) -> Result<String, CommandError>;
}

/// Per-call rendering state handed to a handler
pub struct RenderScope<'a> {
    /// Index of the call's token within the rendered document
    pub index: usize,

    /// Source text of the call
    pub literal: &'a str,

    /// Phase automation queued from this call runs in
    pub phase: Phase,

    actions: &'a mut Vec<PostAction>,
}

impl<'a> RenderScope<'a> {
    pub fn new(index: usize, literal: &'a str, phase: Phase, actions: &'a mut Vec<PostAction>) -> Self {
        Self {
            index,
            literal,
            phase,
            actions,
        }
    }

    /// Queue an action in this scope's phase
    pub fn queue(&mut self, kind: ActionKind) {
        self.queue_in(self.phase, kind);
    }

    /// Queue an action in an explicit phase
    pub fn queue_in(&mut self, phase: Phase, kind: ActionKind) {
        debug!(index = self.index, %phase, kind = kind.name(), "RenderScope::queue_in: called");
        self.actions.push(PostAction {
            phase,
            index: self.index,
            literal: self.literal.to_string(),
            kind,
        });
    }
}

/// Require that no arguments were passed
pub(crate) fn no_args(name: &'static str, args: &[Arg]) -> Result<(), CommandError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandError::Usage {
            name,
            expected: "no arguments",
        })
    }
}

/// Require exactly one non-empty string argument
pub(crate) fn one_string<'a>(name: &'static str, args: &'a [Arg]) -> Result<&'a str, CommandError> {
    match args {
        [Arg::Str(s)] if !s.trim().is_empty() => Ok(s),
        _ => Err(CommandError::Usage {
            name,
            expected: "exactly one non-empty string",
        }),
    }
}
