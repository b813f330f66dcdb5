//! clear command - empty the prompt body once the clipboard is written

use async_trait::async_trait;
use tracing::debug;

use crate::actions::{ActionKind, Phase};
use crate::commands::{Call, CommandContext, CommandError, CommandHandler, RenderScope, no_args};
use crate::prompt::Arg;

pub struct ClearCommand;

#[async_trait]
impl CommandHandler for ClearCommand {
    fn name(&self) -> &'static str {
        "clear"
    }

    fn usage(&self) -> &'static str {
        "$clear() - clear the prompt body after copying"
    }

    fn validate(&self, args: &[Arg], _ctx: &CommandContext) -> Result<Call, CommandError> {
        no_args("clear", args)?;
        Ok(Call::Clear)
    }

    async fn render(&self, call: &Call, _ctx: &CommandContext, scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        if *call != Call::Clear {
            return Err(CommandError::CallMismatch { name: "clear" });
        }
        debug!(index = scope.index, "ClearCommand::render: queueing clear");
        // Clearing before the history stash would lose the prompt
        scope.queue_in(Phase::After, ActionKind::Clear);
        Ok(String::new())
    }
}

/// `$norules()` - suppress the rules section of the output
pub struct NoRulesCommand;

#[async_trait]
impl CommandHandler for NoRulesCommand {
    fn name(&self) -> &'static str {
        "norules"
    }

    fn usage(&self) -> &'static str {
        "$norules() - leave ai/rules out of the output"
    }

    fn validate(&self, args: &[Arg], _ctx: &CommandContext) -> Result<Call, CommandError> {
        no_args("norules", args)?;
        Ok(Call::NoRules)
    }

    async fn render(&self, _call: &Call, _ctx: &CommandContext, _scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        Ok(String::new())
    }
}
