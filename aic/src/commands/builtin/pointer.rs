//! jump and click commands - move and click the pointer

use async_trait::async_trait;
use tracing::debug;

use crate::actions::{ActionKind, Coord, MouseButton};
use crate::commands::{Call, CommandContext, CommandError, CommandHandler, RenderScope};
use crate::prompt::Arg;

/// `$jump(x, y)` - move the pointer to absolute screen coordinates
pub struct JumpCommand;

fn coord(arg: &Arg) -> Option<Coord> {
    match arg {
        Arg::Int(n) => Some(Coord::Literal(*n)),
        Arg::Ident(name) => Some(Coord::Var(name.clone())),
        _ => None,
    }
}

#[async_trait]
impl CommandHandler for JumpCommand {
    fn name(&self) -> &'static str {
        "jump"
    }

    fn usage(&self) -> &'static str {
        "$jump(x, y) - move the pointer; coordinates are integers or variable names"
    }

    fn validate(&self, args: &[Arg], _ctx: &CommandContext) -> Result<Call, CommandError> {
        debug!(?args, "JumpCommand::validate: called");
        match args {
            [x, y] => match (coord(x), coord(y)) {
                (Some(x), Some(y)) => Ok(Call::Jump { x, y }),
                _ => Err(CommandError::Usage {
                    name: "jump",
                    expected: "integer or variable coordinates",
                }),
            },
            _ => Err(CommandError::Usage {
                name: "jump",
                expected: "two coordinates",
            }),
        }
    }

    async fn render(&self, call: &Call, _ctx: &CommandContext, scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        let Call::Jump { x, y } = call else {
            return Err(CommandError::CallMismatch { name: "jump" });
        };
        scope.queue(ActionKind::Jump {
            x: x.clone(),
            y: y.clone(),
        });
        Ok(String::new())
    }
}

/// `$click()` or `$click("right")`
pub struct ClickCommand;

#[async_trait]
impl CommandHandler for ClickCommand {
    fn name(&self) -> &'static str {
        "click"
    }

    fn usage(&self) -> &'static str {
        "$click() or $click(\"right\") - click at the current pointer position"
    }

    fn validate(&self, args: &[Arg], _ctx: &CommandContext) -> Result<Call, CommandError> {
        let button = match args {
            [] => MouseButton::Left,
            [Arg::Str(name)] => MouseButton::parse(name)
                .ok_or_else(|| CommandError::InvalidArgument(format!("unknown mouse button {:?}", name)))?,
            _ => {
                return Err(CommandError::Usage {
                    name: "click",
                    expected: "no arguments or \"left\"/\"right\"",
                });
            }
        };
        Ok(Call::Click { button })
    }

    async fn render(&self, call: &Call, _ctx: &CommandContext, scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        let Call::Click { button } = call else {
            return Err(CommandError::CallMismatch { name: "click" });
        };
        scope.queue(ActionKind::Click { button: *button });
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Phase;
    use tempfile::tempdir;

    #[test]
    fn test_jump_validation() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());

        assert_eq!(
            JumpCommand.validate(&[Arg::Int(10), Arg::Ident("Y0".into())], &ctx).unwrap(),
            Call::Jump {
                x: Coord::Literal(10),
                y: Coord::Var("Y0".into()),
            }
        );
        assert!(JumpCommand.validate(&[Arg::Int(10)], &ctx).is_err());
        assert!(JumpCommand.validate(&[Arg::Str("10".into()), Arg::Int(1)], &ctx).is_err());
    }

    #[tokio::test]
    async fn test_jump_queues_in_scope_phase() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());
        let call = JumpCommand.validate(&[Arg::Int(1), Arg::Int(2)], &ctx).unwrap();

        let mut actions = Vec::new();
        let mut scope = RenderScope::new(0, "$jump(1,2)", Phase::Before, &mut actions);
        assert_eq!(JumpCommand.render(&call, &ctx, &mut scope).await.unwrap(), "");
        assert_eq!(actions[0].phase, Phase::Before);
    }

    #[test]
    fn test_click_validation() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(temp.path().to_path_buf());

        assert_eq!(
            ClickCommand.validate(&[], &ctx).unwrap(),
            Call::Click {
                button: MouseButton::Left
            }
        );
        assert_eq!(
            ClickCommand.validate(&[Arg::Str("RIGHT".into())], &ctx).unwrap(),
            Call::Click {
                button: MouseButton::Right
            }
        );
        assert!(ClickCommand.validate(&[Arg::Str("middle".into())], &ctx).is_err());
        assert!(ClickCommand.validate(&[Arg::Int(1)], &ctx).is_err());
    }
}
