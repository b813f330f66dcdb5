//! type, press, and sleep commands

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::actions::ActionKind;
use crate::commands::{Call, CommandContext, CommandError, CommandHandler, RenderScope};
use crate::keys::{Modifier, normalize_key};
use crate::prompt::Arg;

/// `$type("text", [MODS], delayMs)` - type text with optional held modifiers
pub struct TypeCommand;

fn delay_ms(name: &'static str, n: i64) -> Result<Duration, CommandError> {
    u64::try_from(n)
        .map(Duration::from_millis)
        .map_err(|_| CommandError::InvalidArgument(format!("${} delay must be non-negative, got {}", name, n)))
}

#[async_trait]
impl CommandHandler for TypeCommand {
    fn name(&self) -> &'static str {
        "type"
    }

    fn usage(&self) -> &'static str {
        "$type(\"text\", [SHIFT, CONTROL], delayMs) - type text; modifiers and delay optional"
    }

    fn validate(&self, args: &[Arg], _ctx: &CommandContext) -> Result<Call, CommandError> {
        debug!(?args, "TypeCommand::validate: called");
        let usage = || CommandError::Usage {
            name: "type",
            expected: "a string, then an optional modifier list and delay",
        };

        let (text, rest) = match args {
            [Arg::Str(text), rest @ ..] => (text.clone(), rest),
            _ => return Err(usage()),
        };

        let (mod_names, delay) = match rest {
            [] => (&[][..], Duration::ZERO),
            [Arg::List(mods)] => (&mods[..], Duration::ZERO),
            [Arg::Int(n)] => (&[][..], delay_ms("type", *n)?),
            [Arg::List(mods), Arg::Int(n)] => (&mods[..], delay_ms("type", *n)?),
            _ => return Err(usage()),
        };

        let modifiers = mod_names
            .iter()
            .map(|m| Modifier::parse(m).ok_or_else(|| CommandError::InvalidArgument(format!("unknown modifier {:?}", m))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Call::Type {
            text,
            modifiers,
            delay,
        })
    }

    async fn render(&self, call: &Call, _ctx: &CommandContext, scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        let Call::Type {
            text,
            modifiers,
            delay,
        } = call
        else {
            return Err(CommandError::CallMismatch { name: "type" });
        };
        scope.queue(ActionKind::Type {
            text: text.clone(),
            modifiers: modifiers.clone(),
            delay: *delay,
        });
        Ok(String::new())
    }
}

/// `$press("enter")` - press and release one key
pub struct PressCommand;

#[async_trait]
impl CommandHandler for PressCommand {
    fn name(&self) -> &'static str {
        "press"
    }

    fn usage(&self) -> &'static str {
        "$press(\"enter\") - press a key (a single character or a named key)"
    }

    fn validate(&self, args: &[Arg], _ctx: &CommandContext) -> Result<Call, CommandError> {
        let [Arg::Str(name)] = args else {
            return Err(CommandError::Usage {
                name: "press",
                expected: "one key name string",
            });
        };
        let key = normalize_key(name).ok_or_else(|| CommandError::InvalidArgument(format!("unknown key {:?}", name)))?;
        Ok(Call::Press { key })
    }

    async fn render(&self, call: &Call, _ctx: &CommandContext, scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        let Call::Press { key } = call else {
            return Err(CommandError::CallMismatch { name: "press" });
        };
        scope.queue(ActionKind::Press { key: key.clone() });
        Ok(String::new())
    }
}

/// `$sleep(500)` or `$sleep("1.5s")` - pause between actions
pub struct SleepCommand;

#[async_trait]
impl CommandHandler for SleepCommand {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn usage(&self) -> &'static str {
        "$sleep(500) or $sleep(\"1m30s\") - pause the action sequence"
    }

    fn validate(&self, args: &[Arg], _ctx: &CommandContext) -> Result<Call, CommandError> {
        let duration = match args {
            [Arg::Int(n)] => delay_ms("sleep", *n)?,
            [Arg::Str(s)] => parse_duration(s).map_err(CommandError::InvalidArgument)?,
            _ => {
                return Err(CommandError::Usage {
                    name: "sleep",
                    expected: "milliseconds or a quoted duration",
                });
            }
        };
        Ok(Call::Sleep { duration })
    }

    async fn render(&self, call: &Call, _ctx: &CommandContext, scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        let Call::Sleep { duration } = call else {
            return Err(CommandError::CallMismatch { name: "sleep" });
        };
        scope.queue(ActionKind::Sleep(*duration));
        Ok(String::new())
    }
}

/// Parse a duration like `750ms`, `1.5s`, `2m`, `1h`, or `1m30s`
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration: '{s}'"))?;
        if num_len == 0 {
            return Err(format!("invalid duration: '{s}'"));
        }
        let value: f64 = rest[..num_len]
            .parse()
            .map_err(|_| format!("invalid number in duration: '{s}'"))?;
        rest = &rest[num_len..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(rest.len());
        let scale_ms = match &rest[..unit_len] {
            "ms" => 1.0,
            "s" => 1_000.0,
            "m" => 60_000.0,
            "h" => 3_600_000.0,
            unit => return Err(format!("unknown unit '{unit}' in duration: '{s}'")),
        };
        rest = &rest[unit_len..];
        total += value * scale_ms;
    }

    Ok(Duration::from_micros((total * 1_000.0).round() as u64))
}
