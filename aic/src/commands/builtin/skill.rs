//! skill command - include skill documents from `ai/skills`

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::commands::{Call, CommandContext, CommandError, CommandHandler, RenderScope, SkillTarget, one_string};
use crate::prompt::Arg;

pub struct SkillCommand;

#[async_trait]
impl CommandHandler for SkillCommand {
    fn name(&self) -> &'static str {
        "skill"
    }

    fn usage(&self) -> &'static str {
        "$skill(\"name\") or $skill(\"*\") - include ai/skills/<name>.md"
    }

    fn validate(&self, args: &[Arg], ctx: &CommandContext) -> Result<Call, CommandError> {
        debug!(?args, "SkillCommand::validate: called");
        let name = one_string("skill", args)?.trim();
        let dir = ctx.skills_dir.as_ref().ok_or(CommandError::NoSkillsDir)?;

        if name == "*" {
            if !dir.is_dir() {
                return Err(CommandError::NotFound { path: dir.clone() });
            }
            return Ok(Call::Skill(SkillTarget::All { dir: dir.clone() }));
        }

        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(CommandError::InvalidArgument(format!("bad skill name {:?}", name)));
        }

        let path = dir.join(format!("{}.md", name));
        if !path.is_file() {
            return Err(CommandError::NotFound { path });
        }
        Ok(Call::Skill(SkillTarget::One {
            name: name.to_string(),
            path,
        }))
    }

    async fn render(&self, call: &Call, _ctx: &CommandContext, _scope: &mut RenderScope<'_>) -> Result<String, CommandError> {
        let Call::Skill(target) = call else {
            return Err(CommandError::CallMismatch { name: "skill" });
        };
        debug!(?target, "SkillCommand::render: called");

        match target {
            SkillTarget::One { name, path } => render_skill(name, path),
            SkillTarget::All { dir } => {
                let blocks = list_skills(dir)?
                    .into_iter()
                    .map(|(name, path)| render_skill(&name, &path))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(blocks.join("\n"))
            }
        }
    }
}

/// `(name, path)` of every `*.md` file in `dir`, sorted by name
fn list_skills(dir: &Path) -> Result<Vec<(String, PathBuf)>, CommandError> {
    let mut skills = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().is_none_or(|e| e != "md") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            skills.push((stem.to_string(), path.clone()));
        }
    }
    skills.sort();
    Ok(skills)
}

fn render_skill(name: &str, path: &Path) -> Result<String, CommandError> {
    let content = fs::read_to_string(path)?.replace("\r\n", "\n");
    let mut out = format!("=== SKILL: {} ===\n{}", name, content);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}
