//! PostActionExecutor - runs queued post-actions against an automation backend

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ActionError, ActionKind, Automation, Coord, Phase, PostAction};

/// Removes the prompt body from the document (`$clear()`)
pub trait PromptClearer: Send + Sync {
    fn clear_prompt(&self) -> Result<(), ActionError>;
}

/// One action that failed during execution
#[derive(Debug, Clone)]
pub struct ActionFailure {
    pub index: usize,
    pub literal: String,
    pub error: String,
}

/// Outcome of running one phase of post-actions
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub executed: usize,
    pub failures: Vec<ActionFailure>,
}

impl ExecutionReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs post-actions in index order with a fixed pause after each
pub struct PostActionExecutor {
    automation: Arc<dyn Automation>,
    clearer: Option<Arc<dyn PromptClearer>>,
    step_delay: Duration,
}

impl PostActionExecutor {
    pub fn new(automation: Arc<dyn Automation>, step_delay: Duration) -> Self {
        debug!(?step_delay, "PostActionExecutor::new: called");
        Self {
            automation,
            clearer: None,
            step_delay,
        }
    }

    pub fn with_clearer(mut self, clearer: Arc<dyn PromptClearer>) -> Self {
        self.clearer = Some(clearer);
        self
    }

    /// Run every action of `phase`, ascending by index
    ///
    /// A failing action is recorded and skipped; later actions still run.
    /// Coordinate variables resolve against `vars`.
    pub async fn execute(
        &self,
        actions: &[PostAction],
        phase: Phase,
        vars: &HashMap<String, String>,
    ) -> ExecutionReport {
        let mut selected: Vec<&PostAction> = actions.iter().filter(|a| a.phase == phase).collect();
        selected.sort_by_key(|a| a.index);
        debug!(%phase, count = selected.len(), "PostActionExecutor::execute: called");

        let mut report = ExecutionReport::default();
        for action in selected {
            debug!(index = action.index, kind = action.kind.name(), "PostActionExecutor::execute: running action");
            match self.run_one(&action.kind, vars).await {
                Ok(()) => report.executed += 1,
                Err(e) => {
                    warn!(index = action.index, literal = %action.literal, error = %e, "post-action failed");
                    report.failures.push(ActionFailure {
                        index: action.index,
                        literal: action.literal.clone(),
                        error: e.to_string(),
                    });
                }
            }

            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
        }
        report
    }

    async fn run_one(&self, kind: &ActionKind, vars: &HashMap<String, String>) -> Result<(), ActionError> {
        match kind {
            ActionKind::Jump { x, y } => {
                let x = resolve_coord(x, vars)?;
                let y = resolve_coord(y, vars)?;
                self.automation.move_mouse(x, y).await
            }
            ActionKind::Click { button } => self.automation.click(*button).await,
            ActionKind::Type {
                text,
                modifiers,
                delay,
            } => self.automation.type_text(text, modifiers, *delay).await,
            ActionKind::Press { key } => self.automation.press_key(key).await,
            ActionKind::Sleep(d) => {
                tokio::time::sleep(*d).await;
                Ok(())
            }
            ActionKind::Clear => match &self.clearer {
                Some(clearer) => clearer.clear_prompt(),
                None => Err(ActionError::Clear("no prompt document attached".to_string())),
            },
        }
    }
}

/// Resolve a coordinate against the host variable snapshot
pub fn resolve_coord(coord: &Coord, vars: &HashMap<String, String>) -> Result<i64, ActionError> {
    match coord {
        Coord::Literal(n) => Ok(*n),
        Coord::Var(name) => {
            let value = vars.get(name).ok_or_else(|| ActionError::UndefinedVar(name.clone()))?;
            value.trim().parse().map_err(|_| ActionError::NotAnInteger {
                name: name.clone(),
                value: value.clone(),
            })
        }
    }
}
