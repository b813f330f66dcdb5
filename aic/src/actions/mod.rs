//! Post-actions - deferred side effects queued while rendering
//!
//! Rendering never touches the mouse, keyboard, or prompt file directly.
//! Automation commands push a [`PostAction`] instead; the pipeline runs the
//! `Before` actions ahead of the clipboard write and the `After` actions
//! once the write succeeded.

mod automation;
mod executor;

use serde::Serialize;
use std::time::Duration;

use crate::keys::Modifier;

pub use automation::{ActionError, Automation, SystemAutomation};
pub use executor::{ActionFailure, ExecutionReport, PostActionExecutor, PromptClearer};

/// When an action runs relative to the clipboard write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Before,
    After,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

/// A screen coordinate, either literal or looked up from host variables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Coord {
    Literal(i64),
    Var(String),
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(n) => write!(f, "{}", n),
            Self::Var(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
}

impl MouseButton {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// What a post-action does
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionKind {
    Jump {
        x: Coord,
        y: Coord,
    },
    Click {
        button: MouseButton,
    },
    Type {
        text: String,
        modifiers: Vec<Modifier>,
        delay: Duration,
    },
    Sleep(Duration),
    Press {
        key: String,
    },
    /// Remove the prompt body from the document
    Clear,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jump { .. } => "jump",
            Self::Click { .. } => "click",
            Self::Type { .. } => "type",
            Self::Sleep(_) => "sleep",
            Self::Press { .. } => "press",
            Self::Clear => "clear",
        }
    }
}

/// A side effect queued during rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostAction {
    pub phase: Phase,
    /// Token index in the rendered document; actions run in ascending order
    pub index: usize,
    /// Source text of the call that queued this action
    pub literal: String,
    pub kind: ActionKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_button_parse() {
        assert_eq!(MouseButton::parse("Left"), Some(MouseButton::Left));
        assert_eq!(MouseButton::parse(" right "), Some(MouseButton::Right));
        assert_eq!(MouseButton::parse("middle"), None);
        assert_eq!(MouseButton::default(), MouseButton::Left);
    }

    #[test]
    fn test_action_serializes_with_tag() {
        let action = PostAction {
            phase: Phase::After,
            index: 3,
            literal: "$click(\"right\")".to_string(),
            kind: ActionKind::Click {
                button: MouseButton::Right,
            },
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["phase"], "after");
        assert_eq!(json["kind"]["action"], "click");
        assert_eq!(json["kind"]["button"], "right");
    }

    #[test]
    fn test_coord_display() {
        assert_eq!(Coord::Literal(-4).to_string(), "-4");
        assert_eq!(Coord::Var("AIC_X_START".into()).to_string(), "AIC_X_START");
    }
}
