//! Built-in commands

mod clear;
mod http;
mod keyboard;
mod path;
mod pointer;
mod shell;
mod skill;

pub use clear::{ClearCommand, NoRulesCommand};
pub use http::HttpCommand;
pub use keyboard::{PressCommand, SleepCommand, TypeCommand, parse_duration};
pub use path::PathCommand;
pub use pointer::{ClickCommand, JumpCommand};
pub use shell::ShellCommand;
pub use skill::SkillCommand;
