//! Call - the typed outcome of validating a command

use reqwest::Url;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::actions::{Coord, MouseButton};
use crate::keys::Modifier;

/// Which skill files a `$skill(...)` call includes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum SkillTarget {
    One { name: String, path: PathBuf },
    All { dir: PathBuf },
}

/// A validated command call
///
/// Decided once during validation; rendering only acts on what is recorded
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    Include {
        target: PathBuf,
    },
    Shell {
        command: String,
    },
    Http {
        #[serde(serialize_with = "serialize_url")]
        url: Url,
    },
    Skill(SkillTarget),
    Clear,
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
    Sleep {
        duration: Duration,
    },
    Press {
        key: String,
    },
    NoRules,
}

fn serialize_url<S: serde::Serializer>(url: &Url, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(url.as_str())
}
