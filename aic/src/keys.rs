//! Key and modifier names accepted by `$press(...)` and `$type(...)`

use serde::Serialize;

/// A keyboard modifier held while typing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Meta,
}

impl Modifier {
    /// Parse a modifier name, case-insensitive, accepting common aliases
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "shift" => Some(Self::Shift),
            "control" | "ctrl" => Some(Self::Control),
            "alt" | "option" | "opt" => Some(Self::Alt),
            "meta" | "cmd" | "command" | "super" | "win" => Some(Self::Meta),
            _ => None,
        }
    }

    /// xdotool keysym name
    pub fn xdotool_name(&self) -> &'static str {
        match self {
            Self::Shift => "shift",
            Self::Control => "ctrl",
            Self::Alt => "alt",
            Self::Meta => "super",
        }
    }

    /// cliclick modifier name
    pub fn cliclick_name(&self) -> &'static str {
        match self {
            Self::Shift => "shift",
            Self::Control => "ctrl",
            Self::Alt => "alt",
            Self::Meta => "cmd",
        }
    }
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Shift => "shift",
            Self::Control => "control",
            Self::Alt => "alt",
            Self::Meta => "meta",
        };
        write!(f, "{}", s)
    }
}

const NAMED_KEYS: &[&str] = &[
    "enter", "tab", "escape", "space", "backspace", "delete", "up", "down", "left", "right", "home", "end", "pageup",
    "pagedown", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
];

/// Normalize a key name for `$press`
///
/// Single printable ASCII characters (letters, digits, punctuation) are kept
/// as-is; named keys are lowercased. `return` and `esc` are accepted as
/// aliases. Anything else is rejected.
pub fn normalize_key(name: &str) -> Option<String> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return ch.is_ascii_graphic().then(|| ch.to_string());
    }

    let lower = name.to_ascii_lowercase();
    let canonical = match lower.as_str() {
        "return" => "enter",
        "esc" => "escape",
        "del" => "delete",
        other => other,
    };
    NAMED_KEYS.contains(&canonical).then(|| canonical.to_string())
}

/// xdotool keysym for a normalized key
pub fn xdotool_key(key: &str) -> String {
    match key {
        "enter" => "Return".to_string(),
        "tab" => "Tab".to_string(),
        "escape" => "Escape".to_string(),
        "space" => "space".to_string(),
        "backspace" => "BackSpace".to_string(),
        "delete" => "Delete".to_string(),
        "up" => "Up".to_string(),
        "down" => "Down".to_string(),
        "left" => "Left".to_string(),
        "right" => "Right".to_string(),
        "home" => "Home".to_string(),
        "end" => "End".to_string(),
        "pageup" => "Prior".to_string(),
        "pagedown" => "Next".to_string(),
        k if k.starts_with('f') && k.len() > 1 => k.to_uppercase(),
        k => k.to_string(),
    }
}

/// cliclick `kp:` name for a named key, `None` for printable characters
pub fn cliclick_key(key: &str) -> Option<String> {
    let name = match key {
        "enter" => "return",
        "tab" => "tab",
        "escape" => "esc",
        "space" => "space",
        "backspace" => "delete",
        "delete" => "fwd-delete",
        "up" => "arrow-up",
        "down" => "arrow-down",
        "left" => "arrow-left",
        "right" => "arrow-right",
        "home" => "home",
        "end" => "end",
        "pageup" => "page-up",
        "pagedown" => "page-down",
        k if k.starts_with('f') && k.len() > 1 => k,
        _ => return None,
    };
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_aliases() {
        assert_eq!(Modifier::parse("SHIFT"), Some(Modifier::Shift));
        assert_eq!(Modifier::parse("ctrl"), Some(Modifier::Control));
        assert_eq!(Modifier::parse("Control"), Some(Modifier::Control));
        assert_eq!(Modifier::parse("cmd"), Some(Modifier::Meta));
        assert_eq!(Modifier::parse("option"), Some(Modifier::Alt));
        assert_eq!(Modifier::parse("hyper"), None);
    }

    #[test]
    fn test_normalize_single_chars() {
        assert_eq!(normalize_key("a").as_deref(), Some("a"));
        assert_eq!(normalize_key("A").as_deref(), Some("A"));
        assert_eq!(normalize_key("7").as_deref(), Some("7"));
        assert_eq!(normalize_key(";").as_deref(), Some(";"));
        assert_eq!(normalize_key(" "), None);
        assert_eq!(normalize_key("é"), None);
    }

    #[test]
    fn test_normalize_named_keys() {
        assert_eq!(normalize_key("Enter").as_deref(), Some("enter"));
        assert_eq!(normalize_key("return").as_deref(), Some("enter"));
        assert_eq!(normalize_key("ESC").as_deref(), Some("escape"));
        assert_eq!(normalize_key("F12").as_deref(), Some("f12"));
        assert_eq!(normalize_key("f13"), None);
        assert_eq!(normalize_key("hyper"), None);
        assert_eq!(normalize_key(""), None);
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(xdotool_key("enter"), "Return");
        assert_eq!(xdotool_key("f5"), "F5");
        assert_eq!(xdotool_key("x"), "x");
        assert_eq!(cliclick_key("pageup").as_deref(), Some("page-up"));
        assert_eq!(cliclick_key("x"), None);
    }
}
