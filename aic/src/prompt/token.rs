//! Prompt tokens

use serde::Serialize;

/// A span of the prompt document produced by the scanner
///
/// Concatenating the `literal` of every token in scan order reproduces the
/// scanned text byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    /// Plain text, rendered verbatim
    Raw { literal: String },

    /// A `\$...` word; renders without the leading backslash and never expands
    Escaped { literal: String },

    /// A `$name(...)` call, or an unparsed `$word` when `args_raw` is `None`
    Command {
        literal: String,
        name: String,
        args_raw: Option<String>,
    },
}

impl Token {
    pub fn raw(literal: impl Into<String>) -> Self {
        Self::Raw {
            literal: literal.into(),
        }
    }

    /// Exact source text of this token
    pub fn literal(&self) -> &str {
        match self {
            Self::Raw { literal } | Self::Escaped { literal } | Self::Command { literal, .. } => literal,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Raw { .. } => "raw",
            Self::Escaped { .. } => "escaped",
            Self::Command { .. } => "command",
        }
    }

    /// Replace a command with a raw token carrying the identical literal
    pub fn downgrade(self) -> Self {
        match self {
            Self::Command { literal, .. } => Self::Raw { literal },
            other => other,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal();
        match self {
            Self::Raw { .. } => {
                let display: String = lit.chars().take(20).collect();
                if display.len() < lit.len() {
                    write!(f, "<Raw: {:?}...>", display)
                } else {
                    write!(f, "<Raw: {:?}>", display)
                }
            }
            Self::Escaped { .. } => write!(f, "<Escaped: {:?}>", lit),
            Self::Command { .. } => write!(f, "<Command: {:?}>", lit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downgrade_keeps_literal() {
        let tok = Token::Command {
            literal: "$sh(\"ls\")".to_string(),
            name: "sh".to_string(),
            args_raw: Some("\"ls\"".to_string()),
        };
        let down = tok.downgrade();
        assert_eq!(down, Token::raw("$sh(\"ls\")"));
    }

    #[test]
    fn test_display_truncates_long_raw() {
        let tok = Token::raw("a".repeat(40));
        assert!(tok.to_string().ends_with("...>"));
    }
}
