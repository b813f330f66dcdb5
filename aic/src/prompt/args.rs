//! Argument grammar for `$name(...)` calls
//!
//! ```text
//! args   := ws | arg (ws ',' ws arg)* ws
//! arg    := string | list | int | ident
//! string := '"' (escape | [^"\\])* '"'        escapes: \" \\ \n \t \r
//! list   := '[' ws (item (ws ',' ws item)*)? ws ']'
//! item   := string | ident
//! int    := '-'? [0-9]+
//! ident  := [A-Za-z_][A-Za-z0-9_]*
//! ```

use thiserror::Error;

use super::scanner::is_ident_byte;

/// A parsed primitive argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Str(String),
    List(Vec<String>),
    Int(i64),
    Ident(String),
}

impl Arg {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Int(_) => "integer",
            Self::Ident(_) => "identifier",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Errors raised while parsing call arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("unterminated string")]
    UnterminatedString,

    #[error("unterminated list")]
    UnterminatedList,

    #[error("expected ',' or ']' in list, got {0:?}")]
    BadListSeparator(char),

    #[error("expected identifier or quoted string in list")]
    BadListItem,

    #[error("integer out of range: {0}")]
    IntOverflow(String),

    #[error("expected argument at offset {0}")]
    MissingArg(usize),

    #[error("unexpected {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
}

/// Parse the raw text between a call's parentheses
pub fn parse_args(raw: &str) -> Result<Vec<Arg>, ArgError> {
    let mut p = ArgParser { src: raw, pos: 0 };
    let mut args = Vec::new();

    p.skip_ws();
    if p.at_end() {
        return Ok(args);
    }

    loop {
        p.skip_ws();
        args.push(p.arg()?);
        p.skip_ws();
        match p.peek() {
            None => return Ok(args),
            Some(b',') => p.pos += 1,
            Some(_) => return Err(p.unexpected()),
        }
    }
}

/// Parse a quoted string at the start of `s`, returning the value and the
/// number of bytes consumed including both quotes
pub fn parse_quoted_prefix(s: &str) -> Result<(String, usize), ArgError> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'"') {
        return Err(ArgError::MissingArg(0));
    }

    let mut out = String::new();
    let mut chars = s.char_indices().skip(1);
    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => return Ok((out, i + 1)),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, other)) => out.push(other),
                None => break,
            },
            other => out.push(other),
        }
    }
    Err(ArgError::UnterminatedString)
}

struct ArgParser<'a> {
    src: &'a str,
    pos: usize,
}

impl ArgParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\n' | b'\t' | b'\r')) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> ArgError {
        match self.src[self.pos..].chars().next() {
            Some(found) => ArgError::Unexpected {
                found,
                offset: self.pos,
            },
            None => ArgError::MissingArg(self.pos),
        }
    }

    fn arg(&mut self) -> Result<Arg, ArgError> {
        match self.peek() {
            Some(b'"') => self.string().map(Arg::Str),
            Some(b'[') => self.list().map(Arg::List),
            Some(b'-' | b'0'..=b'9') => self.int().map(Arg::Int),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => Ok(Arg::Ident(self.ident())),
            Some(_) => Err(self.unexpected()),
            None => Err(ArgError::MissingArg(self.pos)),
        }
    }

    fn string(&mut self) -> Result<String, ArgError> {
        let (value, used) = parse_quoted_prefix(&self.src[self.pos..])?;
        self.pos += used;
        Ok(value)
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        self.src[start..self.pos].to_string()
    }

    fn int(&mut self) -> Result<i64, ArgError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let digits = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == digits {
            return Err(self.unexpected());
        }
        let text = &self.src[start..self.pos];
        text.parse::<i64>().map_err(|_| ArgError::IntOverflow(text.to_string()))
    }

    fn list(&mut self) -> Result<Vec<String>, ArgError> {
        self.pos += 1;
        let mut items = Vec::new();

        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(items);
        }

        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(ArgError::UnterminatedList),
                Some(b'"') => items.push(self.string()?),
                Some(b) if is_ident_byte(b) => items.push(self.ident()),
                Some(_) => return Err(ArgError::BadListItem),
            }
            self.skip_ws();
            match self.peek() {
                None => return Err(ArgError::UnterminatedList),
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => {
                    let found = self.src[self.pos..].chars().next().unwrap_or('?');
                    return Err(ArgError::BadListSeparator(found));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(parse_args("").unwrap(), vec![]);
        assert_eq!(parse_args("  \n ").unwrap(), vec![]);
    }

    #[test]
    fn test_single_string_with_escapes() {
        let args = parse_args(r#""a \"b\"\n\\c""#).unwrap();
        assert_eq!(args, vec![Arg::Str("a \"b\"\n\\c".to_string())]);
    }

    #[test]
    fn test_multiple_strings() {
        let args = parse_args(r#""src", "main.rs""#).unwrap();
        assert_eq!(args, vec![Arg::Str("src".into()), Arg::Str("main.rs".into())]);
    }

    #[test]
    fn test_ints_and_idents() {
        let args = parse_args("100, -5, AIC_X_START").unwrap();
        assert_eq!(args, vec![Arg::Int(100), Arg::Int(-5), Arg::Ident("AIC_X_START".into())]);
    }

    #[test]
    fn test_list_mixed_items() {
        let args = parse_args(r#""hi", [SHIFT, "control"], 20"#).unwrap();
        assert_eq!(
            args,
            vec![
                Arg::Str("hi".into()),
                Arg::List(vec!["SHIFT".into(), "control".into()]),
                Arg::Int(20),
            ]
        );
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(parse_args("[ ]").unwrap(), vec![Arg::List(vec![])]);
    }

    #[test]
    fn test_unicode_in_string() {
        assert_eq!(parse_args("\"héllo ✓\"").unwrap(), vec![Arg::Str("héllo ✓".into())]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_args(r#""abc"#), Err(ArgError::UnterminatedString));
        assert_eq!(parse_args("[a, b"), Err(ArgError::UnterminatedList));
        assert_eq!(parse_args("[a b]"), Err(ArgError::BadListSeparator('b')));
        assert_eq!(parse_args("[,]"), Err(ArgError::BadListItem));
        assert!(matches!(parse_args("1,"), Err(ArgError::MissingArg(_))));
        assert!(matches!(parse_args("\"a\" \"b\""), Err(ArgError::Unexpected { found: '"', .. })));
        assert!(matches!(parse_args("-"), Err(ArgError::Unexpected { .. }) | Err(ArgError::MissingArg(_))));
        assert!(matches!(parse_args("99999999999999999999"), Err(ArgError::IntOverflow(_))));
        assert!(matches!(parse_args("`ls`"), Err(ArgError::Unexpected { found: '`', .. })));
    }

    #[test]
    fn test_quoted_prefix_reports_consumed() {
        let (v, n) = parse_quoted_prefix(r#""ab" rest"#).unwrap();
        assert_eq!(v, "ab");
        assert_eq!(n, 4);
    }
}
