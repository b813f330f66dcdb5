//! Scanner - splits prompt text into raw spans and `$name(...)` calls
//!
//! The scanner knows nothing about individual commands. It only recognizes
//! the call syntax at word boundaries and always produces tokens whose
//! literals concatenate back to the input.

use super::token::Token;

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\t' | b'\r')
}

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scan prompt text into tokens
pub fn scan(text: &str) -> Vec<Token> {
    Scanner::new(text).run()
}

/// Result of measuring a `$...` word starting at a dollar sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DollarSpan {
    /// Exclusive end offset
    end: usize,
    /// End offset of the identifier (exclusive)
    ident_end: usize,
    /// Whether a balanced `(...)` call was found
    call: bool,
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    tokens: Vec<Token>,
    raw_start: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            tokens: Vec::new(),
            raw_start: 0,
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut i = 0;
        while i < self.bytes.len() {
            if !self.at_word_start(i) {
                i += 1;
                continue;
            }

            match self.bytes[i] {
                b'$' => {
                    self.flush_raw(i);
                    let span = self.measure_dollar(i);
                    let literal = &self.text[i..span.end];
                    let name = self.text[i + 1..span.ident_end].to_string();
                    let args_raw = span
                        .call
                        .then(|| self.text[span.ident_end + 1..span.end - 1].to_string());
                    self.tokens.push(Token::Command {
                        literal: literal.to_string(),
                        name,
                        args_raw,
                    });
                    self.raw_start = span.end;
                    i = span.end;
                }
                b'\\' if self.bytes.get(i + 1) == Some(&b'$') => {
                    self.flush_raw(i);
                    let span = self.measure_dollar(i + 1);
                    self.tokens.push(Token::Escaped {
                        literal: self.text[i..span.end].to_string(),
                    });
                    self.raw_start = span.end;
                    i = span.end;
                }
                _ => i += 1,
            }
        }

        self.flush_raw(self.bytes.len());
        self.tokens
    }

    fn at_word_start(&self, i: usize) -> bool {
        i == 0 || is_ws(self.bytes[i - 1])
    }

    fn flush_raw(&mut self, end: usize) {
        if end > self.raw_start {
            self.tokens.push(Token::raw(&self.text[self.raw_start..end]));
        }
        self.raw_start = end;
    }

    /// End of the whitespace-delimited word starting at `start`
    fn word_end(&self, start: usize) -> usize {
        let mut k = start;
        while k < self.bytes.len() && !is_ws(self.bytes[k]) {
            k += 1;
        }
        k
    }

    /// Measure the `$...` word whose dollar sign sits at `dollar`
    fn measure_dollar(&self, dollar: usize) -> DollarSpan {
        let mut j = dollar + 1;
        while j < self.bytes.len() && is_ident_byte(self.bytes[j]) {
            j += 1;
        }

        let bare = |end: usize| DollarSpan {
            end,
            ident_end: j,
            call: false,
        };

        if j == dollar + 1 || self.bytes.get(j) != Some(&b'(') {
            return bare(self.word_end(dollar));
        }

        match self.matching_paren(j) {
            Some(end) => DollarSpan {
                end,
                ident_end: j,
                call: true,
            },
            None => bare(self.word_end(dollar)),
        }
    }

    /// Given the offset of an opening paren, return the offset just past its
    /// matching close paren. Quoted and backticked spans do not count toward
    /// depth and a backslash always escapes the next byte.
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut escaped = false;

        for (k, &ch) in self.bytes.iter().enumerate().skip(open) {
            if escaped {
                escaped = false;
                continue;
            }
            if ch == b'\\' {
                escaped = true;
                continue;
            }
            if let Some(q) = quote {
                if ch == q {
                    quote = None;
                }
                continue;
            }
            match ch {
                b'"' | b'\'' | b'`' => quote = Some(ch),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(k + 1);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lits(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.literal()).collect()
    }

    fn kinds(tokens: &[Token]) -> Vec<&'static str> {
        tokens.iter().map(|t| t.kind()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_raw_only() {
        let toks = scan("hello world");
        assert_eq!(toks, vec![Token::raw("hello world")]);
    }

    #[test]
    fn test_call_at_start() {
        let toks = scan(r#"$path(".")"#);
        assert_eq!(
            toks,
            vec![Token::Command {
                literal: r#"$path(".")"#.to_string(),
                name: "path".to_string(),
                args_raw: Some(r#"".""#.to_string()),
            }]
        );
    }

    #[test]
    fn test_call_mid_line() {
        let toks = scan(r#"hi $path("f.txt") there"#);
        assert_eq!(lits(&toks), vec!["hi ", r#"$path("f.txt")"#, " there"]);
        assert_eq!(kinds(&toks), vec!["raw", "command", "raw"]);
    }

    #[test]
    fn test_not_a_call_without_word_boundary() {
        let toks = scan("hello$clear()");
        assert_eq!(toks, vec![Token::raw("hello$clear()")]);
    }

    #[test]
    fn test_tabs_and_newlines_are_boundaries() {
        let toks = scan("a\t$clear()  $path(\".\")\nend");
        assert_eq!(lits(&toks), vec!["a\t", "$clear()", "  ", "$path(\".\")", "\nend"]);
        assert_eq!(kinds(&toks), vec!["raw", "command", "raw", "command", "raw"]);
    }

    #[test]
    fn test_spaces_inside_quoted_arg() {
        let toks = scan(r#"x $sh("ls -la") y"#);
        assert_eq!(lits(&toks), vec!["x ", r#"$sh("ls -la")"#, " y"]);
    }

    #[test]
    fn test_escaped_quotes_and_parens_inside_string() {
        let toks = scan(r#"x $sh("echo \"a(b)c\"") y"#);
        assert_eq!(lits(&toks), vec!["x ", r#"$sh("echo \"a(b)c\"")"#, " y"]);
    }

    #[test]
    fn test_backticks_hide_parens() {
        let toks = scan("$sh(`echo )`) tail");
        assert_eq!(lits(&toks), vec!["$sh(`echo )`)", " tail"]);
    }

    #[test]
    fn test_nested_parens() {
        let toks = scan("$sh(\"x\" (a (b))) z");
        assert_eq!(lits(&toks), vec!["$sh(\"x\" (a (b)))", " z"]);
    }

    #[test]
    fn test_missing_close_falls_back_to_word() {
        let toks = scan(r#"x $sh("echo hi" y"#);
        assert_eq!(lits(&toks), vec!["x ", r#"$sh("echo"#, r#" hi" y"#]);
        match &toks[1] {
            Token::Command { name, args_raw, .. } => {
                assert_eq!(name, "sh");
                assert!(args_raw.is_none());
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_at_end_of_input() {
        let toks = scan("$foo(");
        assert_eq!(lits(&toks), vec!["$foo("]);
        assert!(matches!(&toks[0], Token::Command { args_raw: None, .. }));
    }

    #[test]
    fn test_bare_dollar_word() {
        let toks = scan("cost $HOME now");
        assert_eq!(lits(&toks), vec!["cost ", "$HOME", " now"]);
        assert!(matches!(&toks[1], Token::Command { name, args_raw: None, .. } if name == "HOME"));
    }

    #[test]
    fn test_lone_dollar() {
        let toks = scan("a $ b");
        assert_eq!(lits(&toks), vec!["a ", "$", " b"]);
        assert!(matches!(&toks[1], Token::Command { name, .. } if name.is_empty()));
    }

    #[test]
    fn test_escaped_dollar_covers_whole_call() {
        let toks = scan(r#"see \$sh("x $y(1)") ok"#);
        assert_eq!(lits(&toks), vec!["see ", r#"\$sh("x $y(1)")"#, " ok"]);
        assert_eq!(kinds(&toks), vec!["raw", "escaped", "raw"]);
    }

    #[test]
    fn test_backslash_not_before_dollar_is_raw() {
        let toks = scan(r"a \n b");
        assert_eq!(toks, vec![Token::raw(r"a \n b")]);
    }

    #[test]
    fn test_multibyte_text_around_call() {
        let toks = scan("héllo $jump(1,2) wörld");
        assert_eq!(lits(&toks), vec!["héllo ", "$jump(1,2)", " wörld"]);
    }

    proptest! {
        #[test]
        fn prop_literals_reconstruct_input(input in ".*") {
            let toks = scan(&input);
            let joined: String = toks.iter().map(|t| t.literal()).collect();
            prop_assert_eq!(joined, input);
        }

        #[test]
        fn prop_dollar_heavy_input_is_lossless(input in "[ $()a\"'`\\\\\n]{0,64}") {
            let toks = scan(&input);
            let joined: String = toks.iter().map(|t| t.literal()).collect();
            prop_assert_eq!(joined, input);
        }

        #[test]
        fn prop_command_literal_scans_alone(input in "[ $()ab_,\"'`\\\\\n]{0,64}") {
            for tok in scan(&input).into_iter().filter(Token::is_command) {
                let again = scan(tok.literal());
                prop_assert_eq!(again, vec![tok]);
            }
        }
    }
}
