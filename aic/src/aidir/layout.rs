//! Prompt document layout: context section, prompt body, comments

/// Written by `aic init` and used when the prompt file is missing
pub const DEFAULT_HEADER: &str = "---\n$path(\".\")\n---\n";

/// Alternative end-of-context marker
pub const PROMPT_MARKER: &str = "=== PROMPT ===";

/// A prompt document split into its two sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections<'a> {
    /// Text between the delimiters, if the document has a context section
    pub context: Option<&'a str>,
    /// Everything after the context section
    pub body: &'a str,
}

/// Lines with their byte offsets, newline included
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0usize, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

/// Split a document into context and body
///
/// The context sits between a leading `---` line and the next `---` line.
/// Without that, a `=== PROMPT ===` line ends the context. Otherwise the
/// whole document is body.
pub fn split_sections(text: &str) -> Sections<'_> {
    let mut lines = lines_with_offsets(text).skip_while(|(_, l)| l.trim().is_empty());

    if let Some((first_start, first)) = lines.next()
        && first.trim() == "---"
    {
        let ctx_start = first_start + first.len();
        for (start, line) in lines {
            if line.trim() == "---" {
                return Sections {
                    context: Some(&text[ctx_start..start]),
                    body: &text[start + line.len()..],
                };
            }
        }
    }

    for (start, line) in lines_with_offsets(text) {
        if line.trim() == PROMPT_MARKER {
            return Sections {
                context: Some(&text[..start]),
                body: &text[start + line.len()..],
            };
        }
    }

    Sections {
        context: None,
        body: text,
    }
}

/// Remove lines whose first non-blank characters are `//`
pub fn strip_comments(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect()
}

/// Keep everything through the end of the context section and drop the body
///
/// Documents without a recognizable context section are reset to
/// [`DEFAULT_HEADER`].
pub fn clear_body(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let sections = split_sections(&normalized);
    if sections.context.is_some() {
        let keep = normalized.len() - sections.body.len();
        return with_trailing_newline(&normalized[..keep]);
    }

    DEFAULT_HEADER.to_string()
}

fn with_trailing_newline(s: &str) -> String {
    let mut out = s.to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
