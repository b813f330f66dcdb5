//! Host variables from `ai/vars/*`

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load `KEY=VALUE` lines from every file in `dir`
///
/// Files are read in name order so later files override earlier ones.
/// Blank lines and `#`/`//` comments are skipped, a leading `export ` is
/// allowed, and single- or double-quoted values are unquoted. A missing
/// directory yields no variables.
pub fn load_vars(dir: &Path) -> std::io::Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vars),
        Err(e) => return Err(e),
    };

    let mut files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    for path in files {
        let Ok(content) = fs::read_to_string(&path) else {
            debug!(?path, "load_vars: unreadable, skipping");
            continue;
        };
        parse_vars_into(&content, &mut vars);
    }
    debug!(count = vars.len(), "load_vars: loaded");
    Ok(vars)
}

/// Parse one vars file into `vars`
pub fn parse_vars_into(content: &str, vars: &mut HashMap<String, String>) {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let line = line.strip_prefix("export ").map(str::trim).unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(value.trim()));
    }
}

fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == b'"' && last == b'"' {
            if let Ok((s, used)) = crate::prompt::parse_quoted_prefix(value)
                && used == value.len()
            {
                return s;
            }
        } else if first == b'\'' && last == b'\'' {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}
