//! `.gitignore` subset used when walking included directories

use glob::Pattern;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
enum Rule {
    /// `dir/` - the directory and everything under it
    Dir(String),
    /// `build/**` - everything under a relative prefix
    Prefix(String),
    /// Slash-free glob matched against every path component
    Basename(Pattern),
    /// Slashed glob matched against the whole relative path
    Path(Pattern),
}

/// Parsed ignore rules
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Load `<root>/.gitignore`; a missing or unreadable file yields no rules
    pub fn load(root: &Path) -> Self {
        let path = root.join(".gitignore");
        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                debug!(?path, %e, "IgnoreRules::load: no ignore file");
                Self::default()
            }
        }
    }

    /// Parse ignore file content
    ///
    /// Blank lines, `#` comments and `!` negations are skipped.
    pub fn parse(content: &str) -> Self {
        let mut rules = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            if let Some(prefix) = line.strip_suffix("/**") {
                rules.push(Rule::Prefix(prefix.trim_start_matches('/').to_string()));
                continue;
            }

            if let Some(dir) = line.strip_suffix('/') {
                let dir = dir.trim_start_matches('/');
                if !dir.is_empty() {
                    rules.push(Rule::Dir(dir.to_string()));
                }
                continue;
            }

            let anchored = line.trim_start_matches('/');
            let rule = if anchored.contains('/') || line.starts_with('/') {
                Pattern::new(anchored).map(Rule::Path)
            } else {
                Pattern::new(anchored).map(Rule::Basename)
            };
            match rule {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!(pattern = %line, %e, "skipping invalid ignore pattern"),
            }
        }
        debug!(count = rules.len(), "IgnoreRules::parse: parsed rules");
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a path relative to the project root is ignored
    pub fn is_ignored(&self, rel: &Path) -> bool {
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if parts.iter().any(|p| p == ".git") {
            return true;
        }
        let joined = parts.join("/");

        self.rules.iter().any(|rule| match rule {
            Rule::Dir(dir) | Rule::Prefix(dir) => joined == *dir || joined.starts_with(&format!("{}/", dir)),
            Rule::Basename(pat) => parts.iter().any(|p| pat.matches(p)),
            Rule::Path(pat) => pat.matches(&joined),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignored(rules: &IgnoreRules, p: &str) -> bool {
        rules.is_ignored(Path::new(p))
    }

    #[test]
    fn test_git_always_ignored() {
        let rules = IgnoreRules::default();
        assert!(ignored(&rules, ".git"));
        assert!(ignored(&rules, ".git/config"));
        assert!(!ignored(&rules, "src/main.rs"));
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let rules = IgnoreRules::parse("# comment\n\n   \n!keep.rs\n");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_dir_rule() {
        let rules = IgnoreRules::parse("target/\n");
        assert!(ignored(&rules, "target"));
        assert!(ignored(&rules, "target/debug/aic"));
        assert!(!ignored(&rules, "targets/x"));
    }

    #[test]
    fn test_basename_glob_matches_anywhere() {
        let rules = IgnoreRules::parse("*.log\nnode_modules\n");
        assert!(ignored(&rules, "app.log"));
        assert!(ignored(&rules, "deep/dir/app.log"));
        assert!(ignored(&rules, "web/node_modules/react/index.js"));
        assert!(!ignored(&rules, "app.logs"));
    }

    #[test]
    fn test_slashed_pattern_matches_full_path() {
        let rules = IgnoreRules::parse("docs/*.md\n/build.sh\n");
        assert!(ignored(&rules, "docs/readme.md"));
        assert!(!ignored(&rules, "other/docs/readme.md"));
        assert!(ignored(&rules, "build.sh"));
    }

    #[test]
    fn test_double_star_suffix_is_prefix() {
        let rules = IgnoreRules::parse("gen/**\n");
        assert!(ignored(&rules, "gen/a/b.rs"));
        assert!(!ignored(&rules, "general.rs"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        assert!(IgnoreRules::load(temp.path()).is_empty());
    }
}
