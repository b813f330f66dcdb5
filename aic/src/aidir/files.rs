//! File collection for `$path(...)` and the rules section

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::IgnoreRules;

/// Totals over the files rendered by one include
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub files: usize,
    pub lines: usize,
    pub chars: usize,
}

impl ReadStats {
    pub fn add(&mut self, content: &str) {
        self.files += 1;
        self.lines += content.lines().count();
        self.chars += content.chars().count();
    }

    /// `read [N files] [L lines] [C characters]`
    pub fn summary(&self) -> String {
        format!(
            "read [{} files] [{} lines] [{} characters]\n",
            self.files, self.lines, self.chars
        )
    }
}

/// Read a file as text; `None` for binary (NUL bytes) or non-UTF-8 content
pub fn read_text_file(path: &Path) -> std::io::Result<Option<String>> {
    let bytes = fs::read(path)?;
    if bytes.contains(&0) {
        debug!(?path, "read_text_file: NUL byte, skipping");
        return Ok(None);
    }
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(_) => {
            debug!(?path, "read_text_file: invalid UTF-8, skipping");
            Ok(None)
        }
    }
}

/// Collect regular files at or under `target`, sorted by path
///
/// Entries are filtered through `ignore` using their path relative to
/// `root`. A file target is returned as-is.
pub fn collect_files(root: &Path, target: &Path, ignore: &IgnoreRules) -> Vec<PathBuf> {
    debug!(?target, "collect_files: called");
    if target.is_file() {
        return vec![target.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(target)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match entry.path().strip_prefix(root) {
            Ok(rel) if !rel.as_os_str().is_empty() => !ignore.is_ignored(rel),
            _ => true,
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!(count = files.len(), "collect_files: returning");
    files
}

/// Render files as `FILE: <path>\n<content>\n\n` blocks followed by the
/// read summary line
pub fn render_files(files: &[PathBuf]) -> std::io::Result<String> {
    let mut out = String::new();
    let mut stats = ReadStats::default();
    for path in files {
        let Some(content) = read_text_file(path)? else {
            continue;
        };
        out.push_str(&format!("FILE: {}\n{}\n\n", path.display(), content));
        stats.add(&content);
    }
    out.push_str(&stats.summary());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_text_file_skips_binary() {
        let temp = tempdir().unwrap();
        let text = temp.path().join("a.txt");
        let bin = temp.path().join("b.bin");
        let latin = temp.path().join("c.txt");
        fs::write(&text, "hello").unwrap();
        fs::write(&bin, [b'a', 0, b'b']).unwrap();
        fs::write(&latin, [0xff, 0xfe, b'x']).unwrap();

        assert_eq!(read_text_file(&text).unwrap().as_deref(), Some("hello"));
        assert_eq!(read_text_file(&bin).unwrap(), None);
        assert_eq!(read_text_file(&latin).unwrap(), None);
    }

    #[test]
    fn test_collect_sorted_and_ignored() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/b")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("src/z.rs"), "z").unwrap();
        fs::write(root.join("src/a.rs"), "a").unwrap();
        fs::write(root.join("src/b/c.rs"), "c").unwrap();
        fs::write(root.join("target/out"), "o").unwrap();
        fs::write(root.join(".git/HEAD"), "h").unwrap();
        fs::write(root.join("debug.log"), "l").unwrap();

        let ignore = IgnoreRules::parse("target/\n*.log\n");
        let files = collect_files(root, root, &ignore);
        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(rel, vec!["src/a.rs", "src/b/c.rs", "src/z.rs"]);
    }

    #[test]
    fn test_render_files_format() {
        let temp = tempdir().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.bin");
        fs::write(&a, "line1\nline2").unwrap();
        fs::write(&b, [0u8, 1, 2]).unwrap();

        let out = render_files(&[a.clone(), b]).unwrap();
        assert_eq!(
            out,
            format!(
                "FILE: {}\nline1\nline2\n\nread [1 files] [2 lines] [11 characters]\n",
                a.display()
            )
        );
    }
}
