//! Prompt history snapshots in `ai/prompts`

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::AiDirError;

/// Write `raw` to a new timestamped snapshot and prune to `max_entries`
///
/// Snapshot names sort oldest to newest.
pub fn stash(dir: &Path, raw: &str, max_entries: usize) -> Result<PathBuf, AiDirError> {
    fs::create_dir_all(dir).map_err(|e| AiDirError::io(dir, e))?;

    let mut text = raw.replace("\r\n", "\n").trim_end_matches('\n').to_string();
    text.push('\n');

    let ts = Local::now().format("%Y%m%d_%H%M%S_%f").to_string();
    let mut path = dir.join(format!("{}.md", ts));
    let mut n = 1;
    while path.exists() {
        if n > 999 {
            return Err(AiDirError::SnapshotName);
        }
        path = dir.join(format!("{}_{:03}.md", ts, n));
        n += 1;
    }

    fs::write(&path, text).map_err(|e| AiDirError::io(&path, e))?;
    debug!(?path, "history::stash: wrote snapshot");

    prune(dir, max_entries)?;
    Ok(path)
}

/// Snapshot paths, oldest first
pub fn list(dir: &Path) -> Result<Vec<PathBuf>, AiDirError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AiDirError::io(dir, e)),
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("md")))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Delete the oldest snapshots beyond `max_entries`
pub fn prune(dir: &Path, max_entries: usize) -> Result<usize, AiDirError> {
    let files = list(dir)?;
    if files.len() <= max_entries {
        return Ok(0);
    }

    let excess = files.len() - max_entries;
    for path in &files[..excess] {
        if let Err(e) = fs::remove_file(path) {
            warn!(?path, %e, "failed to prune prompt snapshot");
        }
    }
    debug!(removed = excess, "history::prune: pruned snapshots");
    Ok(excess)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_stash_normalizes_and_lists() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("prompts");

        let path = stash(&dir, "hello\r\nworld\n\n\n", 10).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nworld\n");
        assert_eq!(list(&dir).unwrap(), vec![path]);
    }

    #[test]
    fn test_prune_keeps_newest() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        for name in ["20240101_000000_1.md", "20240102_000000_1.md", "20240103_000000_1.md"] {
            fs::write(dir.join(name), "x").unwrap();
        }
        fs::write(dir.join("notes.txt"), "not a snapshot").unwrap();

        assert_eq!(prune(dir, 2).unwrap(), 1);
        let names: Vec<String> = list(dir)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["20240102_000000_1.md", "20240103_000000_1.md"]);
        assert!(dir.join("notes.txt").exists());
    }

    #[test]
    fn test_stash_prunes() {
        let temp = tempdir().unwrap();
        let dir = temp.path();
        for i in 0..3 {
            stash(dir, &format!("prompt {}", i), 2).unwrap();
        }
        assert_eq!(list(dir).unwrap().len(), 2);
    }
}
