//! End-to-end interpreter scenarios through the public library API

use std::fs;
use std::time::{Duration, Instant};

use aic::actions::{ActionKind, Coord, Phase};
use aic::commands::{CommandContext, CommandRegistry};
use aic::prompt::Interpreter;
use aic::sequence::{SequenceMatcher, Step};
use tempfile::TempDir;

fn interpreter(root: &TempDir) -> Interpreter {
    let ctx = CommandContext::new(root.path().to_path_buf());
    Interpreter::new(CommandRegistry::standard(), ctx)
}

#[tokio::test]
async fn test_missing_path_stays_literal() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let rendered = interpreter(&temp)
        .render_text("hello $path(\"missing.txt\") world")
        .await
        .expect("render");

    assert_eq!(rendered.output, "hello $path(\"missing.txt\") world");
    assert!(rendered.actions.is_empty());
}

#[tokio::test]
async fn test_shell_output_replaces_call() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let rendered = interpreter(&temp)
        .render_text("$sh(\"echo hi\")")
        .await
        .expect("render");

    assert!(rendered.output.contains("hi"));
    assert!(!rendered.output.contains("$sh("));
}

#[tokio::test]
async fn test_shell_combines_stderr() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let rendered = interpreter(&temp)
        .render_text("$sh(\"echo out; echo err 1>&2\")")
        .await
        .expect("render");

    assert!(rendered.output.contains("out"));
    assert!(rendered.output.contains("err"));
}

#[tokio::test]
async fn test_jump_queues_after_action() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let rendered = interpreter(&temp).render_text("a $jump(10,20) b").await.expect("render");

    assert_eq!(rendered.output, "a  b");
    assert_eq!(rendered.actions.len(), 1);
    let action = &rendered.actions[0];
    assert_eq!(action.phase, Phase::After);
    assert_eq!(
        action.kind,
        ActionKind::Jump {
            x: Coord::Literal(10),
            y: Coord::Literal(20)
        }
    );
}

#[tokio::test]
async fn test_path_inlines_project_file() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp.path().join("notes.txt"), "line one\nline two\n").expect("write");

    let rendered = interpreter(&temp)
        .render_text("see $path(\"notes.txt\")")
        .await
        .expect("render");

    assert!(rendered.output.starts_with("see FILE: "));
    assert!(rendered.output.contains("line one\nline two"));
    assert!(rendered.output.contains("read [1 files]"));
}

#[tokio::test]
async fn test_escaped_call_is_not_run() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let rendered = interpreter(&temp)
        .render_text("literal \\$sh(\"echo hi\")")
        .await
        .expect("render");

    assert_eq!(rendered.output, "literal $sh(\"echo hi\")");
}

#[test]
fn test_leader_sequence_fires() {
    let mut matcher = SequenceMatcher::new(vec![' ', '\'', ';'], Duration::from_millis(2500));
    let start = Instant::now();
    let steps: Vec<Step> = [' ', '\'', ';', '1']
        .iter()
        .enumerate()
        .map(|(i, ch)| matcher.feed(*ch, start + Duration::from_millis(100 * i as u64)))
        .collect();

    assert_eq!(steps.last(), Some(&Step::Fire('1')));
}

#[test]
fn test_leader_sequence_times_out() {
    let mut matcher = SequenceMatcher::new(vec![' ', '\'', ';'], Duration::from_millis(2500));
    let start = Instant::now();
    matcher.feed(' ', start);
    matcher.feed('\'', start + Duration::from_millis(100));
    matcher.feed(';', start + Duration::from_millis(200));

    let late = matcher.feed('1', start + Duration::from_millis(200) + Duration::from_secs(3));
    assert_ne!(late, Step::Fire('1'));
    assert_eq!(matcher.stage(), 0);
}
