//! PromptWatcher - re-run the pipeline whenever the prompt document changes
//!
//! Polls the document's modification time and size. A change arms a
//! debounce timer that restarts on every further change; once the document
//! has been quiet for the debounce window a pass runs. The baseline is
//! re-read after every pass so the pass's own writes (`$clear()`) do not
//! trigger another one.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::pipeline::{PassOutcome, PromptPipeline};

/// What a watch cycle produced
#[derive(Debug)]
pub enum WatchEvent {
    /// The pass run at startup
    Initial(PassOutcome),
    /// A pass triggered by a change
    Updated(PassOutcome),
    /// A pass failed; watching continues
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

fn fingerprint(path: &Path) -> Option<Fingerprint> {
    let meta = fs::metadata(path).ok()?;
    Some(Fingerprint {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

pub struct PromptWatcher {
    pipeline: PromptPipeline,
    poll: Duration,
    debounce: Duration,
}

impl PromptWatcher {
    pub fn new(pipeline: PromptPipeline, poll: Duration, debounce: Duration) -> Self {
        debug!(?poll, ?debounce, "PromptWatcher::new: called");
        Self {
            pipeline,
            // a zero period would make tokio::time::interval panic
            poll: poll.max(Duration::from_millis(1)),
            debounce,
        }
    }

    pub fn pipeline(&self) -> &PromptPipeline {
        &self.pipeline
    }

    /// Watch until `shutdown` flips to true or its sender is dropped
    pub async fn run<F>(&self, mut shutdown: watch::Receiver<bool>, mut report: F)
    where
        F: FnMut(WatchEvent),
    {
        let path = self.pipeline.dir().prompt_path();
        info!(path = %path.display(), "watching prompt document");

        report(self.pass(true).await);
        let mut baseline = fingerprint(&path);
        let mut pending_since: Option<Instant> = None;

        let mut ticker = tokio::time::interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("PromptWatcher::run: shutdown requested");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let current = fingerprint(&path);
                    if current != baseline {
                        debug!("PromptWatcher::run: change detected");
                        baseline = current;
                        pending_since = Some(Instant::now());
                    }

                    if let Some(since) = pending_since
                        && since.elapsed() >= self.debounce
                    {
                        pending_since = None;
                        report(self.pass(false).await);
                        baseline = fingerprint(&path);
                    }
                }
            }
        }
    }

    async fn pass(&self, initial: bool) -> WatchEvent {
        match self.pipeline.run_once().await {
            Ok(outcome) if initial => WatchEvent::Initial(outcome),
            Ok(outcome) => WatchEvent::Updated(outcome),
            Err(e) => {
                warn!(error = %e, "render pass failed");
                WatchEvent::Failed(format!("{:#}", e))
            }
        }
    }
}
