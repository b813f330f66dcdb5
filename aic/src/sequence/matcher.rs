//! Leader-key state machine

use std::time::{Duration, Instant};
use tracing::trace;

use crate::config::SequenceConfig;

/// Outcome of feeding one key to the matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing in progress and the key did not start a sequence
    Idle,
    /// The key matched the next leader character; holds the new stage
    Advanced(usize),
    /// The key broke the sequence but is the first leader character
    Restarted,
    /// The sequence in progress was abandoned
    Broken,
    /// The leader was complete and this lowercased key is the command
    Fire(char),
}

/// Tracks progress through the leader keys
///
/// Stage `k` means the first `k` leader characters have been typed.
/// Stage `leader.len()` means the next key is the command key.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    leader: Vec<char>,
    stage: usize,
    last_event: Option<Instant>,
    step_timeout: Duration,
}

impl SequenceMatcher {
    pub fn new(leader: Vec<char>, step_timeout: Duration) -> Self {
        Self {
            leader,
            stage: 0,
            last_event: None,
            step_timeout,
        }
    }

    pub fn from_config(config: &SequenceConfig) -> Self {
        Self::new(config.leader.clone(), config.step_timeout())
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn leader(&self) -> &[char] {
        &self.leader
    }

    pub fn reset(&mut self) {
        self.stage = 0;
        self.last_event = None;
    }

    /// Feed one decoded key observed at `at`
    pub fn feed(&mut self, ch: char, at: Instant) -> Step {
        if let Some(last) = self.last_event
            && at.saturating_duration_since(last) > self.step_timeout
            && self.stage > 0
        {
            trace!(stage = self.stage, "SequenceMatcher::feed: step timeout, resetting");
            self.stage = 0;
        }
        self.last_event = Some(at);

        // An empty leader never fires
        let Some(&first) = self.leader.first() else {
            return Step::Idle;
        };

        if self.stage == self.leader.len() {
            self.stage = 0;
            return match command_key(ch) {
                Some(key) => Step::Fire(key),
                None => {
                    trace!(?ch, "SequenceMatcher::feed: rejected command key");
                    Step::Broken
                }
            };
        }

        if ch == self.leader[self.stage] {
            self.stage += 1;
            trace!(stage = self.stage, "SequenceMatcher::feed: advanced");
            return Step::Advanced(self.stage);
        }

        if ch == first {
            self.stage = 1;
            return Step::Restarted;
        }

        let was = self.stage;
        self.stage = 0;
        if was > 0 { Step::Broken } else { Step::Idle }
    }
}

/// Lowercase a command key; whitespace and keys lowercasing to more than one
/// character are rejected
fn command_key(ch: char) -> Option<char> {
    if ch.is_whitespace() || ch.is_control() {
        return None;
    }
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(key), None) => Some(key),
        _ => None,
    }
}
