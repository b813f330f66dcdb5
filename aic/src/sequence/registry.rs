//! SequenceRegistry - command key to sequence table

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::builtin::MouseCoordsSequence;
use crate::actions::{ActionError, Automation};

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("sequence key {0:?} must be a single non-whitespace character")]
    InvalidKey(char),

    #[error("sequence key {0:?} is already registered")]
    Duplicate(char),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("{0}")]
    Failed(String),
}

/// What a running sequence can reach
#[derive(Clone)]
pub struct SequenceContext {
    pub automation: Arc<dyn Automation>,
}

/// An action bound to the key typed after the leader
#[async_trait]
pub trait Sequence: Send + Sync {
    fn key(&self) -> char;

    fn name(&self) -> &str;

    /// Run the sequence, returning a status line for the operator
    async fn run(&self, ctx: &SequenceContext) -> Result<String, SequenceError>;
}

/// Registered sequences, looked up case-insensitively
#[derive(Clone)]
pub struct SequenceRegistry {
    sequences: HashMap<char, Arc<dyn Sequence>>,
}

fn normalize(key: char) -> Option<char> {
    if key.is_whitespace() || key.is_control() {
        return None;
    }
    let mut lower = key.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(k), None) => Some(k),
        _ => None,
    }
}

impl SequenceRegistry {
    /// Registry holding the built-in sequences
    pub fn standard() -> Self {
        debug!("SequenceRegistry::standard: called");
        let mut sequences: HashMap<char, Arc<dyn Sequence>> = HashMap::new();
        let coords: Arc<dyn Sequence> = Arc::new(MouseCoordsSequence);
        sequences.insert(coords.key(), coords);
        Self { sequences }
    }

    pub fn empty() -> Self {
        Self {
            sequences: HashMap::new(),
        }
    }

    pub fn register(&mut self, sequence: Arc<dyn Sequence>) -> Result<(), SequenceError> {
        let raw = sequence.key();
        debug!(key = ?raw, name = sequence.name(), "SequenceRegistry::register: called");
        let key = normalize(raw).ok_or(SequenceError::InvalidKey(raw))?;
        if self.sequences.contains_key(&key) {
            return Err(SequenceError::Duplicate(key));
        }
        self.sequences.insert(key, sequence);
        Ok(())
    }

    pub fn lookup(&self, key: char) -> Option<&Arc<dyn Sequence>> {
        self.sequences.get(&normalize(key)?)
    }

    /// Registered keys with their names, sorted by key
    pub fn entries(&self) -> Vec<(char, &str)> {
        let mut entries: Vec<(char, &str)> = self.sequences.iter().map(|(k, s)| (*k, s.name())).collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        entries
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl Default for SequenceRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Runs fired keys against a registry, each in its own task
///
/// Status lines go to the optional reporter channel.
#[derive(Clone)]
pub struct SequenceDispatcher {
    registry: Arc<SequenceRegistry>,
    ctx: SequenceContext,
    reporter: Option<mpsc::UnboundedSender<String>>,
}

impl SequenceDispatcher {
    pub fn new(registry: Arc<SequenceRegistry>, ctx: SequenceContext) -> Self {
        Self {
            registry,
            ctx,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: mpsc::UnboundedSender<String>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn report(&self, line: String) {
        if let Some(tx) = &self.reporter {
            let _ = tx.send(line);
        }
    }

    /// Spawn the sequence bound to `key`; unknown keys are reported and dropped
    pub fn dispatch(&self, key: char) -> Option<JoinHandle<()>> {
        let Some(sequence) = self.registry.lookup(key).cloned() else {
            debug!(?key, "SequenceDispatcher::dispatch: unknown key");
            self.report(format!("unknown sequence {:?}", key));
            return None;
        };

        self.report(format!("sequence {} ({})", sequence.key(), sequence.name()));
        let this = self.clone();
        Some(tokio::spawn(async move {
            match sequence.run(&this.ctx).await {
                Ok(line) if line.is_empty() => {}
                Ok(line) => this.report(line),
                Err(e) => {
                    warn!(key = ?sequence.key(), error = %e, "sequence failed");
                    this.report(format!("sequence {} failed: {}", sequence.key(), e));
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(char);

    #[async_trait]
    impl Sequence for Fixed {
        fn key(&self) -> char {
            self.0
        }

        fn name(&self) -> &str {
            "fixed"
        }

        async fn run(&self, _ctx: &SequenceContext) -> Result<String, SequenceError> {
            Ok(format!("ran {}", self.0))
        }
    }

    #[test]
    fn test_standard_has_mouse_coords() {
        let registry = SequenceRegistry::standard();
        assert!(registry.lookup('1').is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_case_insensitive_duplicate() {
        let mut registry = SequenceRegistry::empty();
        registry.register(Arc::new(Fixed('A'))).unwrap();
        assert!(registry.lookup('a').is_some());
        assert!(registry.lookup('A').is_some());
        assert!(matches!(
            registry.register(Arc::new(Fixed('a'))),
            Err(SequenceError::Duplicate('a'))
        ));
    }

    #[test]
    fn test_register_rejects_whitespace() {
        let mut registry = SequenceRegistry::empty();
        assert!(matches!(
            registry.register(Arc::new(Fixed(' '))),
            Err(SequenceError::InvalidKey(' '))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_entries_sorted() {
        let mut registry = SequenceRegistry::standard();
        registry.register(Arc::new(Fixed('z'))).unwrap();
        registry.register(Arc::new(Fixed('b'))).unwrap();
        let keys: Vec<char> = registry.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!['1', 'b', 'z']);
    }

    #[tokio::test]
    async fn test_dispatch_reports() {
        let mut registry = SequenceRegistry::empty();
        registry.register(Arc::new(Fixed('x'))).unwrap();
        let ctx = SequenceContext {
            automation: Arc::new(crate::actions::SystemAutomation::detect()),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = SequenceDispatcher::new(Arc::new(registry), ctx).with_reporter(tx);

        dispatcher.dispatch('X').unwrap().await.unwrap();
        assert!(dispatcher.dispatch('q').is_none());

        assert_eq!(rx.recv().await.unwrap(), "sequence x (fixed)");
        assert_eq!(rx.recv().await.unwrap(), "ran x");
        assert_eq!(rx.recv().await.unwrap(), "unknown sequence 'q'");
    }
}
