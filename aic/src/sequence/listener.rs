//! SequenceListener - background consumer of decoded keys

use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::matcher::{SequenceMatcher, Step};
use crate::config::SequenceConfig;

/// Matcher plus key-repeat coalescing
#[derive(Debug, Clone)]
pub struct SequenceListener {
    matcher: SequenceMatcher,
    dedupe: Duration,
    last_key: Option<(char, Instant)>,
}

impl SequenceListener {
    pub fn new(matcher: SequenceMatcher, dedupe: Duration) -> Self {
        Self {
            matcher,
            dedupe,
            last_key: None,
        }
    }

    pub fn from_config(config: &SequenceConfig) -> Self {
        Self::new(SequenceMatcher::from_config(config), config.dedupe_window())
    }

    /// Process one key; returns the command key when a sequence completes
    pub fn on_key(&mut self, ch: char, at: Instant) -> Option<char> {
        if let Some((last, seen)) = self.last_key
            && last == ch
            && at.saturating_duration_since(seen) < self.dedupe
        {
            trace!(?ch, "SequenceListener::on_key: repeat coalesced");
            return None;
        }
        self.last_key = Some((ch, at));

        match self.matcher.feed(ch, at) {
            Step::Fire(key) => {
                debug!(?key, "SequenceListener::on_key: sequence fired");
                Some(key)
            }
            step => {
                trace!(?step, stage = self.matcher.stage(), "SequenceListener::on_key: step");
                None
            }
        }
    }

    /// Consume `source` on a background task, calling `dispatch` for each
    /// fired command key
    ///
    /// `dispatch` must not block; spawn anything long-running.
    pub fn start<D>(mut self, mut source: mpsc::UnboundedReceiver<char>, dispatch: D) -> SequenceHandle
    where
        D: Fn(char) + Send + 'static,
    {
        debug!(leader = ?self.matcher.leader(), "SequenceListener::start: called");
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => {
                        debug!("SequenceListener: stop requested");
                        break;
                    }
                    key = source.recv() => {
                        let Some(ch) = key else {
                            debug!("SequenceListener: key source closed");
                            break;
                        };
                        if let Some(command) = self.on_key(ch, Instant::now()) {
                            dispatch(command);
                        }
                    }
                }
            }
        });

        SequenceHandle { stop_tx, task }
    }
}

/// Stops a running listener
pub struct SequenceHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SequenceHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the listener and wait for it to exit
    pub async fn stop(self) {
        debug!("SequenceHandle::stop: called");
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            debug!(error = %e, "SequenceHandle::stop: listener task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn listener() -> SequenceListener {
        SequenceListener::from_config(&SequenceConfig::default())
    }

    #[test]
    fn test_repeat_within_window_coalesced() {
        let mut l = listener();
        let t = Instant::now();
        assert_eq!(l.on_key(' ', t), None);
        // auto-repeat of the space must not count as a second key
        assert_eq!(l.on_key(' ', t + Duration::from_millis(20)), None);
        assert_eq!(l.on_key('\'', t + Duration::from_millis(100)), None);
        assert_eq!(l.on_key(';', t + Duration::from_millis(200)), None);
        assert_eq!(l.on_key('1', t + Duration::from_millis(300)), Some('1'));
    }

    #[test]
    fn test_repeat_after_window_counts() {
        let mut l = listener();
        let t = Instant::now();
        l.on_key(' ', t);
        l.on_key('\'', t + Duration::from_millis(100));
        l.on_key(';', t + Duration::from_millis(200));
        l.on_key('x', t + Duration::from_millis(300));
        // second 'x' is outside the window and starts nothing
        assert_eq!(l.on_key('x', t + Duration::from_millis(400)), None);
    }

    #[tokio::test]
    async fn test_start_dispatches_and_stops() {
        let (tx, rx) = mpsc::unbounded_channel();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();
        let handle = listener().start(rx, move |key| sink.lock().unwrap().push(key));

        for ch in " ';Z".chars() {
            tx.send(ch).unwrap();
            tokio::time::sleep(Duration::from_millis(80)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.lock().unwrap().as_slice(), &['z']);

        assert!(!handle.is_finished());
        handle.stop().await;
    }

    #[tokio::test]
    async fn test_ends_when_source_closes() {
        let (tx, rx) = mpsc::unbounded_channel::<char>();
        let handle = listener().start(rx, |_| {});
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle.stop()).await.unwrap();
    }
}
