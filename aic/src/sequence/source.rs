//! Key sources
//!
//! The global source installs a system-wide keyboard hook so sequences fire
//! in any window. The terminal source reads key events in raw mode on a
//! dedicated thread; Ctrl+C does not raise SIGINT in raw mode, so it is
//! turned into an interrupt signal. Both forward decoded characters to the
//! listener over an unbounded channel.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use eyre::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

use crate::config::KeySourceKind;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Char(char),
    Interrupt,
}

/// Turn a terminal key event into a printable character, if it is one
///
/// Releases, control characters, named keys and chords with Ctrl/Alt are
/// undecodable; Ctrl+C is an interrupt.
pub fn decode_key(key: &KeyEvent) -> Option<Decoded> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Decoded::Interrupt)
        }
        KeyCode::Char(_) if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => None,
        KeyCode::Char(c) if !c.is_control() => Some(Decoded::Char(c)),
        _ => None,
    }
}

/// Running key source; dropping it stops forwarding and restores the terminal
pub struct KeySource {
    kind: KeySourceKind,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    raw_mode: bool,
}

impl KeySource {
    /// Start forwarding keys to `tx`
    ///
    /// A global source that cannot install its hook falls back to the
    /// terminal. In the terminal, Ctrl+C sets `interrupt` to true and ends
    /// the reader thread.
    pub fn spawn(
        kind: KeySourceKind,
        tx: mpsc::UnboundedSender<char>,
        interrupt: Arc<watch::Sender<bool>>,
    ) -> Result<Self> {
        debug!(?kind, "KeySource::spawn: called");
        if kind == KeySourceKind::Global {
            match Self::spawn_global(&tx) {
                Ok(source) => return Ok(source),
                Err(e) => warn!(error = %e, "global key hook unavailable, reading keys from the terminal"),
            }
        }
        Self::spawn_terminal(tx, interrupt)
    }

    /// Which source is actually running
    pub fn kind(&self) -> KeySourceKind {
        self.kind
    }

    /// The terminal is in raw mode while this source runs
    pub fn is_raw_mode(&self) -> bool {
        self.raw_mode
    }

    #[cfg(feature = "global-keys")]
    fn spawn_global(tx: &mpsc::UnboundedSender<char>) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        super::hook::spawn(tx.clone(), stop.clone())?;
        Ok(Self {
            kind: KeySourceKind::Global,
            stop,
            thread: None,
            raw_mode: false,
        })
    }

    #[cfg(not(feature = "global-keys"))]
    fn spawn_global(_tx: &mpsc::UnboundedSender<char>) -> Result<Self> {
        Err(eyre::eyre!("built without the global-keys feature"))
    }

    fn spawn_terminal(tx: mpsc::UnboundedSender<char>, interrupt: Arc<watch::Sender<bool>>) -> Result<Self> {
        debug!("KeySource::spawn_terminal: called");
        terminal::enable_raw_mode().context("Failed to enable terminal raw mode")?;

        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let spawned = std::thread::Builder::new()
            .name("aic-keys".to_string())
            .spawn(move || read_keys(&flag, &tx, interrupt.as_ref()));

        match spawned {
            Ok(thread) => Ok(Self {
                kind: KeySourceKind::Terminal,
                stop,
                thread: Some(thread),
                raw_mode: true,
            }),
            Err(e) => {
                let _ = terminal::disable_raw_mode();
                Err(e).context("Failed to start key reader thread")
            }
        }
    }

    /// Stop forwarding keys and leave raw mode
    ///
    /// The terminal reader is joined; the global hook thread cannot be
    /// unhooked, so it is muted and left to end with the process.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.stop.swap(true, Ordering::Relaxed) {
            return;
        }
        debug!(kind = ?self.kind, "KeySource::shutdown: called");
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("key reader thread panicked");
        }
        if self.raw_mode {
            self.raw_mode = false;
            if let Err(e) = terminal::disable_raw_mode() {
                warn!(error = %e, "failed to restore terminal mode");
            }
        }
    }
}

impl Drop for KeySource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn read_keys(stop: &AtomicBool, tx: &mpsc::UnboundedSender<char>, interrupt: &watch::Sender<bool>) {
    debug!("KeySource: reader thread started");
    while !stop.load(Ordering::Relaxed) {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!(error = %e, "terminal event poll failed");
                break;
            }
        }

        let Ok(Event::Key(key)) = event::read() else {
            continue;
        };
        match decode_key(&key) {
            Some(Decoded::Char(ch)) => {
                if tx.send(ch).is_err() {
                    debug!("KeySource: listener gone, exiting");
                    break;
                }
            }
            Some(Decoded::Interrupt) => {
                debug!("KeySource: Ctrl+C");
                let _ = interrupt.send(true);
                break;
            }
            None => trace!(?key, "KeySource: undecodable key"),
        }
    }
    debug!("KeySource: reader thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_decode_printable() {
        assert_eq!(
            decode_key(&key(KeyCode::Char(';'), KeyModifiers::NONE)),
            Some(Decoded::Char(';'))
        );
        assert_eq!(
            decode_key(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(Decoded::Char('A'))
        );
        assert_eq!(
            decode_key(&key(KeyCode::Char(' '), KeyModifiers::NONE)),
            Some(Decoded::Char(' '))
        );
    }

    #[test]
    fn test_decode_ctrl_c_interrupts() {
        assert_eq!(
            decode_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Decoded::Interrupt)
        );
        assert_eq!(decode_key(&key(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn test_decode_ignores_named_and_release() {
        assert_eq!(decode_key(&key(KeyCode::Enter, KeyModifiers::NONE)), None);
        assert_eq!(decode_key(&key(KeyCode::Esc, KeyModifiers::NONE)), None);

        let release = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(decode_key(&release), None);
    }
}
