//! System-wide key hook
//!
//! Installs a global keyboard listener so sequences fire whichever window
//! has focus. `rdev::listen` blocks its thread for the life of the process,
//! so stopping only mutes the callback and detaches the thread.

use eyre::{Result, eyre};
use rdev::{Event, EventType, Key};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// How long to wait for the hook to report a startup failure
const STARTUP_GRACE: Duration = Duration::from_millis(250);

/// Turn a hook event into a typed character, if it is one
///
/// Only key presses count. The layout-aware name wins when the platform
/// provides one; otherwise the physical key is mapped on a US layout.
pub fn decode_event(event: &Event) -> Option<char> {
    let EventType::KeyPress(key) = &event.event_type else {
        return None;
    };
    match event.name.as_deref() {
        Some(name) => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_control() => Some(c),
                _ => None,
            }
        }
        None => key_char(*key),
    }
}

fn key_char(key: Key) -> Option<char> {
    let c = match key {
        Key::KeyA => 'a',
        Key::KeyB => 'b',
        Key::KeyC => 'c',
        Key::KeyD => 'd',
        Key::KeyE => 'e',
        Key::KeyF => 'f',
        Key::KeyG => 'g',
        Key::KeyH => 'h',
        Key::KeyI => 'i',
        Key::KeyJ => 'j',
        Key::KeyK => 'k',
        Key::KeyL => 'l',
        Key::KeyM => 'm',
        Key::KeyN => 'n',
        Key::KeyO => 'o',
        Key::KeyP => 'p',
        Key::KeyQ => 'q',
        Key::KeyR => 'r',
        Key::KeyS => 's',
        Key::KeyT => 't',
        Key::KeyU => 'u',
        Key::KeyV => 'v',
        Key::KeyW => 'w',
        Key::KeyX => 'x',
        Key::KeyY => 'y',
        Key::KeyZ => 'z',
        Key::Num0 => '0',
        Key::Num1 => '1',
        Key::Num2 => '2',
        Key::Num3 => '3',
        Key::Num4 => '4',
        Key::Num5 => '5',
        Key::Num6 => '6',
        Key::Num7 => '7',
        Key::Num8 => '8',
        Key::Num9 => '9',
        Key::Space => ' ',
        Key::Quote => '\'',
        Key::SemiColon => ';',
        Key::Comma => ',',
        Key::Dot => '.',
        Key::Slash => '/',
        Key::BackSlash => '\\',
        Key::Minus => '-',
        Key::Equal => '=',
        Key::LeftBracket => '[',
        Key::RightBracket => ']',
        Key::BackQuote => '`',
        _ => return None,
    };
    Some(c)
}

/// Start the hook thread
///
/// Returns an error when the hook cannot be installed (no display server,
/// missing accessibility permission).
pub(super) fn spawn(tx: mpsc::UnboundedSender<char>, stop: Arc<AtomicBool>) -> Result<()> {
    debug!("hook::spawn: called");
    let (err_tx, err_rx) = std_mpsc::channel::<String>();

    std::thread::Builder::new()
        .name("aic-hook".to_string())
        .spawn(move || {
            let result = rdev::listen(move |event| {
                if stop.load(Ordering::Relaxed) {
                    return;
                }
                match decode_event(&event) {
                    Some(ch) => {
                        let _ = tx.send(ch);
                    }
                    None => trace!(event_type = ?event.event_type, "hook: undecodable event"),
                }
            });
            if let Err(e) = result {
                warn!(error = ?e, "global key hook failed");
                let _ = err_tx.send(format!("{:?}", e));
            }
        })
        .map_err(|e| eyre!("Failed to start key hook thread: {}", e))?;

    match err_rx.recv_timeout(STARTUP_GRACE) {
        Ok(e) => Err(eyre!("Global key hook unavailable: {}", e)),
        Err(std_mpsc::RecvTimeoutError::Timeout) => {
            debug!("hook::spawn: hook installed");
            Ok(())
        }
        Err(std_mpsc::RecvTimeoutError::Disconnected) => Err(eyre!("Global key hook exited")),
    }
}
