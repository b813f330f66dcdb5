//! Leader-key sequences
//!
//! Typing the leader keys (space, `'`, `;` by default) followed by one
//! command key runs the sequence registered on that key. The pieces:
//! a [`KeySource`] (a global keyboard hook, or raw-mode terminal reads)
//! decodes keys, the [`SequenceListener`] task coalesces repeats and feeds
//! the [`SequenceMatcher`], and a [`SequenceDispatcher`] runs the fired
//! sequence on its own task.

mod builtin;
#[cfg(feature = "global-keys")]
mod hook;
mod listener;
mod matcher;
mod registry;
mod source;

pub use builtin::MouseCoordsSequence;
#[cfg(feature = "global-keys")]
pub use hook::decode_event;
pub use listener::{SequenceHandle, SequenceListener};
pub use matcher::{SequenceMatcher, Step};
pub use registry::{Sequence, SequenceContext, SequenceDispatcher, SequenceError, SequenceRegistry};
pub use source::{Decoded, KeySource, decode_key};
