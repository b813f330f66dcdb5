//! Command system for prompt calls
//!
//! Each `$name(...)` call in a prompt is handled by a [`CommandHandler`]
//! looked up in the [`CommandRegistry`]. Handlers validate arguments into a
//! typed [`Call`] and later render that call to text, queueing post-actions
//! for anything that must happen outside the rendered output.

mod call;
mod context;
mod error;
mod registry;
mod traits;

pub mod builtin;

pub use call::{Call, SkillTarget};
pub use context::CommandContext;
pub use error::CommandError;
pub use registry::CommandRegistry;
pub use traits::{CommandHandler, RenderScope};
pub(crate) use traits::{no_args, one_string};
