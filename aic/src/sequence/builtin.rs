//! Built-in sequences

use async_trait::async_trait;
use tracing::debug;

use super::registry::{Sequence, SequenceContext, SequenceError};

/// `1`: report the pointer position, handy for writing `$jump(...)` calls
pub struct MouseCoordsSequence;

#[async_trait]
impl Sequence for MouseCoordsSequence {
    fn key(&self) -> char {
        '1'
    }

    fn name(&self) -> &str {
        "print pointer position"
    }

    async fn run(&self, ctx: &SequenceContext) -> Result<String, SequenceError> {
        debug!("MouseCoordsSequence::run: called");
        let (x, y) = ctx.automation.mouse_position().await?;
        Ok(format!("pointer at ({}, {})", x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionError, Automation, MouseButton};
    use crate::keys::Modifier;
    use std::sync::Arc;
    use std::time::Duration;

    struct At(i64, i64);

    #[async_trait]
    impl Automation for At {
        async fn move_mouse(&self, _: i64, _: i64) -> Result<(), ActionError> {
            Ok(())
        }
        async fn click(&self, _: MouseButton) -> Result<(), ActionError> {
            Ok(())
        }
        async fn press_key(&self, _: &str) -> Result<(), ActionError> {
            Ok(())
        }
        async fn type_text(&self, _: &str, _: &[Modifier], _: Duration) -> Result<(), ActionError> {
            Ok(())
        }
        async fn mouse_position(&self) -> Result<(i64, i64), ActionError> {
            Ok((self.0, self.1))
        }
    }

    #[tokio::test]
    async fn test_reports_position() {
        let ctx = SequenceContext {
            automation: Arc::new(At(640, -12)),
        };
        assert_eq!(MouseCoordsSequence.run(&ctx).await.unwrap(), "pointer at (640, -12)");
    }
}
