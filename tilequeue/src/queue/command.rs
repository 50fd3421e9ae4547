//! Render commands carried by the command queue.

use crate::render::TileRenderer;
use crate::tile::TileKey;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A single tile rendering job.
///
/// Commands are created on submission and owned by exactly one worker after
/// they are dequeued. The cancel token is only attached once that worker
/// starts rendering; until then there is nothing in flight to cancel.
pub struct RenderCommand {
    key: TileKey,
    renderer: Arc<dyn TileRenderer>,
    sequence: u64,
    cancel: Option<CancellationToken>,
}

impl RenderCommand {
    /// Create a command for `key` drawn by `renderer` at viewport sequence `sequence`.
    pub fn new(key: TileKey, renderer: Arc<dyn TileRenderer>, sequence: u64) -> Self {
        Self {
            key,
            renderer,
            sequence,
            cancel: None,
        }
    }

    pub fn key(&self) -> &TileKey {
        &self.key
    }

    pub fn renderer(&self) -> &Arc<dyn TileRenderer> {
        &self.renderer
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Attach the in-flight cancel token.
    pub(crate) fn attach_cancel(&mut self, token: CancellationToken) {
        self.cancel = Some(token);
    }

    /// The in-flight cancel token, if rendering has started.
    pub fn cancel_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Returns true if rendering started and was cancelled since.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(CancellationToken::is_cancelled)
            .unwrap_or(false)
    }
}

impl fmt::Debug for RenderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCommand")
            .field("key", &self.key)
            .field("sequence", &self.sequence)
            .field("in_flight", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeoRect;
    use crate::render::renderer_fn;

    fn noop_renderer() -> Arc<dyn TileRenderer> {
        renderer_fn(|_, _, _, _| {})
    }

    #[test]
    fn test_new_command_has_no_token() {
        let key = TileKey::new(GeoRect::new(0.0, 0.0, 1.0, 1.0), 4);
        let command = RenderCommand::new(key, noop_renderer(), 3);

        assert_eq!(command.key(), &key);
        assert_eq!(command.sequence(), 3);
        assert!(command.cancel_token().is_none());
        assert!(!command.is_cancelled());
    }

    #[test]
    fn test_attached_token_reports_cancel() {
        let key = TileKey::new(GeoRect::new(0.0, 0.0, 1.0, 1.0), 4);
        let mut command = RenderCommand::new(key, noop_renderer(), 1);
        let token = CancellationToken::new();
        command.attach_cancel(token.clone());

        assert!(!command.is_cancelled());
        token.cancel();
        assert!(command.is_cancelled());
    }

    #[test]
    fn test_debug_omits_renderer() {
        let key = TileKey::new(GeoRect::new(0.0, 0.0, 1.0, 1.0), 4);
        let command = RenderCommand::new(key, noop_renderer(), 9);
        let debug = format!("{:?}", command);
        assert!(debug.contains("RenderCommand"));
        assert!(debug.contains("sequence: 9"));
    }
}
