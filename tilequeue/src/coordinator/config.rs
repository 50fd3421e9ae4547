//! Render queue configuration.

use crate::config::{DEFAULT_BACKGROUND, DEFAULT_INFLATION_PX};
use crate::render::Rgba;

/// Settings for a [`RenderQueue`](super::RenderQueue).
///
/// ```
/// use tilequeue::coordinator::RenderQueueConfig;
/// use tilequeue::render::Rgba;
///
/// let config = RenderQueueConfig::new()
///     .with_cache_capacity(32)
///     .with_inflation_px(16.0)
///     .with_background(Rgba::WHITE);
/// assert_eq!(config.cache_capacity(), Some(32));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderQueueConfig {
    cache_capacity: Option<usize>,
    inflation_px: f64,
    background: Rgba,
    notify_on_drain: bool,
}

impl Default for RenderQueueConfig {
    fn default() -> Self {
        Self {
            cache_capacity: None,
            inflation_px: DEFAULT_INFLATION_PX,
            background: DEFAULT_BACKGROUND,
            notify_on_drain: true,
        }
    }
}

impl RenderQueueConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum cached tiles. Capped at the pool capacity when the queue
    /// starts; without a value the cache holds one tile per render target.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        self.cache_capacity = Some(capacity);
        self
    }

    /// Symbol margin around each tile in logical pixels.
    ///
    /// # Panics
    ///
    /// Panics if `px` is negative or not finite.
    pub fn with_inflation_px(mut self, px: f64) -> Self {
        assert!(px.is_finite() && px >= 0.0, "inflation must be finite and >= 0");
        self.inflation_px = px;
        self
    }

    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = background;
        self
    }

    /// Invalidate listeners whenever the command queue runs empty, not only
    /// after commits.
    pub fn with_notify_on_drain(mut self, enabled: bool) -> Self {
        self.notify_on_drain = enabled;
        self
    }

    pub fn cache_capacity(&self) -> Option<usize> {
        self.cache_capacity
    }

    pub fn inflation_px(&self) -> f64 {
        self.inflation_px
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn notify_on_drain(&self) -> bool {
        self.notify_on_drain
    }

    /// Cache capacity to use with a pool of `pool_capacity` targets.
    pub fn effective_cache_capacity(&self, pool_capacity: usize) -> usize {
        self.cache_capacity
            .unwrap_or(pool_capacity)
            .min(pool_capacity)
    }
}
