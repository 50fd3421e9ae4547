//! Settings structs, one per `[section]` of the INI file.
//!
//! Pure data; parsing lives in [`super::parser`], serialization in
//! [`super::writer`] and defaults in [`super::defaults`].

use crate::render::Rgba;
use std::path::PathBuf;

/// Complete configuration loaded from `config.ini`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub render: RenderSettings,
    pub pool: PoolSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Worker threads, one render context each
    pub threads: usize,
    /// Symbol margin drawn around each tile, in logical pixels
    pub inflation_px: f64,
    /// Colour filled inside the tile border before drawing
    pub background: Rgba,
    /// Display density multiplier
    pub visual_scale: f64,
    /// Invalidate listeners when the command queue drains
    pub notify_on_drain: bool,
}

/// `[pool]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    /// Render targets created up front
    pub render_targets: usize,
    /// Edge length of each square target in pixels
    pub tile_size: u32,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheSettings {
    /// Maximum cached tiles; `None` means one per render target
    pub max_tiles: Option<usize>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
