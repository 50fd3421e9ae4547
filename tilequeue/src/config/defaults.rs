//! Default values for every configuration setting.

use super::file::config_directory;
use super::settings::*;
use crate::render::Rgba;

/// Upper bound on default worker threads; more rarely helps a GPU.
pub const MAX_DEFAULT_THREADS: usize = 4;

/// Symbol margin around each tile in logical pixels.
pub const DEFAULT_INFLATION_PX: f64 = 24.0;

pub const DEFAULT_VISUAL_SCALE: f64 = 1.0;

pub const DEFAULT_RENDER_TARGETS: usize = 64;

pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Smallest target that still has a pixel inside the 1px border.
pub const MIN_TILE_SIZE: u32 = 3;

pub const DEFAULT_BACKGROUND: Rgba = Rgba::MAP_BACKGROUND;

/// Number of available CPU cores.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

/// Default worker threads: one per core, capped at [`MAX_DEFAULT_THREADS`].
pub fn default_threads() -> usize {
    num_cpus().clamp(1, MAX_DEFAULT_THREADS)
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            inflation_px: DEFAULT_INFLATION_PX,
            background: DEFAULT_BACKGROUND,
            visual_scale: DEFAULT_VISUAL_SCALE,
            notify_on_drain: true,
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            render_targets: DEFAULT_RENDER_TARGETS,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: config_directory()
                .join("logs")
                .join(crate::logging::default_log_file()),
        }
    }
}
