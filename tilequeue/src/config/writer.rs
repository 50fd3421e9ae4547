//! INI serialization: [`ConfigFile`] → commented `config.ini` text.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to the commented INI written by `save_to`.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let max_tiles = config
        .cache
        .max_tiles
        .map(|n| n.to_string())
        .unwrap_or_default();

    format!(
        r#"[render]
; Worker threads, each with its own render context (default: CPU cores, max 4)
threads = {}
; Margin in logical pixels drawn around every tile so symbols and labels
; crossing a tile edge are not cut off (default: 24)
inflation_px = {}
; Background colour filled inside the 1px transparent tile border
; Format: #rrggbb or #rrggbbaa
background = {}
; Display density multiplier, 2 on high-DPI screens (default: 1)
visual_scale = {}
; Redraw the screen once the render queue runs empty (default: true)
notify_on_drain = {}

[pool]
; Render targets created at start-up. Every tile being drawn and every
; cached tile holds one (default: 64)
render_targets = {}
; Edge length of each square render target in pixels (default: 256)
tile_size = {}

[cache]
; Maximum number of cached tiles. Leave empty for one per render target.
; Values above render_targets are capped at render_targets.
max_tiles = {}

[logging]
; Log file, truncated at the start of every session
file = {}
"#,
        config.render.threads,
        config.render.inflation_px,
        config.render.background,
        config.render.visual_scale,
        config.render.notify_on_drain,
        config.pool.render_targets,
        config.pool.tile_size,
        max_tiles,
        path_to_string(&config.logging.file),
    )
}

/// Display a path, abbreviating the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
