//! INI parsing: `Ini` → [`ConfigFile`].
//!
//! The only place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::MIN_TILE_SIZE;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::render::Rgba;

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Parse `key` from `props` if present.
fn parse_key<T: FromStr>(
    props: &Properties,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    match props.get(key) {
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, v, reason)),
        None => Ok(None),
    }
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [render]
    if let Some(props) = ini.section(Some("render")) {
        if let Some(threads) =
            parse_key::<usize>(props, "render", "threads", "must be a positive integer")?
        {
            if threads == 0 {
                return Err(invalid("render", "threads", "0", "must be at least 1"));
            }
            config.render.threads = threads;
        }
        if let Some(px) = parse_key::<f64>(props, "render", "inflation_px", "must be a number")? {
            if !px.is_finite() || px < 0.0 {
                return Err(invalid(
                    "render",
                    "inflation_px",
                    &px.to_string(),
                    "must be a finite number >= 0",
                ));
            }
            config.render.inflation_px = px;
        }
        if let Some(v) = props.get("background") {
            config.render.background = v
                .parse::<Rgba>()
                .map_err(|e| invalid("render", "background", v, e.to_string()))?;
        }
        if let Some(scale) =
            parse_key::<f64>(props, "render", "visual_scale", "must be a number")?
        {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(invalid(
                    "render",
                    "visual_scale",
                    &scale.to_string(),
                    "must be a finite number > 0",
                ));
            }
            config.render.visual_scale = scale;
        }
        if let Some(v) = props.get("notify_on_drain") {
            config.render.notify_on_drain = parse_bool("render", "notify_on_drain", v)?;
        }
    }

    // [pool]
    if let Some(props) = ini.section(Some("pool")) {
        if let Some(targets) =
            parse_key::<usize>(props, "pool", "render_targets", "must be a positive integer")?
        {
            if targets == 0 {
                return Err(invalid("pool", "render_targets", "0", "must be at least 1"));
            }
            config.pool.render_targets = targets;
        }
        if let Some(size) =
            parse_key::<u32>(props, "pool", "tile_size", "must be a positive integer (pixels)")?
        {
            if size < MIN_TILE_SIZE {
                return Err(invalid(
                    "pool",
                    "tile_size",
                    &size.to_string(),
                    format!("must be at least {} pixels", MIN_TILE_SIZE),
                ));
            }
            config.pool.tile_size = size;
        }
    }

    // [cache]
    if let Some(props) = ini.section(Some("cache")) {
        if let Some(v) = props.get("max_tiles") {
            let v = v.trim();
            config.cache.max_tiles = if v.is_empty() {
                None
            } else {
                match v.parse::<usize>() {
                    Ok(n) if n > 0 => Some(n),
                    _ => {
                        return Err(invalid(
                            "cache",
                            "max_tiles",
                            v,
                            "must be a positive integer, or empty for one per render target",
                        ))
                    }
                }
            };
        }
    }

    // [logging]
    if let Some(props) = ini.section(Some("logging")) {
        if let Some(v) = props.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
