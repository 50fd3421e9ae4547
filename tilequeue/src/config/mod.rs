//! User configuration stored in `~/.tilequeue/config.ini`.
//!
//! ```ini
//! [render]
//! threads = 4
//! inflation_px = 24
//! background = #f2efe9
//!
//! [pool]
//! render_targets = 64
//! tile_size = 256
//! ```
//!
//! Library callers that do not want a file build a
//! [`RenderQueueConfig`](crate::coordinator::RenderQueueConfig) directly.

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, LoggingSettings, PoolSettings, RenderSettings};
