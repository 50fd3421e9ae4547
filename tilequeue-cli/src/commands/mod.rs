//! CLI command implementations.
//!
//! - [`bench`] - Render a synthetic viewport through the queue
//! - [`config`] - Configuration file management (path, show, init)

pub mod bench;
pub mod config;
