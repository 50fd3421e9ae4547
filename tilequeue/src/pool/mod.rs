//! Render target pool.
//!
//! Render targets are hardware-backed surfaces built once by the host. The
//! pool bounds how many can be in use at a time: every tile being drawn and
//! every tile sitting in the cache holds one.

mod target;
mod targets;

pub use target::{MemoryTarget, RenderTarget};
pub use targets::{PooledTarget, RenderTargetPool};
