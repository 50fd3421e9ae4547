//! Command queue feeding the render workers.
//!
//! Strict FIFO, no priority reordering. Stale commands are not purged when
//! the viewport changes; workers compare each command's sequence against the
//! coordinator's current sequence when they dequeue it.

mod blocking;
mod command;

pub use blocking::{BlockingQueue, Popped};
pub use command::RenderCommand;

/// Queue of pending tile render commands.
pub type CommandQueue = BlockingQueue<RenderCommand>;
