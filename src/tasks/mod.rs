//! Background Tasks Module
//!
//! Periodic maintenance for the cache layer.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
