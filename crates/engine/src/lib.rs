//! Facet engine: the debounced Search Pipeline, the panel Visibility State
//! Machine, and a tokio driver that hosts both.
//!
//! The core (`SearchEngine`) is synchronous and takes `now` on every call that
//! schedules or fires a timer. `spawn_engine` wraps it for async hosts.

#![forbid(unsafe_code)]

mod driver;
mod engine;
mod event;
mod snapshot;
mod timer;
mod visibility;

pub use driver::{spawn_engine, Command, EngineHandle};
pub use engine::SearchEngine;
pub use event::EngineEvent;
pub use snapshot::{CategoryChip, GroupView, Snapshot};
pub use timer::Deadline;
pub use visibility::Visibility;
