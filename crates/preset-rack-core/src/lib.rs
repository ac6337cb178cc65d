//! Runtime plumbing for the preset-rack panel core.
//!
//! This crate carries the host-agnostic pieces the domain core is built on:
//!
//! - [`Signal`] — a Qt-style signal/slot mechanism for change notification,
//!   dispatched synchronously on the panel's single cooperative thread.
//! - [`TimerManager`] — one-shot and repeating timers driven by the owning
//!   UI's event loop, used for the background thumbnail sampling ticks.
//!
//! No domain types live here; see the `preset-rack` crate for the item
//! registry, group/order model, and the rest of the panel core.

pub mod logging;
pub mod signal;
pub mod timer;

pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use timer::{TimerError, TimerId, TimerKind, TimerManager};
