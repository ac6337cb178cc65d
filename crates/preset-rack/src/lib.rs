//! Ordering/grouping core for a preset organizer panel.
//!
//! This crate lets a visual tool organize a large, mutable collection of
//! named presets into user-defined ordered groups — with multi-select
//! drag-and-drop reordering, range selection, and next/previous cycling —
//! while a background change detector keeps thumbnail previews fresh
//! without visible CPU cost during interactive use.
//!
//! # Components
//!
//! - [`registry::PresetRegistry`] — cached display metadata per preset
//!   (name, role, thumbnail signature, dirty flag). No ordering.
//! - [`model::RackModel`] — the group/order model: sole owner of the root
//!   group ordering and each group's item sequence, with atomic batch
//!   moves and active/collapse invariants.
//! - [`model::SelectionModel`] — single/toggle/range selection over items
//!   or groups, with the range anchor.
//! - [`drag::DragController`] — turns press/move/release gestures into one
//!   atomic batch reorder.
//! - [`detector::ThumbnailDetector`] — bounded rotating-batch signature
//!   sampling that flags visually changed thumbnails.
//! - [`model::cycle`] — next/previous navigation in the active group.
//! - [`panel::PresetPanel`] — the owning context that wires everything to
//!   one event stream and to the [`host::PresetHost`] collaborator.
//!
//! # Example
//!
//! ```ignore
//! use preset_rack::prelude::*;
//!
//! let mut panel = PresetPanel::new(host);
//! panel.refresh_from_host()?;
//! panel.set_visible(true);
//!
//! panel.events().connect(|event| match event {
//!     RackEvent::ItemDirty { id } => refetch_thumbnail(id),
//!     RackEvent::ItemsMoved { .. } => relayout(),
//!     _ => {}
//! });
//! ```
//!
//! The whole core runs on the UI's single cooperative thread; background
//! work happens in bounded timer ticks driven by
//! [`panel::PresetPanel::pump`].

pub mod detector;
pub mod drag;
pub mod error;
pub mod events;
pub mod geometry;
pub mod host;
pub mod model;
pub mod panel;
pub mod persist;
pub mod prelude;
pub mod registry;
pub mod signature;

pub use error::{RackError, Result};
pub use events::RackEvent;
pub use panel::{PanelConfig, PresetPanel};
pub use registry::PresetId;
