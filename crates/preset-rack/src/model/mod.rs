//! Ordering, selection, and navigation models.
//!
//! Three collaborators live here:
//!
//! - [`rack::RackModel`] — the sole owner of sequencing: the root ordering
//!   of groups and the ordered preset references within each group.
//! - [`selection::SelectionModel`] — single/toggle/range selection over
//!   the visible presets or the groups, with the range anchor.
//! - [`cycle`] — next/previous navigation within the active group.
//!
//! The models emit typed change notifications ([`crate::events::RackEvent`])
//! strictly after each mutation is applied; the UI layer subscribes instead
//! of being called back directly, which keeps the core host-agnostic and
//! independently testable.

pub mod cycle;
pub mod rack;
pub mod selection;

pub use rack::{AddOutcome, Group, GroupId, RackModel};
pub use selection::{ClickModifiers, SelectionKind, SelectionModel};
