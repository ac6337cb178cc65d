//! Typed change notifications.
//!
//! Every mutation of the panel core is announced through exactly one
//! [`RackEvent`], emitted strictly after the mutation is fully applied, so
//! the UI layer can re-render incrementally instead of rebuilding. The
//! owning panel forwards all sub-model notifications onto one unified
//! stream.

use crate::model::rack::GroupId;
use crate::registry::PresetId;

/// A change notification from the panel core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RackEvent {
    /// Presets were added to a group.
    ItemsAdded { group: GroupId, ids: Vec<PresetId> },

    /// Preset references were removed from their groups.
    ItemsRemoved { ids: Vec<PresetId> },

    /// A batch of presets moved (possibly across groups) as one contiguous
    /// block, now sitting at `index` in `group`.
    ItemsMoved {
        group: GroupId,
        index: usize,
        ids: Vec<PresetId>,
    },

    /// A new group was created.
    GroupAdded { group: GroupId },

    /// A batch of groups moved within the root ordering, now sitting at
    /// `index`.
    GroupsMoved { index: usize, groups: Vec<GroupId> },

    /// A group was renamed.
    GroupRenamed { group: GroupId, name: String },

    /// A group was deleted; its item references were released (the host
    /// presets themselves are untouched).
    GroupDeleted {
        group: GroupId,
        released: Vec<PresetId>,
    },

    /// A group collapsed or uncollapsed.
    GroupCollapsed { group: GroupId, collapsed: bool },

    /// The active group changed.
    ActiveGroupChanged { group: Option<GroupId> },

    /// The selection changed.
    SelectionChanged,

    /// A preset's thumbnail changed; the UI should re-fetch its bitmap.
    ItemDirty { id: PresetId },

    /// A preset was renamed in the host.
    ItemRenamed { id: PresetId, name: String },

    /// The host's active preset changed.
    ActivePresetChanged { id: Option<PresetId> },

    /// The whole model was replaced from a snapshot.
    ModelRestored,
}
