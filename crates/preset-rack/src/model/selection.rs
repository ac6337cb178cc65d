//! Selection model for the panel.
//!
//! Tracks single, toggled (ctrl) and range (shift) selection over the
//! currently visible presets, or over groups — never both at once:
//! clicking into the other kind clears the previous set. A single anchor
//! (the last explicit click) drives range selection.
//!
//! The model is independent of ordering; callers pass the current display
//! order into the methods that need one, the same way the view supplies
//! row counts to a selection model elsewhere.

use std::collections::HashSet;

use preset_rack_core::Signal;

use crate::model::rack::GroupId;
use crate::registry::PresetId;

/// Keyboard modifiers held during a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickModifiers {
    /// Toggle membership instead of replacing the selection.
    pub ctrl: bool,
    /// Select the contiguous range from the anchor.
    pub shift: bool,
}

impl ClickModifiers {
    /// A plain, unmodified click.
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
    };

    /// A ctrl-modified click.
    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
    };

    /// A shift-modified click.
    pub const SHIFT: Self = Self {
        ctrl: false,
        shift: true,
    };
}

/// Which kind of element the selection currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Items,
    Groups,
}

/// Tracks the selected presets or groups and the range anchor.
pub struct SelectionModel {
    selected_items: HashSet<PresetId>,
    selected_groups: HashSet<GroupId>,
    anchor_item: Option<PresetId>,
    anchor_group: Option<GroupId>,
    /// Emitted when the selection changes.
    pub selection_changed: Signal<()>,
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionModel {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self {
            selected_items: HashSet::new(),
            selected_groups: HashSet::new(),
            anchor_item: None,
            anchor_group: None,
            selection_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The kind of element currently selected, if any.
    pub fn kind(&self) -> Option<SelectionKind> {
        if !self.selected_items.is_empty() {
            Some(SelectionKind::Items)
        } else if !self.selected_groups.is_empty() {
            Some(SelectionKind::Groups)
        } else {
            None
        }
    }

    /// Whether anything is selected.
    pub fn has_selection(&self) -> bool {
        !self.selected_items.is_empty() || !self.selected_groups.is_empty()
    }

    /// Whether a preset is selected.
    pub fn is_item_selected(&self, id: &PresetId) -> bool {
        self.selected_items.contains(id)
    }

    /// Whether a group is selected.
    pub fn is_group_selected(&self, id: GroupId) -> bool {
        self.selected_groups.contains(&id)
    }

    /// The range anchor among items.
    pub fn anchor_item(&self) -> Option<&PresetId> {
        self.anchor_item.as_ref()
    }

    /// The range anchor among groups.
    pub fn anchor_group(&self) -> Option<GroupId> {
        self.anchor_group
    }

    /// Number of selected items.
    pub fn item_count(&self) -> usize {
        self.selected_items.len()
    }

    /// The selected presets, ordered by the given display order.
    ///
    /// The drag engine always commits moves in this order so relative order
    /// stays stable across non-contiguous multi-selects.
    pub fn selected_items_in(&self, display_order: &[PresetId]) -> Vec<PresetId> {
        display_order
            .iter()
            .filter(|id| self.selected_items.contains(*id))
            .cloned()
            .collect()
    }

    /// The selected groups, ordered by the root ordering.
    pub fn selected_groups_in(&self, order: &[GroupId]) -> Vec<GroupId> {
        order
            .iter()
            .filter(|id| self.selected_groups.contains(*id))
            .copied()
            .collect()
    }

    // =========================================================================
    // Clicks
    // =========================================================================

    /// Apply a click on a preset.
    ///
    /// Plain click selects just this preset and anchors on it. Ctrl toggles
    /// membership and moves the anchor. Shift replaces the selection with
    /// the contiguous range between the anchor and this preset in
    /// `display_order`, leaving the anchor where it was; without a usable
    /// anchor it falls back to a plain click.
    pub fn click_item(&mut self, id: &PresetId, mods: ClickModifiers, display_order: &[PresetId]) {
        let had_groups = !self.selected_groups.is_empty();
        self.selected_groups.clear();
        self.anchor_group = None;

        let before = self.selected_items.clone();

        if mods.shift {
            let range = self.anchor_item.as_ref().and_then(|anchor| {
                let a = display_order.iter().position(|x| x == anchor)?;
                let b = display_order.iter().position(|x| x == id)?;
                Some((a.min(b), a.max(b)))
            });
            match range {
                Some((lo, hi)) => {
                    self.selected_items = display_order[lo..=hi].iter().cloned().collect();
                }
                None => {
                    self.selected_items = HashSet::from([id.clone()]);
                    self.anchor_item = Some(id.clone());
                }
            }
        } else if mods.ctrl {
            if !self.selected_items.remove(id) {
                self.selected_items.insert(id.clone());
            }
            self.anchor_item = Some(id.clone());
        } else {
            self.selected_items = HashSet::from([id.clone()]);
            self.anchor_item = Some(id.clone());
        }

        if had_groups || self.selected_items != before {
            self.selection_changed.emit(());
        }
    }

    /// Apply a click on a group header. Same modifier semantics as
    /// [`click_item`](Self::click_item), ranging over the root ordering.
    pub fn click_group(&mut self, id: GroupId, mods: ClickModifiers, order: &[GroupId]) {
        let had_items = !self.selected_items.is_empty();
        self.selected_items.clear();
        self.anchor_item = None;

        let before = self.selected_groups.clone();

        if mods.shift {
            let range = self.anchor_group.and_then(|anchor| {
                let a = order.iter().position(|x| *x == anchor)?;
                let b = order.iter().position(|x| *x == id)?;
                Some((a.min(b), a.max(b)))
            });
            match range {
                Some((lo, hi)) => {
                    self.selected_groups = order[lo..=hi].iter().copied().collect();
                }
                None => {
                    self.selected_groups = HashSet::from([id]);
                    self.anchor_group = Some(id);
                }
            }
        } else if mods.ctrl {
            if !self.selected_groups.remove(&id) {
                self.selected_groups.insert(id);
            }
            self.anchor_group = Some(id);
        } else {
            self.selected_groups = HashSet::from([id]);
            self.anchor_group = Some(id);
        }

        if had_items || self.selected_groups != before {
            self.selection_changed.emit(());
        }
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Clear the whole selection and both anchors.
    pub fn clear(&mut self) {
        let had = self.has_selection();
        self.selected_items.clear();
        self.selected_groups.clear();
        self.anchor_item = None;
        self.anchor_group = None;
        if had {
            self.selection_changed.emit(());
        }
    }

    /// Drop selected items the model no longer contains.
    ///
    /// A removed anchor is cleared with its element, so the anchor always
    /// refers to something present.
    pub fn retain_items(&mut self, keep: impl Fn(&PresetId) -> bool) {
        let before = self.selected_items.len();
        self.selected_items.retain(|id| keep(id));
        if let Some(anchor) = &self.anchor_item
            && !keep(anchor)
        {
            self.anchor_item = None;
        }
        if self.selected_items.len() != before {
            self.selection_changed.emit(());
        }
    }

    /// Drop selected groups the model no longer contains.
    pub fn retain_groups(&mut self, keep: impl Fn(&GroupId) -> bool) {
        let before = self.selected_groups.len();
        self.selected_groups.retain(|id| keep(id));
        if let Some(anchor) = &self.anchor_group
            && !keep(anchor)
        {
            self.anchor_group = None;
        }
        if self.selected_groups.len() != before {
            self.selection_changed.emit(());
        }
    }
}
