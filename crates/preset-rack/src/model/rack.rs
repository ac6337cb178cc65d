//! The group/order model.
//!
//! [`RackModel`] is the sole owner of sequencing: the root ordering of
//! groups and the ordered preset references inside each group. It exposes
//! move/insert/remove/reorder operations with invariant checks and emits a
//! [`RackEvent`] after every effective mutation.
//!
//! Invariants maintained here:
//!
//! - Every preset belongs to at most one group (no duplicate references).
//! - Group sequences and the root ordering are duplicate-free total orders.
//! - If exactly one group exists, it is always the active group.
//! - In exclusive-uncollapse mode, at most one group is uncollapsed;
//!   uncollapsing a group activates it and collapses the rest.
//!
//! Batch moves are atomic: they either fully apply or, on a rejected
//! target, leave the model bit-identical to before the call. Operations
//! referencing ids that have gone stale degrade silently — only malformed
//! targets are rejected.

use std::sync::OnceLock;

use preset_rack_core::Signal;
use regex::Regex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{RackError, Result};
use crate::events::RackEvent;
use crate::persist::{GroupSnapshot, RackSnapshot};
use crate::registry::PresetId;

new_key_type! {
    /// A unique identifier for a group.
    pub struct GroupId;
}

/// Pattern for auto-generated group names.
fn group_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^Group\s+(\d+)$").expect("group name pattern"))
}

/// A user-named, ordered container of preset references.
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    items: Vec<PresetId>,
    collapsed: bool,
    active: bool,
}

impl Group {
    /// The group's user-editable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group's preset references in display order.
    pub fn items(&self) -> &[PresetId] {
        &self.items
    }

    /// Whether the group's item area is collapsed.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Whether this is the active group.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the group references this preset.
    pub fn contains(&self, id: &PresetId) -> bool {
        self.items.contains(id)
    }
}

/// Outcome of adding a preset reference to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The reference was added.
    Added,
    /// The preset is already referenced by this group — a preset belongs to
    /// at most one group, so nothing was added. The UI decides whether to
    /// offer a move.
    AlreadyIn(GroupId),
}

/// Owner of the group ordering and the item ordering within each group.
pub struct RackModel {
    groups: SlotMap<GroupId, Group>,
    order: Vec<GroupId>,
    exclusive_uncollapse: bool,
    /// Emitted after every effective mutation.
    pub changed: Signal<RackEvent>,
}

impl Default for RackModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RackModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self {
            groups: SlotMap::with_key(),
            order: Vec::new(),
            exclusive_uncollapse: false,
            changed: Signal::new(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The root ordering of groups.
    pub fn order(&self) -> &[GroupId] {
        &self.order
    }

    /// Look up a group.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    /// A group's item sequence.
    pub fn items(&self, id: GroupId) -> Option<&[PresetId]> {
        self.groups.get(id).map(|g| g.items.as_slice())
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.order.len()
    }

    /// The active group, if any.
    pub fn active_group(&self) -> Option<GroupId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.groups[*id].active)
    }

    /// The group currently holding a preset reference, if any.
    pub fn group_of(&self, id: &PresetId) -> Option<GroupId> {
        self.order
            .iter()
            .copied()
            .find(|gid| self.groups[*gid].items.contains(id))
    }

    /// All items of uncollapsed groups, flattened in display order.
    ///
    /// This is the order range selection and drag insertion work against.
    pub fn visible_items(&self) -> Vec<PresetId> {
        self.order
            .iter()
            .filter(|gid| !self.groups[**gid].collapsed)
            .flat_map(|gid| self.groups[*gid].items.iter().cloned())
            .collect()
    }

    /// Whether exclusive-uncollapse mode is on.
    pub fn exclusive_uncollapse(&self) -> bool {
        self.exclusive_uncollapse
    }

    // =========================================================================
    // Group lifecycle
    // =========================================================================

    /// Create a new, empty group with the given name.
    ///
    /// The first group is always active. In exclusive-uncollapse mode a
    /// group created next to existing ones starts collapsed.
    pub fn add_group(&mut self, name: impl Into<String>) -> GroupId {
        let first = self.order.is_empty();
        let group = Group {
            name: name.into(),
            items: Vec::new(),
            collapsed: self.exclusive_uncollapse && !first,
            active: first,
        };
        let id = self.groups.insert(group);
        self.order.push(id);

        tracing::debug!(target: "preset_rack::model", ?id, "group added");
        self.changed.emit(RackEvent::GroupAdded { group: id });
        if first {
            self.changed
                .emit(RackEvent::ActiveGroupChanged { group: Some(id) });
        }
        id
    }

    /// Create a new group with the next free auto-generated name
    /// (`Group 1`, `Group 2`, …).
    pub fn add_group_auto(&mut self) -> GroupId {
        let name = self.next_group_name();
        self.add_group(name)
    }

    fn next_group_name(&self) -> String {
        let next = self
            .groups
            .values()
            .filter_map(|g| {
                group_name_pattern()
                    .captures(g.name.trim())
                    .and_then(|c| c[1].parse::<u32>().ok())
            })
            .max()
            .unwrap_or(0)
            + 1;
        format!("Group {next}")
    }

    /// Rename a group.
    pub fn rename_group(&mut self, id: GroupId, name: impl Into<String>) -> Result<()> {
        let group = self
            .groups
            .get_mut(id)
            .ok_or_else(|| RackError::group_not_found(id))?;
        let name = name.into();
        if group.name != name {
            group.name = name.clone();
            self.changed.emit(RackEvent::GroupRenamed { group: id, name });
        }
        Ok(())
    }

    /// Delete a group, releasing its item references.
    ///
    /// The released presets are untouched in the host; they simply stop
    /// being organized. Returns the released ids.
    pub fn delete_group(&mut self, id: GroupId) -> Result<Vec<PresetId>> {
        let group = self
            .groups
            .remove(id)
            .ok_or_else(|| RackError::group_not_found(id))?;
        self.order.retain(|gid| *gid != id);

        tracing::debug!(
            target: "preset_rack::model",
            ?id,
            released = group.items.len(),
            "group deleted"
        );
        self.changed.emit(RackEvent::GroupDeleted {
            group: id,
            released: group.items.clone(),
        });

        if group.active {
            self.changed
                .emit(RackEvent::ActiveGroupChanged { group: None });
        }
        self.enforce_single_group_active();

        Ok(group.items)
    }

    /// A sole remaining group can never be inactive.
    fn enforce_single_group_active(&mut self) {
        if self.order.len() == 1 {
            let only = self.order[0];
            if !self.groups[only].active {
                self.groups[only].active = true;
                self.changed
                    .emit(RackEvent::ActiveGroupChanged { group: Some(only) });
            }
        }
    }

    // =========================================================================
    // Active / collapse state
    // =========================================================================

    /// Make a group the active one.
    ///
    /// An unknown id is a no-op (stale reference), but the single-group
    /// invariant is re-asserted either way. In exclusive-uncollapse mode
    /// the activated group is uncollapsed and all others collapse.
    pub fn set_active_group(&mut self, id: GroupId) {
        if !self.groups.contains_key(id) {
            self.enforce_single_group_active();
            return;
        }

        if self.exclusive_uncollapse {
            self.collapse_others(id);
        }

        let already_active = self.groups[id].active;
        for gid in self.order.clone() {
            self.groups[gid].active = gid == id;
        }
        if !already_active {
            self.changed
                .emit(RackEvent::ActiveGroupChanged { group: Some(id) });
        }
    }

    fn collapse_others(&mut self, keep: GroupId) {
        for gid in self.order.clone() {
            if gid != keep && !self.groups[gid].collapsed {
                self.groups[gid].collapsed = true;
                self.changed.emit(RackEvent::GroupCollapsed {
                    group: gid,
                    collapsed: true,
                });
            }
        }
        if self.groups[keep].collapsed {
            self.groups[keep].collapsed = false;
            self.changed.emit(RackEvent::GroupCollapsed {
                group: keep,
                collapsed: false,
            });
        }
    }

    /// Collapse or uncollapse a group. Unknown ids are ignored.
    ///
    /// In exclusive-uncollapse mode, uncollapsing a group collapses all
    /// others and makes it active; collapsing the last open group (with
    /// more than one group present) leaves no group active.
    pub fn set_collapsed(&mut self, id: GroupId, collapsed: bool) {
        let Some(group) = self.groups.get(id) else {
            return;
        };
        if group.collapsed == collapsed {
            return;
        }

        if collapsed {
            self.groups[id].collapsed = true;
            self.changed.emit(RackEvent::GroupCollapsed {
                group: id,
                collapsed: true,
            });

            if self.exclusive_uncollapse
                && self.order.len() > 1
                && self.order.iter().all(|gid| self.groups[*gid].collapsed)
                && let Some(active) = self.active_group()
            {
                self.groups[active].active = false;
                self.changed
                    .emit(RackEvent::ActiveGroupChanged { group: None });
            }
        } else if self.exclusive_uncollapse {
            self.collapse_others(id);
            let was_active = self.groups[id].active;
            for gid in self.order.clone() {
                self.groups[gid].active = gid == id;
            }
            if !was_active {
                self.changed
                    .emit(RackEvent::ActiveGroupChanged { group: Some(id) });
            }
        } else {
            self.groups[id].collapsed = false;
            self.changed.emit(RackEvent::GroupCollapsed {
                group: id,
                collapsed: false,
            });
        }
    }

    /// Switch exclusive-uncollapse mode.
    ///
    /// Turning it on immediately enforces the invariant: the active group
    /// (or the first uncollapsed one, which then becomes active) stays
    /// open and everything else collapses.
    pub fn set_exclusive_uncollapse(&mut self, on: bool) {
        self.exclusive_uncollapse = on;
        if !on {
            return;
        }

        let keeper = self.active_group().or_else(|| {
            self.order
                .iter()
                .copied()
                .find(|gid| !self.groups[*gid].collapsed)
        });
        if let Some(keep) = keeper {
            self.collapse_others(keep);
            self.set_active_group(keep);
        }
    }

    // =========================================================================
    // Item membership
    // =========================================================================

    /// Add a preset reference to a group.
    ///
    /// A preset already referenced anywhere in the model is not added
    /// again; the holding group is reported so the caller can offer a move.
    pub fn add_item(&mut self, group: GroupId, id: PresetId) -> Result<AddOutcome> {
        if !self.groups.contains_key(group) {
            return Err(RackError::group_not_found(group));
        }
        if let Some(holder) = self.group_of(&id) {
            return Ok(AddOutcome::AlreadyIn(holder));
        }

        self.groups[group].items.push(id.clone());
        self.changed.emit(RackEvent::ItemsAdded {
            group,
            ids: vec![id],
        });
        Ok(AddOutcome::Added)
    }

    /// Remove preset references from whatever groups hold them.
    ///
    /// Missing ids are ignored; never fails. Returns the removed count.
    pub fn remove_items(&mut self, ids: &[PresetId]) -> usize {
        // Each id lives in at most one group, so every hit is one removal.
        let mut removed = Vec::new();
        for gid in self.order.clone() {
            let items = &mut self.groups[gid].items;
            for id in ids {
                if let Some(pos) = items.iter().position(|it| it == id) {
                    items.remove(pos);
                    removed.push(id.clone());
                }
            }
        }

        if !removed.is_empty() {
            tracing::debug!(
                target: "preset_rack::model",
                count = removed.len(),
                "items removed"
            );
            self.changed.emit(RackEvent::ItemsRemoved {
                ids: removed.clone(),
            });
        }
        removed.len()
    }

    // =========================================================================
    // Batch moves
    // =========================================================================

    /// Move a batch of presets to `target` at `index`, as one contiguous
    /// block preserving the given order.
    ///
    /// `index` addresses the target group's sequence as it is now (before
    /// any removal). Fails with `InvalidTarget` when the group does not
    /// exist or the index is out of bounds — in that case the model is
    /// untouched. Ids not present in the model are dropped from the batch.
    /// A move that changes nothing emits no notification; the returned
    /// flag says whether anything actually moved.
    pub fn move_items(&mut self, ids: &[PresetId], target: GroupId, index: usize) -> Result<bool> {
        let Some(target_group) = self.groups.get(target) else {
            return Err(RackError::invalid_target(format!(
                "group {target:?} does not exist"
            )));
        };
        if index > target_group.items.len() {
            return Err(RackError::invalid_target(format!(
                "index {index} out of bounds for group of {}",
                target_group.items.len()
            )));
        }

        let mut moving: Vec<PresetId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !moving.contains(id) && self.group_of(id).is_some() {
                moving.push(id.clone());
            }
        }
        if moving.is_empty() {
            return Ok(false);
        }

        // The requested index shifts left by however many moved items
        // currently sit before it in the target.
        let offset = self.groups[target]
            .items
            .iter()
            .take(index)
            .filter(|it| moving.contains(*it))
            .count();
        let insert_at = index - offset;

        let mut changed = false;
        for gid in self.order.clone() {
            let old = &self.groups[gid].items;
            let mut new: Vec<PresetId> = old
                .iter()
                .filter(|it| !moving.contains(*it))
                .cloned()
                .collect();
            if gid == target {
                new.splice(insert_at..insert_at, moving.iter().cloned());
            }
            if new != *old {
                self.groups[gid].items = new;
                changed = true;
            }
        }

        if changed {
            tracing::debug!(
                target: "preset_rack::model",
                ?target,
                index = insert_at,
                count = moving.len(),
                "items moved"
            );
            self.changed.emit(RackEvent::ItemsMoved {
                group: target,
                index: insert_at,
                ids: moving,
            });
        }
        Ok(changed)
    }

    /// Move a batch of groups within the root ordering, as one contiguous
    /// block preserving the given order.
    ///
    /// Same contract as [`move_items`](Self::move_items): atomic, index
    /// validated against the current ordering, unknown ids dropped, no-op
    /// moves silent.
    pub fn move_groups(&mut self, ids: &[GroupId], index: usize) -> Result<bool> {
        if index > self.order.len() {
            return Err(RackError::invalid_target(format!(
                "index {index} out of bounds for {} groups",
                self.order.len()
            )));
        }

        let mut moving: Vec<GroupId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !moving.contains(id) && self.order.contains(id) {
                moving.push(*id);
            }
        }
        if moving.is_empty() {
            return Ok(false);
        }

        let offset = self
            .order
            .iter()
            .take(index)
            .filter(|gid| moving.contains(*gid))
            .count();
        let insert_at = index - offset;

        let mut new_order: Vec<GroupId> = self
            .order
            .iter()
            .filter(|gid| !moving.contains(*gid))
            .copied()
            .collect();
        new_order.splice(insert_at..insert_at, moving.iter().copied());

        if new_order == self.order {
            return Ok(false);
        }
        self.order = new_order;
        tracing::debug!(
            target: "preset_rack::model",
            index = insert_at,
            count = moving.len(),
            "groups moved"
        );
        self.changed.emit(RackEvent::GroupsMoved {
            index: insert_at,
            groups: moving,
        });
        Ok(true)
    }

    // =========================================================================
    // Snapshot / restore
    // =========================================================================

    /// Capture the full structure: names, order, membership, flags.
    pub fn snapshot(&self) -> RackSnapshot {
        RackSnapshot {
            exclusive_uncollapse: self.exclusive_uncollapse,
            groups: self
                .order
                .iter()
                .map(|gid| {
                    let g = &self.groups[*gid];
                    GroupSnapshot {
                        name: g.name.clone(),
                        items: g.items.clone(),
                        collapsed: g.collapsed,
                        active: g.active,
                    }
                })
                .collect(),
        }
    }

    /// Replace the model's structure from a snapshot.
    ///
    /// `keep` filters item references against the current host collection;
    /// ids it rejects are dropped, the way the original data loader drops
    /// preset names the host no longer resolves. Invariants are re-imposed
    /// on what remains: duplicate references keep only their first
    /// occurrence, at most one group stays active, and a sole group is
    /// forced active. Emits a single `ModelRestored`.
    pub fn restore(&mut self, snapshot: &RackSnapshot, keep: impl Fn(&PresetId) -> bool) {
        self.groups.clear();
        self.order.clear();
        self.exclusive_uncollapse = snapshot.exclusive_uncollapse;

        let mut seen_items: Vec<PresetId> = Vec::new();
        let mut seen_active = false;
        for gs in &snapshot.groups {
            let mut items = Vec::with_capacity(gs.items.len());
            for id in &gs.items {
                if keep(id) && !seen_items.contains(id) {
                    seen_items.push(id.clone());
                    items.push(id.clone());
                }
            }
            let active = gs.active && !seen_active;
            seen_active |= active;
            let id = self.groups.insert(Group {
                name: gs.name.clone(),
                items,
                collapsed: gs.collapsed,
                active,
            });
            self.order.push(id);
        }

        if self.order.len() == 1 {
            let only = self.order[0];
            self.groups[only].active = true;
        }
        if self.exclusive_uncollapse
            && let Some(active) = self.active_group()
        {
            for gid in self.order.clone() {
                if gid != active {
                    self.groups[gid].collapsed = true;
                }
            }
        }

        tracing::debug!(
            target: "preset_rack::model",
            groups = self.order.len(),
            "model restored from snapshot"
        );
        self.changed.emit(RackEvent::ModelRestored);
    }
}
