//! The drag-reorder engine.
//!
//! Interprets a pointer-drag gesture against the selection model and the
//! group/order model, and commits the result as one atomic batch move.
//!
//! State machine:
//!
//! ```text
//! Idle → Pressed (pointer down) → Dragging (moved past threshold)
//!      → Dropped (pointer up) → Idle
//! ```
//!
//! A release while still in `Pressed` is a plain click, not a drag.
//! Interrupting the gesture (focus loss) cancels back to `Idle` without
//! touching the model.
//!
//! Geometry comes from the UI as a [`DropMap`]: the rectangles of the
//! currently visible preset buttons and group rows. The engine hit-tests
//! the pointer against those — landing on the leading half of a button
//! inserts before it, the trailing half after it; the top/bottom halves of
//! a group row do the same for group reordering. Items may cross group
//! boundaries; groups only reorder within the root ordering.

use crate::geometry::{Point, Rect};
use crate::model::rack::{GroupId, RackModel};
use crate::model::selection::{ClickModifiers, SelectionModel};
use crate::registry::PresetId;

/// Pointer travel (in px) before a press becomes a drag.
pub const DEFAULT_DRAG_THRESHOLD: f32 = 10.0;

/// The element under the pointer when the press started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressedElement {
    Item(PresetId),
    Group(GroupId),
}

/// On-screen rectangle of one visible preset button.
#[derive(Debug, Clone)]
pub struct ItemSlot {
    pub id: PresetId,
    pub group: GroupId,
    pub rect: Rect,
}

/// On-screen rectangle of one visible group row (header plus item area).
#[derive(Debug, Clone)]
pub struct GroupSlot {
    pub id: GroupId,
    pub rect: Rect,
}

/// The visible layout the UI reports for hit-testing.
#[derive(Debug, Clone, Default)]
pub struct DropMap {
    pub items: Vec<ItemSlot>,
    pub groups: Vec<GroupSlot>,
}

impl DropMap {
    /// Where an item batch would land for a pointer at `p`.
    ///
    /// A pointer over a preset button inserts before or after it depending
    /// on which half it is in; over a group's empty area it appends to that
    /// group. Indices are clamped to the group's current length.
    pub fn item_insertion_at(&self, p: Point, model: &RackModel) -> Option<(GroupId, usize)> {
        for slot in &self.items {
            if slot.rect.contains(p) {
                let items = model.items(slot.group)?;
                let pos = items
                    .iter()
                    .position(|i| *i == slot.id)
                    .unwrap_or(items.len());
                let index = if slot.rect.in_leading_half(p) {
                    pos
                } else {
                    pos + 1
                };
                return Some((slot.group, index.min(items.len())));
            }
        }
        for slot in &self.groups {
            if slot.rect.contains(p) {
                return Some((slot.id, model.items(slot.id)?.len()));
            }
        }
        None
    }

    /// Where a group batch would land in the root ordering for a pointer
    /// at `p`.
    pub fn group_insertion_at(&self, p: Point, model: &RackModel) -> Option<usize> {
        for slot in &self.groups {
            if slot.rect.contains(p) {
                let pos = model.order().iter().position(|g| *g == slot.id)?;
                let index = if slot.rect.in_top_half(p) { pos } else { pos + 1 };
                return Some(index.min(model.order().len()));
            }
        }
        None
    }
}

/// A live or committed drop destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// Insert the item batch at `index` in `group`.
    Items { group: GroupId, index: usize },
    /// Insert the group batch at `index` in the root ordering.
    Groups { index: usize },
}

/// What a pointer release amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Released below the drag threshold — a plain click, nothing moved.
    Click,
    /// The batch was committed at the target.
    Moved(DragTarget),
    /// The drop landed on the source position or outside any slot; the
    /// model was not mutated and no notification was emitted.
    NoChange,
}

/// Coarse gesture state, for the UI to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Pressed,
    Dragging,
}

enum Phase {
    Idle,
    Pressed {
        origin: Point,
        element: PressedElement,
    },
    Dragging {
        element: PressedElement,
    },
}

/// Turns press/move/release events into atomic batch reorders.
pub struct DragController {
    phase: Phase,
    threshold: f32,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    /// Creates an idle controller with the default threshold.
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_DRAG_THRESHOLD)
    }

    /// Creates an idle controller with a custom drag threshold.
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            phase: Phase::Idle,
            threshold,
        }
    }

    /// The current gesture state.
    pub fn state(&self) -> DragState {
        match self.phase {
            Phase::Idle => DragState::Idle,
            Phase::Pressed { .. } => DragState::Pressed,
            Phase::Dragging { .. } => DragState::Dragging,
        }
    }

    /// Pointer down on an element.
    ///
    /// If the pressed element is not already part of the selection, the
    /// selection collapses to just that element — the conventional
    /// click-resets-selection-unless-modifier-held behavior. Pressing a
    /// selected element leaves a multi-selection intact so it can be
    /// dragged as a batch.
    pub fn press(
        &mut self,
        element: PressedElement,
        pos: Point,
        selection: &mut SelectionModel,
        model: &RackModel,
    ) {
        match &element {
            PressedElement::Item(id) => {
                if !selection.is_item_selected(id) {
                    selection.click_item(id, ClickModifiers::NONE, &model.visible_items());
                }
            }
            PressedElement::Group(id) => {
                if !selection.is_group_selected(*id) {
                    selection.click_group(*id, ClickModifiers::NONE, model.order());
                }
            }
        }
        self.phase = Phase::Pressed {
            origin: pos,
            element,
        };
    }

    /// Pointer moved.
    ///
    /// Promotes `Pressed` to `Dragging` once the pointer travels past the
    /// threshold, then reports the live insertion target under the pointer
    /// (for the UI's drop indicator). Returns `None` while below the
    /// threshold or when the pointer is outside every slot.
    pub fn drag_move(&mut self, pos: Point, map: &DropMap, model: &RackModel) -> Option<DragTarget> {
        let promote = matches!(
            &self.phase,
            Phase::Pressed { origin, .. } if origin.distance_to(pos) > self.threshold
        );
        if promote
            && let Phase::Pressed { element, .. } = std::mem::replace(&mut self.phase, Phase::Idle)
        {
            tracing::trace!(target: "preset_rack::drag", "drag threshold exceeded");
            self.phase = Phase::Dragging { element };
        }

        match &self.phase {
            Phase::Dragging { element } => self.target_at(element, pos, map, model),
            _ => None,
        }
    }

    /// Pointer released: commit the batch move.
    ///
    /// The moved batch is the current selection in display order, committed
    /// through one atomic `move_items`/`move_groups` call. A drop equal to
    /// the source position mutates nothing and emits nothing.
    pub fn release(
        &mut self,
        pos: Point,
        map: &DropMap,
        model: &mut RackModel,
        selection: &SelectionModel,
    ) -> crate::error::Result<DropOutcome> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let element = match phase {
            Phase::Idle => return Ok(DropOutcome::NoChange),
            Phase::Pressed { .. } => return Ok(DropOutcome::Click),
            Phase::Dragging { element } => element,
        };

        let Some(target) = self.target_at(&element, pos, map, model) else {
            return Ok(DropOutcome::NoChange);
        };

        let changed = match target {
            DragTarget::Items { group, index } => {
                let batch = selection.selected_items_in(&model.visible_items());
                model.move_items(&batch, group, index)?
            }
            DragTarget::Groups { index } => {
                let batch = selection.selected_groups_in(model.order());
                model.move_groups(&batch, index)?
            }
        };

        if changed {
            tracing::debug!(target: "preset_rack::drag", ?target, "drop committed");
            Ok(DropOutcome::Moved(target))
        } else {
            Ok(DropOutcome::NoChange)
        }
    }

    /// The gesture was interrupted (focus loss, escape): back to `Idle`
    /// without mutating the model.
    pub fn cancel(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            tracing::trace!(target: "preset_rack::drag", "drag cancelled");
        }
        self.phase = Phase::Idle;
    }

    fn target_at(
        &self,
        element: &PressedElement,
        pos: Point,
        map: &DropMap,
        model: &RackModel,
    ) -> Option<DragTarget> {
        match element {
            PressedElement::Item(_) => map
                .item_insertion_at(pos, model)
                .map(|(group, index)| DragTarget::Items { group, index }),
            PressedElement::Group(_) => map
                .group_insertion_at(pos, model)
                .map(|index| DragTarget::Groups { index }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rack::RackModel;

    fn id(s: &str) -> PresetId {
        PresetId::from(s)
    }

    /// Two groups laid out as single rows: A = [a, b, c] at y 0..20,
    /// B = [d, e] at y 20..40. Buttons are 20px wide.
    fn fixture() -> (RackModel, GroupId, GroupId, DropMap) {
        let mut model = RackModel::new();
        let a = model.add_group("A");
        let b = model.add_group("B");
        for name in ["a", "b", "c"] {
            model.add_item(a, id(name)).unwrap();
        }
        for name in ["d", "e"] {
            model.add_item(b, id(name)).unwrap();
        }

        let mut map = DropMap::default();
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            map.items.push(ItemSlot {
                id: id(name),
                group: a,
                rect: Rect::new(i as f32 * 20.0, 0.0, 20.0, 20.0),
            });
        }
        for (i, name) in ["d", "e"].iter().enumerate() {
            map.items.push(ItemSlot {
                id: id(name),
                group: b,
                rect: Rect::new(i as f32 * 20.0, 20.0, 20.0, 20.0),
            });
        }
        map.groups.push(GroupSlot {
            id: a,
            rect: Rect::new(0.0, 0.0, 200.0, 20.0),
        });
        map.groups.push(GroupSlot {
            id: b,
            rect: Rect::new(0.0, 20.0, 200.0, 20.0),
        });
        (model, a, b, map)
    }

    #[test]
    fn test_press_collapses_selection_to_unselected_element() {
        let (model, _, _, _) = fixture();
        let mut selection = SelectionModel::new();
        let order = model.visible_items();
        selection.click_item(&id("a"), ClickModifiers::NONE, &order);
        selection.click_item(&id("b"), ClickModifiers::CTRL, &order);

        let mut drag = DragController::new();
        drag.press(
            PressedElement::Item(id("d")),
            Point::new(10.0, 30.0),
            &mut selection,
            &model,
        );

        assert_eq!(
            selection.selected_items_in(&model.visible_items()),
            vec![id("d")]
        );
        assert_eq!(drag.state(), DragState::Pressed);
    }

    #[test]
    fn test_press_on_selected_element_keeps_multiselection() {
        let (model, _, _, _) = fixture();
        let mut selection = SelectionModel::new();
        let order = model.visible_items();
        selection.click_item(&id("a"), ClickModifiers::NONE, &order);
        selection.click_item(&id("c"), ClickModifiers::CTRL, &order);

        let mut drag = DragController::new();
        drag.press(
            PressedElement::Item(id("a")),
            Point::new(10.0, 10.0),
            &mut selection,
            &model,
        );

        assert_eq!(selection.item_count(), 2);
    }

    #[test]
    fn test_release_below_threshold_is_click() {
        let (mut model, _, _, map) = fixture();
        let mut selection = SelectionModel::new();
        let mut drag = DragController::new();

        drag.press(
            PressedElement::Item(id("a")),
            Point::new(10.0, 10.0),
            &mut selection,
            &model,
        );
        drag.drag_move(Point::new(12.0, 10.0), &map, &model);
        let outcome = drag
            .release(Point::new(12.0, 10.0), &map, &mut model, &selection)
            .unwrap();

        assert_eq!(outcome, DropOutcome::Click);
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn test_drag_across_groups_commits_block() {
        let (mut model, a, b, map) = fixture();
        let mut selection = SelectionModel::new();
        let order = model.visible_items();
        selection.click_item(&id("a"), ClickModifiers::NONE, &order);
        selection.click_item(&id("c"), ClickModifiers::CTRL, &order);

        let mut drag = DragController::new();
        drag.press(
            PressedElement::Item(id("a")),
            Point::new(10.0, 10.0),
            &mut selection,
            &model,
        );
        // Onto the trailing half of "d": insert after it.
        let target = drag.drag_move(Point::new(15.0, 30.0), &map, &model);
        assert_eq!(target, Some(DragTarget::Items { group: b, index: 1 }));

        let outcome = drag
            .release(Point::new(15.0, 30.0), &map, &mut model, &selection)
            .unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Moved(DragTarget::Items { group: b, index: 1 })
        );
        assert_eq!(model.items(a).unwrap(), &[id("b")]);
        assert_eq!(model.items(b).unwrap(), &[id("d"), id("a"), id("c"), id("e")]);
    }

    #[test]
    fn test_drop_on_source_position_is_noop() {
        let (mut model, a, _, map) = fixture();
        let mut selection = SelectionModel::new();
        let mut drag = DragController::new();

        let events = {
            use parking_lot::Mutex;
            use std::sync::Arc;
            let events = Arc::new(Mutex::new(0usize));
            let recv = events.clone();
            model.changed.connect(move |_| {
                *recv.lock() += 1;
            });
            events
        };

        drag.press(
            PressedElement::Item(id("a")),
            Point::new(5.0, 10.0),
            &mut selection,
            &model,
        );
        drag.drag_move(Point::new(30.0, 10.0), &map, &model);
        // Back onto its own leading half: index 0, where it already sits.
        let outcome = drag
            .release(Point::new(5.0, 10.0), &map, &mut model, &selection)
            .unwrap();

        assert_eq!(outcome, DropOutcome::NoChange);
        assert_eq!(model.items(a).unwrap(), &[id("a"), id("b"), id("c")]);
        assert_eq!(*events.lock(), 0);
    }

    #[test]
    fn test_release_outside_any_slot_moves_nothing() {
        let (mut model, a, _, map) = fixture();
        let mut selection = SelectionModel::new();
        let mut drag = DragController::new();

        drag.press(
            PressedElement::Item(id("a")),
            Point::new(5.0, 10.0),
            &mut selection,
            &model,
        );
        drag.drag_move(Point::new(300.0, 300.0), &map, &model);
        let outcome = drag
            .release(Point::new(300.0, 300.0), &map, &mut model, &selection)
            .unwrap();

        assert_eq!(outcome, DropOutcome::NoChange);
        assert_eq!(model.items(a).unwrap(), &[id("a"), id("b"), id("c")]);
    }

    #[test]
    fn test_cancel_resets_without_mutation() {
        let (model, _, _, map) = fixture();
        let mut model = model;
        let mut selection = SelectionModel::new();
        let mut drag = DragController::new();

        drag.press(
            PressedElement::Item(id("a")),
            Point::new(5.0, 10.0),
            &mut selection,
            &model,
        );
        drag.drag_move(Point::new(50.0, 30.0), &map, &model);
        assert_eq!(drag.state(), DragState::Dragging);

        drag.cancel();
        assert_eq!(drag.state(), DragState::Idle);
        let outcome = drag
            .release(Point::new(50.0, 30.0), &map, &mut model, &selection)
            .unwrap();
        assert_eq!(outcome, DropOutcome::NoChange);
    }

    #[test]
    fn test_group_drag_reorders_root_ordering() {
        let (mut model, a, b, map) = fixture();
        let mut selection = SelectionModel::new();
        let mut drag = DragController::new();

        drag.press(
            PressedElement::Group(b),
            Point::new(100.0, 30.0),
            &mut selection,
            &model,
        );
        // Top half of group A's row: insert before it.
        let target = drag.drag_move(Point::new(100.0, 5.0), &map, &model);
        assert_eq!(target, Some(DragTarget::Groups { index: 0 }));

        let outcome = drag
            .release(Point::new(100.0, 5.0), &map, &mut model, &selection)
            .unwrap();
        assert_eq!(outcome, DropOutcome::Moved(DragTarget::Groups { index: 0 }));
        assert_eq!(model.order(), &[b, a]);
    }

    #[test]
    fn test_empty_group_area_appends() {
        let (mut model, a, b, mut map) = fixture();
        // Widen group B's row so there is empty space right of "e".
        map.groups[1].rect = Rect::new(0.0, 20.0, 400.0, 20.0);
        let mut selection = SelectionModel::new();
        let mut drag = DragController::new();

        drag.press(
            PressedElement::Item(id("a")),
            Point::new(5.0, 10.0),
            &mut selection,
            &model,
        );
        let target = drag.drag_move(Point::new(350.0, 30.0), &map, &model);
        assert_eq!(target, Some(DragTarget::Items { group: b, index: 2 }));

        drag.release(Point::new(350.0, 30.0), &map, &mut model, &selection)
            .unwrap();
        assert_eq!(model.items(b).unwrap(), &[id("d"), id("e"), id("a")]);
        assert_eq!(model.items(a).unwrap(), &[id("b"), id("c")]);
    }
}
