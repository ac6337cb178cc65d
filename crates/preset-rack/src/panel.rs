//! The owning panel context.
//!
//! [`PresetPanel`] is the single owner of the registry, the group/order
//! model, the selection model, the drag engine, the change detector and
//! their timers. Its lifecycle is tied to the docker panel that hosts it —
//! there are no process-wide singletons. Everything the UI needs flows
//! through one unified [`events`](PresetPanel::events) stream, and
//! everything the core needs from the host goes through the [`PresetHost`]
//! trait object handed in at construction.
//!
//! The panel is driven cooperatively: the UI calls [`pump`](PresetPanel::pump)
//! from its event loop (using [`time_until_next_tick`](PresetPanel::time_until_next_tick)
//! to sleep), and the panel dispatches expired timers to the detector tick
//! and the current-preset poll. Hiding the panel tears both timers down;
//! showing it starts them again with the detector rotating from a fresh
//! cursor.

use std::sync::Arc;
use std::time::Duration;

use preset_rack_core::{Signal, TimerId, TimerManager};

use crate::detector::{DetectorConfig, ThumbnailDetector};
use crate::drag::{DragController, DropMap, DropOutcome, DragTarget, PressedElement};
use crate::error::{RackError, Result};
use crate::events::RackEvent;
use crate::geometry::Point;
use crate::host::PresetHost;
use crate::model::cycle;
use crate::model::rack::{AddOutcome, GroupId, RackModel};
use crate::model::selection::{ClickModifiers, SelectionKind, SelectionModel};
use crate::persist::RackSnapshot;
use crate::registry::{PresetId, PresetRegistry, SyncReport};

/// Panel-level tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelConfig {
    /// Change-detector knobs.
    pub detector: DetectorConfig,
    /// How often the host's active preset is polled.
    pub poll_interval: Duration,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Owner and coordinator of the whole panel core.
pub struct PresetPanel {
    host: Arc<dyn PresetHost>,
    registry: PresetRegistry,
    rack: RackModel,
    selection: SelectionModel,
    drag: DragController,
    detector: ThumbnailDetector,
    timers: TimerManager,
    detector_timer: Option<TimerId>,
    poll_timer: Option<TimerId>,
    poll_interval: Duration,
    active_preset: Option<PresetId>,
    events: Arc<Signal<RackEvent>>,
}

impl PresetPanel {
    /// Creates a hidden panel with default tunables.
    pub fn new(host: Arc<dyn PresetHost>) -> Self {
        Self::with_config(host, PanelConfig::default())
    }

    /// Creates a hidden panel.
    ///
    /// Wires every sub-model notification onto the unified event stream;
    /// call [`set_visible`](Self::set_visible) to start the background
    /// timers and [`refresh_from_host`](Self::refresh_from_host) to
    /// populate the registry.
    pub fn with_config(host: Arc<dyn PresetHost>, config: PanelConfig) -> Self {
        let events = Arc::new(Signal::new());

        let rack = RackModel::new();
        let forward = Arc::clone(&events);
        rack.changed.connect(move |event: &RackEvent| {
            forward.emit(event.clone());
        });

        let selection = SelectionModel::new();
        let forward = Arc::clone(&events);
        selection.selection_changed.connect(move |_| {
            forward.emit(RackEvent::SelectionChanged);
        });

        let registry = PresetRegistry::new();
        let forward = Arc::clone(&events);
        registry.name_changed.connect(move |(id, name): &(PresetId, String)| {
            forward.emit(RackEvent::ItemRenamed {
                id: id.clone(),
                name: name.clone(),
            });
        });

        let detector = ThumbnailDetector::new(config.detector);
        let forward = Arc::clone(&events);
        detector.item_dirty.connect(move |id: &PresetId| {
            forward.emit(RackEvent::ItemDirty { id: id.clone() });
        });

        Self {
            host,
            registry,
            rack,
            selection,
            drag: DragController::new(),
            detector,
            timers: TimerManager::new(),
            detector_timer: None,
            poll_timer: None,
            poll_interval: config.poll_interval,
            active_preset: None,
            events,
        }
    }

    // =========================================================================
    // Query surface
    // =========================================================================

    /// The unified change-notification stream.
    pub fn events(&self) -> &Signal<RackEvent> {
        &self.events
    }

    /// The current order: groups in root order with their item sequences.
    pub fn current_order(&self) -> Vec<(GroupId, Vec<PresetId>)> {
        self.rack
            .order()
            .iter()
            .map(|gid| (*gid, self.rack.items(*gid).unwrap_or_default().to_vec()))
            .collect()
    }

    /// The current item selection in display order.
    pub fn current_selection(&self) -> Vec<PresetId> {
        self.selection.selected_items_in(&self.rack.visible_items())
    }

    /// The active group, if any.
    pub fn active_group(&self) -> Option<GroupId> {
        self.rack.active_group()
    }

    /// The host preset this panel believes is active.
    pub fn active_preset(&self) -> Option<&PresetId> {
        self.active_preset.as_ref()
    }

    /// The group/order model.
    pub fn rack(&self) -> &RackModel {
        &self.rack
    }

    /// Mutable access to the group/order model for direct structural edits.
    pub fn rack_mut(&mut self) -> &mut RackModel {
        &mut self.rack
    }

    /// The item registry.
    pub fn registry(&self) -> &PresetRegistry {
        &self.registry
    }

    /// The selection model.
    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    /// The change detector.
    pub fn detector(&self) -> &ThumbnailDetector {
        &self.detector
    }

    // =========================================================================
    // Host synchronisation
    // =========================================================================

    /// Reconcile registry and model against the host's current listing.
    ///
    /// Presets the host dropped disappear from groups and from the
    /// selection; the model keeps its last-known-good state if the host is
    /// unreachable.
    pub fn refresh_from_host(&mut self) -> Result<SyncReport> {
        let listing = self.host.presets().map_err(RackError::from)?;
        let report = self.registry.sync(&listing);

        if !report.removed.is_empty() {
            self.rack.remove_items(&report.removed);
            let registry = &self.registry;
            self.selection.retain_items(|id| registry.contains(id));
            if let Some(active) = &self.active_preset
                && !registry.contains(active)
            {
                self.active_preset = None;
                self.events.emit(RackEvent::ActivePresetChanged { id: None });
            }
        }
        Ok(report)
    }

    /// Apply a rename pushed by the host's rename notification.
    pub fn preset_renamed(&mut self, id: &PresetId, new_name: impl Into<String>) {
        self.registry.rename(id, new_name);
    }

    /// The UI refreshed a thumbnail; clear its dirty flag.
    pub fn mark_thumbnail_refreshed(&mut self, id: &PresetId) {
        self.registry.clear_dirty(id);
    }

    // =========================================================================
    // Visibility and timers
    // =========================================================================

    /// Show or hide the panel.
    ///
    /// Hiding tears the detector and poll timers down — no further ticks
    /// run. Showing starts them again; the detector rotation restarts from
    /// a fresh cursor.
    pub fn set_visible(&mut self, visible: bool) {
        self.detector.set_visible(visible);

        if visible {
            if self.detector_timer.is_none() {
                self.detector_timer =
                    Some(self.timers.start_repeating(self.detector.current_interval()));
            }
            if self.poll_timer.is_none() {
                self.poll_timer = Some(self.timers.start_repeating(self.poll_interval));
            }
        } else {
            if let Some(id) = self.detector_timer.take() {
                let _ = self.timers.stop(id);
            }
            if let Some(id) = self.poll_timer.take() {
                let _ = self.timers.stop(id);
            }
        }
    }

    /// Whether the panel is visible.
    pub fn is_visible(&self) -> bool {
        self.detector.is_visible()
    }

    /// Switch the detector between its active and idle tick periods.
    pub fn set_host_idle(&mut self, idle: bool) {
        self.detector.set_host_idle(idle);
        if let Some(id) = self.detector_timer {
            let _ = self.timers.restart(id, self.detector.current_interval());
        }
    }

    /// How long the event loop may sleep before the next timer is due.
    pub fn time_until_next_tick(&mut self) -> Option<Duration> {
        self.timers.time_until_next()
    }

    /// Dispatch expired timers.
    ///
    /// Each call performs bounded work: at most one detector batch and one
    /// current-preset poll. Host failures during the poll degrade to a
    /// trace message — the detector surfaces systemic failures itself, once
    /// per session.
    pub fn pump(&mut self) {
        for fired in self.timers.process_expired() {
            if Some(fired) == self.detector_timer {
                let host = Arc::clone(&self.host);
                self.detector.tick(host.as_ref(), &mut self.registry);
            } else if Some(fired) == self.poll_timer
                && let Err(err) = self.poll_current_preset()
            {
                tracing::trace!(target: "preset_rack::panel", error = %err, "current-preset poll failed");
            }
        }
    }

    /// Check the host's active preset and track changes.
    pub fn poll_current_preset(&mut self) -> Result<()> {
        let current = self.host.current_preset().map_err(RackError::from)?;
        if current != self.active_preset {
            self.active_preset = current.clone();
            self.events
                .emit(RackEvent::ActivePresetChanged { id: current });
        }
        Ok(())
    }

    // =========================================================================
    // Group and item operations
    // =========================================================================

    /// Create a named group.
    pub fn add_group(&mut self, name: impl Into<String>) -> GroupId {
        self.rack.add_group(name)
    }

    /// Create a group with the next auto-generated name.
    pub fn add_group_auto(&mut self) -> GroupId {
        self.rack.add_group_auto()
    }

    /// Rename a group.
    pub fn rename_group(&mut self, id: GroupId, name: impl Into<String>) -> Result<()> {
        self.rack.rename_group(id, name)
    }

    /// Delete a group and drop any selection referring to it or its items.
    pub fn delete_group(&mut self, id: GroupId) -> Result<Vec<PresetId>> {
        let released = self.rack.delete_group(id)?;
        self.selection.retain_groups(|gid| *gid != id);
        let rack = &self.rack;
        self.selection.retain_items(|pid| rack.group_of(pid).is_some());
        Ok(released)
    }

    /// Make a group active.
    pub fn set_active_group(&mut self, id: GroupId) {
        self.rack.set_active_group(id);
    }

    /// Collapse or uncollapse a group.
    pub fn set_collapsed(&mut self, id: GroupId, collapsed: bool) {
        self.rack.set_collapsed(id, collapsed);
    }

    /// Switch exclusive-uncollapse mode.
    pub fn set_exclusive_uncollapse(&mut self, on: bool) {
        self.rack.set_exclusive_uncollapse(on);
    }

    /// Add the host's currently active preset to the active group.
    ///
    /// Creates an auto-named group when none exists. Returns `None` when
    /// the host has no active preset or it is not in the registry yet;
    /// otherwise reports whether it was added or which group already holds
    /// it.
    pub fn add_current_preset(&mut self) -> Result<Option<AddOutcome>> {
        let Some(id) = self.host.current_preset().map_err(RackError::from)? else {
            return Ok(None);
        };
        if !self.registry.contains(&id) {
            return Ok(None);
        }

        let group = match self.rack.active_group() {
            Some(group) => group,
            None => {
                let group = self.rack.add_group_auto();
                self.rack.set_active_group(group);
                group
            }
        };
        self.rack.add_item(group, id).map(Some)
    }

    /// Remove everything currently selected: item references from their
    /// groups, or selected groups wholesale.
    pub fn remove_selected(&mut self) -> Result<usize> {
        match self.selection.kind() {
            Some(SelectionKind::Items) => {
                let ids = self.selection.selected_items_in(&self.rack.visible_items());
                let removed = self.rack.remove_items(&ids);
                self.selection.clear();
                Ok(removed)
            }
            Some(SelectionKind::Groups) => {
                let groups = self.selection.selected_groups_in(self.rack.order());
                self.selection.clear();
                let mut removed = 0;
                for gid in groups {
                    removed += self.rack.delete_group(gid)?.len();
                }
                Ok(removed)
            }
            None => Ok(0),
        }
    }

    // =========================================================================
    // Selection and drag gestures
    // =========================================================================

    /// A click on a preset button.
    pub fn click_item(&mut self, id: &PresetId, mods: ClickModifiers) {
        self.selection
            .click_item(id, mods, &self.rack.visible_items());
    }

    /// A click on a group header.
    pub fn click_group(&mut self, id: GroupId, mods: ClickModifiers) {
        self.selection.click_group(id, mods, self.rack.order());
    }

    /// A click on empty panel background clears the selection.
    pub fn click_background(&mut self) {
        self.selection.clear();
    }

    /// Pointer down on an element.
    pub fn press(&mut self, element: PressedElement, pos: Point) {
        self.drag.press(element, pos, &mut self.selection, &self.rack);
    }

    /// Pointer moved; returns the live drop target for the UI indicator.
    pub fn drag_move(&mut self, pos: Point, map: &DropMap) -> Option<DragTarget> {
        self.drag.drag_move(pos, map, &self.rack)
    }

    /// Pointer released; commits the batch move if a drag was in flight.
    pub fn release(&mut self, pos: Point, map: &DropMap) -> Result<DropOutcome> {
        self.drag
            .release(pos, map, &mut self.rack, &self.selection)
    }

    /// The drag gesture was interrupted.
    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    // =========================================================================
    // Cycling
    // =========================================================================

    /// Activate the next preset in the active group, wrapping.
    pub fn cycle_next(&mut self) -> Result<Option<PresetId>> {
        let target = cycle::next(&self.rack, self.active_preset.as_ref());
        self.activate(target)
    }

    /// Activate the previous preset in the active group, wrapping.
    pub fn cycle_previous(&mut self) -> Result<Option<PresetId>> {
        let target = cycle::previous(&self.rack, self.active_preset.as_ref());
        self.activate(target)
    }

    fn activate(&mut self, target: Option<PresetId>) -> Result<Option<PresetId>> {
        let Some(id) = target else {
            return Ok(None);
        };
        self.host.activate_preset(&id).map_err(RackError::from)?;
        if self.active_preset.as_ref() != Some(&id) {
            self.active_preset = Some(id.clone());
            self.events.emit(RackEvent::ActivePresetChanged {
                id: Some(id.clone()),
            });
        }
        Ok(Some(id))
    }

    // =========================================================================
    // Brush size passthrough
    // =========================================================================

    /// The host's current brush size.
    pub fn brush_size(&self) -> Result<f32> {
        self.host.brush_size().map_err(RackError::from)
    }

    /// Set the host's brush size, clamped to its configured maximum.
    pub fn set_brush_size(&mut self, size: f32) -> Result<()> {
        let clamped = size.clamp(0.0, self.host.max_brush_size());
        self.host.set_brush_size(clamped).map_err(RackError::from)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Capture the model's full structure.
    pub fn snapshot(&self) -> RackSnapshot {
        self.rack.snapshot()
    }

    /// Replace the model's structure from a snapshot.
    ///
    /// Item references the registry does not currently resolve are
    /// dropped, the selection is cleared, and a single `ModelRestored`
    /// notification is emitted.
    pub fn restore(&mut self, snapshot: &RackSnapshot) {
        let registry = &self.registry;
        self.rack.restore(snapshot, |id| registry.contains(id));
        self.selection.clear();
    }
}
