//! The thumbnail change detector.
//!
//! Detects that a host-rendered thumbnail has visually changed (brush
//! edited, variant swapped) without re-hashing full image data every tick
//! and without scanning the whole collection every tick — both are too
//! expensive to run while the host is drawing, panning or zooming.
//!
//! Each tick samples a bounded rotating batch: a cursor advances through
//! the registry so every preset is eventually visited, and at most
//! [`DetectorConfig::batch_size`] thumbnails are sampled per tick. Work per
//! tick is O(batch size), never O(collection size). Batch size and tick
//! period trade CPU for freshness; staleness is bounded, not zero.
//!
//! The detector never fetches or stores display bitmaps — on a signature
//! mismatch it marks the preset dirty and emits [`ThumbnailDetector::item_dirty`]
//! so the UI re-fetches the real thumbnail itself. When the owning panel is
//! hidden the detector is suspended entirely: a tick does zero work, and
//! the panel tears the driving timer down. Resuming restarts the rotation
//! from a fresh cursor.

use std::time::Duration;

use preset_rack_core::Signal;

use crate::host::PresetHost;
use crate::registry::{PresetId, PresetRegistry};
use crate::signature::{DEFAULT_SAMPLE_GRID, Signature};

/// Tunable knobs for the detector.
///
/// There is no single canonical value for the grid or batch size — they
/// are a CPU/freshness trade-off, so they are configuration rather than
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Edge length of the signature sample grid.
    pub sample_grid: u32,
    /// Maximum presets sampled per tick.
    pub batch_size: usize,
    /// Tick period while the host is in active use.
    pub interval: Duration,
    /// Coarser tick period while the host is idle.
    pub idle_interval: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_grid: DEFAULT_SAMPLE_GRID,
            batch_size: 16,
            interval: Duration::from_millis(500),
            idle_interval: Duration::from_secs(3),
        }
    }
}

/// What one tick did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Presets examined this tick (at most the batch size).
    pub sampled: usize,
    /// Presets whose signature changed.
    pub changed: Vec<PresetId>,
    /// Presets that vanished from the host and left the rotation.
    pub dropped: Vec<PresetId>,
}

/// Samples a rotating batch of thumbnails and flags the ones that changed.
pub struct ThumbnailDetector {
    config: DetectorConfig,
    rotation: Vec<PresetId>,
    cursor: usize,
    visible: bool,
    host_idle: bool,
    host_error_reported: bool,
    /// Emitted when a preset's thumbnail changed; the UI should re-fetch it.
    pub item_dirty: Signal<PresetId>,
    /// Emitted at most once per session when the host collection cannot be
    /// reached at all. Individual missing presets are not errors.
    pub host_error: Signal<String>,
}

impl Default for ThumbnailDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl ThumbnailDetector {
    /// Creates a suspended detector; show the panel to start it.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            rotation: Vec::new(),
            cursor: 0,
            visible: false,
            host_idle: false,
            host_error_reported: false,
            item_dirty: Signal::new(),
            host_error: Signal::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Replace the configuration; the rotation restarts fresh.
    pub fn set_config(&mut self, config: DetectorConfig) {
        self.config = config;
        self.reset_rotation();
    }

    /// Whether the owning panel is visible.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Suspend (hidden) or resume (shown) the detector.
    ///
    /// Hidden means zero work per tick. Resuming restarts the rotation
    /// from a fresh cursor — there is no need to resume the prior position.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            tracing::debug!(target: "preset_rack::detector", visible, "detector visibility changed");
        }
        self.visible = visible;
        if visible {
            self.reset_rotation();
        }
    }

    /// Whether the host is currently idle (coarser ticking).
    pub fn is_host_idle(&self) -> bool {
        self.host_idle
    }

    /// Switch between the active and idle tick periods.
    pub fn set_host_idle(&mut self, idle: bool) {
        self.host_idle = idle;
    }

    /// The tick period the driving timer should currently use.
    pub fn current_interval(&self) -> Duration {
        if self.host_idle {
            self.config.idle_interval
        } else {
            self.config.interval
        }
    }

    fn reset_rotation(&mut self) {
        self.rotation.clear();
        self.cursor = 0;
    }

    /// Run one bounded sampling pass.
    ///
    /// Samples at most `batch_size` presets, compares each signature to the
    /// stored one, and on mismatch stores the new signature, marks the
    /// registry entry dirty and emits `item_dirty`. A preset the host no
    /// longer knows is skipped silently and dropped from the rotation. A
    /// first observation only seeds the signature — nothing is dirty until
    /// a stored signature disagrees with a fresh sample.
    pub fn tick(&mut self, host: &dyn PresetHost, registry: &mut PresetRegistry) -> TickReport {
        let mut report = TickReport::default();
        if !self.visible {
            return report;
        }

        if self.cursor >= self.rotation.len() {
            self.rotation = registry.ids();
            self.cursor = 0;
        }
        if self.rotation.is_empty() {
            return report;
        }

        let end = (self.cursor + self.config.batch_size).min(self.rotation.len());
        let batch: Vec<PresetId> = self.rotation[self.cursor..end].to_vec();
        self.cursor = end;

        for id in batch {
            if !registry.contains(&id) {
                self.drop_from_rotation(&id);
                report.dropped.push(id);
                continue;
            }
            report.sampled += 1;

            let image = match host.thumbnail(&id) {
                Ok(Some(image)) => image,
                Ok(None) => {
                    // Vanished from the host between ticks; not an error.
                    self.drop_from_rotation(&id);
                    report.dropped.push(id);
                    continue;
                }
                Err(err) => {
                    if !self.host_error_reported {
                        self.host_error_reported = true;
                        tracing::warn!(
                            target: "preset_rack::detector",
                            error = %err,
                            "host collection unreachable"
                        );
                        self.host_error.emit(err.to_string());
                    }
                    return report;
                }
            };

            let Some(fresh) = Signature::sample(&image, self.config.sample_grid) else {
                registry.touch(&id);
                continue;
            };

            match registry.get(&id).and_then(|e| e.signature()) {
                Some(stored) if *stored == fresh => {
                    registry.touch(&id);
                }
                Some(_) => {
                    tracing::debug!(target: "preset_rack::detector", %id, "thumbnail changed");
                    registry.store_signature(&id, fresh);
                    registry.mark_dirty(&id);
                    report.changed.push(id.clone());
                    self.item_dirty.emit(id);
                }
                None => {
                    registry.store_signature(&id, fresh);
                }
            }
        }

        report
    }

    fn drop_from_rotation(&mut self, id: &PresetId) {
        if let Some(pos) = self.rotation.iter().position(|x| x == id) {
            self.rotation.remove(pos);
            if pos < self.cursor {
                self.cursor -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostError, PresetInfo, PresetRole};
    use image::{Rgba, RgbaImage};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn id(s: &str) -> PresetId {
        PresetId::from(s)
    }

    fn thumb(color: u8) -> RgbaImage {
        RgbaImage::from_pixel(32, 32, Rgba([color, color, color, 255]))
    }

    /// In-memory host whose thumbnails can be swapped under the detector.
    #[derive(Default)]
    struct FakeHost {
        thumbnails: Mutex<HashMap<PresetId, RgbaImage>>,
        unreachable: Mutex<bool>,
    }

    impl FakeHost {
        fn with_presets(names: &[&str]) -> Self {
            let host = Self::default();
            for name in names {
                host.thumbnails.lock().insert(id(name), thumb(0));
            }
            host
        }

        fn set_thumbnail(&self, preset: &str, image: RgbaImage) {
            self.thumbnails.lock().insert(id(preset), image);
        }

        fn remove(&self, preset: &str) {
            self.thumbnails.lock().remove(&id(preset));
        }
    }

    impl PresetHost for FakeHost {
        fn presets(&self) -> Result<Vec<PresetInfo>, HostError> {
            let mut infos: Vec<PresetInfo> = self
                .thumbnails
                .lock()
                .keys()
                .map(|pid| PresetInfo::new(pid.clone(), pid.as_str(), PresetRole::Brush))
                .collect();
            infos.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(infos)
        }

        fn thumbnail(&self, preset: &PresetId) -> Result<Option<RgbaImage>, HostError> {
            if *self.unreachable.lock() {
                return Err(HostError::CollectionUnreachable("gone".into()));
            }
            Ok(self.thumbnails.lock().get(preset).cloned())
        }

        fn current_preset(&self) -> Result<Option<PresetId>, HostError> {
            Ok(None)
        }

        fn activate_preset(&self, _id: &PresetId) -> Result<(), HostError> {
            Ok(())
        }

        fn brush_size(&self) -> Result<f32, HostError> {
            Ok(40.0)
        }

        fn set_brush_size(&self, _size: f32) -> Result<(), HostError> {
            Ok(())
        }
    }

    fn detector(batch: usize) -> ThumbnailDetector {
        let mut detector = ThumbnailDetector::new(DetectorConfig {
            batch_size: batch,
            ..DetectorConfig::default()
        });
        detector.set_visible(true);
        detector
    }

    fn synced_registry(host: &FakeHost) -> PresetRegistry {
        let mut registry = PresetRegistry::new();
        registry.sync(&host.presets().unwrap());
        registry
    }

    #[test]
    fn test_tick_is_bounded_by_batch_size() {
        let names: Vec<String> = (0..10).map(|i| format!("p{i}")).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let host = FakeHost::with_presets(&refs);
        let mut registry = synced_registry(&host);
        let mut detector = detector(3);

        let mut total = 0;
        for _ in 0..4 {
            let report = detector.tick(&host, &mut registry);
            assert!(report.sampled <= 3);
            total += report.sampled;
        }
        // 4 ticks x batch 3 covers the 10 presets and wraps.
        assert!(total >= 10);
    }

    #[test]
    fn test_rotation_visits_every_preset() {
        let host = FakeHost::with_presets(&["a", "b", "c", "d", "e"]);
        let mut registry = synced_registry(&host);
        let mut detector = detector(2);

        for _ in 0..3 {
            detector.tick(&host, &mut registry);
        }
        for name in ["a", "b", "c", "d", "e"] {
            assert!(
                registry.get(&id(name)).unwrap().signature().is_some(),
                "{name} was never sampled"
            );
        }
    }

    #[test]
    fn test_change_marks_dirty_and_emits() {
        let host = FakeHost::with_presets(&["a"]);
        let mut registry = synced_registry(&host);
        let mut detector = detector(8);

        let dirty = Arc::new(Mutex::new(Vec::new()));
        let recv = dirty.clone();
        detector.item_dirty.connect(move |pid: &PresetId| {
            recv.lock().push(pid.clone());
        });

        // First pass seeds the signature; nothing is dirty yet.
        let report = detector.tick(&host, &mut registry);
        assert!(report.changed.is_empty());
        assert!(!registry.get(&id("a")).unwrap().is_dirty());

        host.set_thumbnail("a", thumb(200));
        let report = detector.tick(&host, &mut registry);
        assert_eq!(report.changed, vec![id("a")]);
        assert!(registry.get(&id("a")).unwrap().is_dirty());
        assert_eq!(dirty.lock().as_slice(), &[id("a")]);
    }

    #[test]
    fn test_unchanged_thumbnail_stays_clean() {
        let host = FakeHost::with_presets(&["a"]);
        let mut registry = synced_registry(&host);
        let mut detector = detector(8);

        detector.tick(&host, &mut registry);
        let report = detector.tick(&host, &mut registry);
        assert!(report.changed.is_empty());
        assert!(!registry.get(&id("a")).unwrap().is_dirty());
    }

    #[test]
    fn test_vanished_preset_dropped_within_one_tick() {
        let host = FakeHost::with_presets(&["a", "b"]);
        let mut registry = synced_registry(&host);
        let mut detector = detector(8);

        detector.tick(&host, &mut registry);
        host.remove("a");

        let report = detector.tick(&host, &mut registry);
        assert_eq!(report.dropped, vec![id("a")]);
        assert!(!detector.rotation.contains(&id("a")));
    }

    #[test]
    fn test_hidden_detector_does_zero_work() {
        let host = FakeHost::with_presets(&["a"]);
        let mut registry = synced_registry(&host);
        let mut detector = detector(8);
        detector.set_visible(false);

        let report = detector.tick(&host, &mut registry);
        assert_eq!(report, TickReport::default());
        assert!(registry.get(&id("a")).unwrap().signature().is_none());
    }

    #[test]
    fn test_resume_restarts_rotation() {
        let host = FakeHost::with_presets(&["a", "b", "c", "d"]);
        let mut registry = synced_registry(&host);
        let mut detector = detector(2);

        detector.tick(&host, &mut registry);
        detector.set_visible(false);
        detector.set_visible(true);

        // Fresh cursor: the first batch starts from the beginning again.
        let report = detector.tick(&host, &mut registry);
        assert_eq!(report.sampled, 2);
        assert_eq!(detector.cursor, 2);
    }

    #[test]
    fn test_host_failure_surfaced_once() {
        let host = FakeHost::with_presets(&["a", "b"]);
        let mut registry = synced_registry(&host);
        let mut detector = detector(1);

        let errors = Arc::new(Mutex::new(0usize));
        let recv = errors.clone();
        detector.host_error.connect(move |_| {
            *recv.lock() += 1;
        });

        *host.unreachable.lock() = true;
        detector.tick(&host, &mut registry);
        detector.tick(&host, &mut registry);
        assert_eq!(*errors.lock(), 1);
    }

    #[test]
    fn test_idle_interval_selected() {
        let mut detector = ThumbnailDetector::new(DetectorConfig::default());
        assert_eq!(detector.current_interval(), detector.config().interval);
        detector.set_host_idle(true);
        assert_eq!(detector.current_interval(), detector.config().idle_interval);
    }
}
