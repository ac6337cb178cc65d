//! The item registry.
//!
//! Holds canonical references to host presets and their last-known display
//! metadata: name, role, thumbnail signature, and the dirty flag the change
//! detector raises. The registry owns no ordering — that belongs to the
//! group/order model — and it never owns the underlying presets; entries
//! are references that come and go as the host listing changes.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use preset_rack_core::Signal;
use serde::{Deserialize, Serialize};

use crate::host::{PresetInfo, PresetRole};
use crate::signature::Signature;

/// Stable, host-assigned identifier for a preset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetId(String);

impl PresetId {
    /// Wraps a host identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PresetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Display metadata cached for one preset.
#[derive(Debug, Clone)]
pub struct PresetEntry {
    name: String,
    role: PresetRole,
    signature: Option<Signature>,
    last_checked: Option<Instant>,
    dirty: bool,
}

impl PresetEntry {
    /// The preset's last-known display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The preset's tool role.
    pub fn role(&self) -> PresetRole {
        self.role
    }

    /// The last signature the change detector stored.
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// When the change detector last sampled this preset.
    pub fn last_checked(&self) -> Option<Instant> {
        self.last_checked
    }

    /// Whether the thumbnail changed since the UI last refreshed it.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// What a [`PresetRegistry::sync`] pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Ids newly known to the host.
    pub added: Vec<PresetId>,
    /// Ids the host no longer lists.
    pub removed: Vec<PresetId>,
    /// Ids whose display name changed.
    pub renamed: Vec<PresetId>,
}

impl SyncReport {
    /// True when the sync changed nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.renamed.is_empty()
    }
}

/// Registry of all presets currently known, keyed by host id.
pub struct PresetRegistry {
    entries: HashMap<PresetId, PresetEntry>,
    /// Emitted when a preset's display name changes. Args: (id, new name)
    pub name_changed: Signal<(PresetId, String)>,
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            name_changed: Signal::new(),
        }
    }

    /// Reconcile the registry against a fresh host listing.
    ///
    /// New presets are inserted, renamed ones updated (emitting
    /// `name_changed`), and presets absent from the listing dropped. The
    /// stored signature survives a rename — the thumbnail did not change
    /// just because the name did.
    pub fn sync(&mut self, listing: &[PresetInfo]) -> SyncReport {
        let mut report = SyncReport::default();

        for info in listing {
            match self.entries.get_mut(&info.id) {
                Some(entry) => {
                    entry.role = info.role;
                    if entry.name != info.name {
                        entry.name = info.name.clone();
                        report.renamed.push(info.id.clone());
                        self.name_changed.emit((info.id.clone(), info.name.clone()));
                    }
                }
                None => {
                    self.entries.insert(
                        info.id.clone(),
                        PresetEntry {
                            name: info.name.clone(),
                            role: info.role,
                            signature: None,
                            last_checked: None,
                            dirty: false,
                        },
                    );
                    report.added.push(info.id.clone());
                }
            }
        }

        let listed: std::collections::HashSet<&PresetId> = listing.iter().map(|i| &i.id).collect();
        let vanished: Vec<PresetId> = self
            .entries
            .keys()
            .filter(|id| !listed.contains(id))
            .cloned()
            .collect();
        for id in &vanished {
            self.entries.remove(id);
        }
        report.removed = vanished;

        if !report.is_empty() {
            tracing::debug!(
                target: "preset_rack::model",
                added = report.added.len(),
                removed = report.removed.len(),
                renamed = report.renamed.len(),
                "registry synced"
            );
        }
        report
    }

    /// Apply a rename pushed by the host.
    ///
    /// Returns `false` for an unknown id (stale notification — ignored).
    pub fn rename(&mut self, id: &PresetId, new_name: impl Into<String>) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        let new_name = new_name.into();
        if entry.name != new_name {
            entry.name = new_name.clone();
            self.name_changed.emit((id.clone(), new_name));
        }
        true
    }

    /// Whether the registry knows this id.
    pub fn contains(&self, id: &PresetId) -> bool {
        self.entries.contains_key(id)
    }

    /// Look up a preset's cached metadata.
    pub fn get(&self, id: &PresetId) -> Option<&PresetEntry> {
        self.entries.get(id)
    }

    /// A preset's display name.
    pub fn name(&self, id: &PresetId) -> Option<&str> {
        self.entries.get(id).map(|e| e.name.as_str())
    }

    /// Store a freshly sampled signature and stamp the check time.
    pub fn store_signature(&mut self, id: &PresetId, signature: Signature) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.signature = Some(signature);
            entry.last_checked = Some(Instant::now());
        }
    }

    /// Stamp the check time without replacing the signature.
    pub fn touch(&mut self, id: &PresetId) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.last_checked = Some(Instant::now());
        }
    }

    /// Raise the dirty flag on a preset.
    pub fn mark_dirty(&mut self, id: &PresetId) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.dirty = true;
        }
    }

    /// Clear the dirty flag once the UI has refreshed the thumbnail.
    pub fn clear_dirty(&mut self, id: &PresetId) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.dirty = false;
        }
    }

    /// All known ids in a stable order.
    pub fn ids(&self) -> Vec<PresetId> {
        let mut ids: Vec<PresetId> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of presets known.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no presets are known.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn info(id: &str, name: &str) -> PresetInfo {
        PresetInfo::new(PresetId::from(id), name, PresetRole::Brush)
    }

    #[test]
    fn test_sync_adds_and_removes() {
        let mut registry = PresetRegistry::new();

        let report = registry.sync(&[info("a", "Ink"), info("b", "Chalk")]);
        assert_eq!(report.added.len(), 2);
        assert_eq!(registry.len(), 2);

        let report = registry.sync(&[info("b", "Chalk")]);
        assert_eq!(report.removed, vec![PresetId::from("a")]);
        assert!(!registry.contains(&PresetId::from("a")));
    }

    #[test]
    fn test_sync_detects_rename() {
        let mut registry = PresetRegistry::new();
        registry.sync(&[info("a", "Ink")]);

        let renames = Arc::new(AtomicUsize::new(0));
        let recv = renames.clone();
        registry.name_changed.connect(move |_| {
            recv.fetch_add(1, Ordering::SeqCst);
        });

        let report = registry.sync(&[info("a", "Ink v2")]);
        assert_eq!(report.renamed, vec![PresetId::from("a")]);
        assert_eq!(registry.name(&PresetId::from("a")), Some("Ink v2"));
        assert_eq!(renames.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rename_unknown_id_is_ignored() {
        let mut registry = PresetRegistry::new();
        assert!(!registry.rename(&PresetId::from("ghost"), "anything"));
    }

    #[test]
    fn test_dirty_flag_lifecycle() {
        let mut registry = PresetRegistry::new();
        registry.sync(&[info("a", "Ink")]);
        let id = PresetId::from("a");

        assert!(!registry.get(&id).unwrap().is_dirty());
        registry.mark_dirty(&id);
        assert!(registry.get(&id).unwrap().is_dirty());
        registry.clear_dirty(&id);
        assert!(!registry.get(&id).unwrap().is_dirty());
    }

    #[test]
    fn test_signature_survives_rename() {
        let mut registry = PresetRegistry::new();
        registry.sync(&[info("a", "Ink")]);
        let id = PresetId::from("a");

        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([1, 2, 3, 4]));
        let sig = Signature::sample(&img, 4).unwrap();
        registry.store_signature(&id, sig.clone());

        registry.sync(&[info("a", "Ink v2")]);
        assert_eq!(registry.get(&id).unwrap().signature(), Some(&sig));
    }

    #[test]
    fn test_ids_are_sorted() {
        let mut registry = PresetRegistry::new();
        registry.sync(&[info("c", "C"), info("a", "A"), info("b", "B")]);
        assert_eq!(
            registry.ids(),
            vec![PresetId::from("a"), PresetId::from("b"), PresetId::from("c")]
        );
    }
}
