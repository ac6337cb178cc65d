//! Snapshot persistence.
//!
//! The group/order model's full structure — group names, order, item
//! membership, collapsed/active flags — serializes to a durable form and
//! restores across application restarts. The on-disk shape is a collaborator
//! concern; what matters here is that the snapshot/restore pair is complete
//! and order-preserving.
//!
//! Files are replaced atomically: the JSON is written to a sibling
//! temporary file which is then persisted over the target, so a crash
//! mid-write never leaves a truncated snapshot behind.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::registry::PresetId;

/// One group's persisted structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub items: Vec<PresetId>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub active: bool,
}

/// The full persisted structure of the group/order model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackSnapshot {
    /// Groups in root order.
    pub groups: Vec<GroupSnapshot>,
    #[serde(default)]
    pub exclusive_uncollapse: bool,
}

/// Errors from snapshot file I/O.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to read snapshot '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write snapshot '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot '{path}': {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Write a snapshot to disk as JSON, replacing the target atomically.
pub fn save_json(path: impl AsRef<Path>, snapshot: &RackSnapshot) -> Result<(), PersistError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let json = serde_json::to_vec_pretty(snapshot).map_err(|source| PersistError::Malformed {
        path: display.clone(),
        source,
    })?;

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir),
        None => tempfile::NamedTempFile::new(),
    }
    .map_err(|source| PersistError::Write {
        path: display.clone(),
        source,
    })?;

    tmp.write_all(&json).map_err(|source| PersistError::Write {
        path: display.clone(),
        source,
    })?;
    tmp.persist(path).map_err(|err| PersistError::Write {
        path: display,
        source: err.error,
    })?;
    Ok(())
}

/// Read a snapshot back from a JSON file.
pub fn load_json(path: impl AsRef<Path>) -> Result<RackSnapshot, PersistError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let text = std::fs::read_to_string(path).map_err(|source| PersistError::Read {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| PersistError::Malformed {
        path: display,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rack::RackModel;

    fn id(s: &str) -> PresetId {
        PresetId::from(s)
    }

    fn sample_snapshot() -> RackSnapshot {
        RackSnapshot {
            groups: vec![
                GroupSnapshot {
                    name: "Sketching".into(),
                    items: vec![id("a"), id("b")],
                    collapsed: false,
                    active: true,
                },
                GroupSnapshot {
                    name: "Inks".into(),
                    items: vec![id("c")],
                    collapsed: true,
                    active: false,
                },
            ],
            exclusive_uncollapse: false,
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rack.json");

        let snapshot = sample_snapshot();
        save_json(&path, &snapshot).unwrap();
        let loaded = load_json(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rack.json");

        save_json(&path, &RackSnapshot::default()).unwrap();
        save_json(&path, &sample_snapshot()).unwrap();
        assert_eq!(load_json(&path).unwrap(), sample_snapshot());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_json(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PersistError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rack.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_json(&path).unwrap_err(),
            PersistError::Malformed { .. }
        ));
    }

    #[test]
    fn test_model_round_trip_through_disk() {
        let mut model = RackModel::new();
        let g1 = model.add_group("Sketching");
        let g2 = model.add_group("Inks");
        model.add_item(g1, id("a")).unwrap();
        model.add_item(g1, id("b")).unwrap();
        model.add_item(g2, id("c")).unwrap();
        model.set_collapsed(g2, true);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rack.json");
        save_json(&path, &model.snapshot()).unwrap();

        let mut restored = RackModel::new();
        restored.restore(&load_json(&path).unwrap(), |_| true);

        assert_eq!(restored.snapshot(), model.snapshot());
    }

    #[test]
    fn test_snapshot_defaults_tolerate_sparse_json() {
        let json = r#"{"groups":[{"name":"G","items":["x"]}]}"#;
        let snapshot: RackSnapshot = serde_json::from_str(json).unwrap();
        assert!(!snapshot.groups[0].collapsed);
        assert!(!snapshot.groups[0].active);
        assert!(!snapshot.exclusive_uncollapse);
    }
}
