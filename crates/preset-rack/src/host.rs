//! The host collection interface.
//!
//! The host application owns the presets themselves: their identity, image
//! data, and name metadata. This core only organizes references to them, so
//! everything it needs from the host sits behind the [`PresetHost`] trait —
//! the panel stays host-agnostic and the whole core is testable against an
//! in-memory fake.
//!
//! All calls that can actually fail return [`HostError`]; the panel maps
//! those to `RackError::HostUnavailable` and leaves the model in its
//! last-known-good state. A preset that has simply vanished between calls
//! is reported as `Ok(None)`, not as an error.

use image::RgbaImage;

use crate::registry::PresetId;

/// Errors raised by the host collection.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host's resource collection could not be reached at all.
    #[error("preset collection unreachable: {0}")]
    CollectionUnreachable(String),

    /// The host rejected an operation (e.g. activating a preset it no
    /// longer knows).
    #[error("host rejected operation: {0}")]
    Rejected(String),
}

/// What kind of tool a preset drives.
///
/// Resolved once from host data when the registry syncs, rather than
/// re-derived ad hoc on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PresetRole {
    Brush,
    Eraser,
}

/// One entry of the host's preset listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetInfo {
    pub id: PresetId,
    pub name: String,
    pub role: PresetRole,
}

impl PresetInfo {
    /// Creates a listing entry.
    pub fn new(id: PresetId, name: impl Into<String>, role: PresetRole) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }
}

/// Read access to the host application's preset collection.
///
/// The listing and the bitmap fetch are split so that a registry sync never
/// copies every thumbnail; together they cover the host's
/// `(id, name, bitmap)` enumeration.
pub trait PresetHost {
    /// Enumerate the presets the host currently knows.
    fn presets(&self) -> Result<Vec<PresetInfo>, HostError>;

    /// Fetch the current thumbnail bitmap for a preset.
    ///
    /// Returns `Ok(None)` when the preset has disappeared from the host —
    /// callers skip it silently.
    fn thumbnail(&self, id: &PresetId) -> Result<Option<RgbaImage>, HostError>;

    /// The preset currently active in the host, if any.
    fn current_preset(&self) -> Result<Option<PresetId>, HostError>;

    /// Make a preset the host's active one.
    fn activate_preset(&self, id: &PresetId) -> Result<(), HostError>;

    /// The host's current brush size.
    fn brush_size(&self) -> Result<f32, HostError>;

    /// Set the host's brush size.
    fn set_brush_size(&self, size: f32) -> Result<(), HostError>;

    /// Upper bound for the brush-size slider.
    fn max_brush_size(&self) -> f32 {
        1000.0
    }
}
