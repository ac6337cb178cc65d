//! Commonly used types, for glob import.
//!
//! ```ignore
//! use preset_rack::prelude::*;
//! ```

pub use crate::detector::{DetectorConfig, ThumbnailDetector, TickReport};
pub use crate::drag::{
    DragController, DragState, DragTarget, DropMap, DropOutcome, GroupSlot, ItemSlot,
    PressedElement,
};
pub use crate::error::{RackError, Result};
pub use crate::events::RackEvent;
pub use crate::geometry::{Point, Rect};
pub use crate::host::{HostError, PresetHost, PresetInfo, PresetRole};
pub use crate::model::cycle;
pub use crate::model::{AddOutcome, ClickModifiers, Group, GroupId, RackModel, SelectionModel};
pub use crate::panel::{PanelConfig, PresetPanel};
pub use crate::persist::{GroupSnapshot, RackSnapshot};
pub use crate::registry::{PresetEntry, PresetId, PresetRegistry, SyncReport};
pub use crate::signature::Signature;
