//! Logging facilities for the panel core.
//!
//! The workspace uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core plumbing target.
    pub const CORE: &str = "preset_rack_core";
    /// Timer system target.
    pub const TIMER: &str = "preset_rack_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "preset_rack_core::signal";
    /// Group/order model target.
    pub const MODEL: &str = "preset_rack::model";
    /// Selection model target.
    pub const SELECTION: &str = "preset_rack::selection";
    /// Drag-reorder engine target.
    pub const DRAG: &str = "preset_rack::drag";
    /// Thumbnail change detector target.
    pub const DETECTOR: &str = "preset_rack::detector";
    /// Panel context target.
    pub const PANEL: &str = "preset_rack::panel";
}
