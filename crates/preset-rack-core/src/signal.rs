//! Signal/slot system for the panel core.
//!
//! A type-safe, Qt-inspired signal/slot mechanism: models emit signals when
//! their state changes, and connected slots (callbacks) are invoked in
//! response.
//!
//! The panel core runs on a single cooperative UI thread (all mutations
//! happen between discrete gesture or timer events), so dispatch is always
//! direct and synchronous: `emit` returns only after every connected slot
//! has run. Because models emit only after a mutation is fully applied,
//! observers never see partial state.
//!
//! # Example
//!
//! ```
//! use preset_rack_core::Signal;
//!
//! let renamed = Signal::<String>::new();
//!
//! let conn_id = renamed.connect(|name| {
//!     println!("renamed to {name}");
//! });
//!
//! renamed.emit("Inks".to_string());
//! renamed.disconnect(conn_id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via
    /// [`Signal::disconnect`]. The ID remains valid until the connection is
    /// explicitly disconnected or the signal is dropped.
    pub struct ConnectionId;
}

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Arc<dyn Fn(&Args) + Send + Sync>,
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for
///   signals with no arguments, or a tuple like `(String, i32)` for
///   multiple arguments.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot
    /// later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Connection {
            slot: Arc::new(slot),
        })
    }

    /// Connect a slot and get an RAII guard that disconnects on drop.
    pub fn connect_guarded<F>(self: &Arc<Self>, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            signal: Arc::clone(self),
            id,
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false`
    /// otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing. Useful during batch
    /// updates or restore to prevent cascading notifications.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in turn.
    ///
    /// If the signal is blocked, this does nothing. Slots are invoked
    /// synchronously on the calling thread; `emit` returns after the last
    /// slot has run.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "preset_rack_core::signal", "signal blocked, skipping emit");
            return;
        }

        // Snapshot the slots so a handler may connect/disconnect without
        // deadlocking against the connection table.
        let slots: Vec<Arc<dyn Fn(&Args) + Send + Sync>> = {
            let connections = self.connections.lock();
            tracing::trace!(
                target: "preset_rack_core::signal",
                connection_count = connections.len(),
                "emitting signal"
            );
            connections.values().map(|c| Arc::clone(&c.slot)).collect()
        };

        for slot in slots {
            slot(&args);
        }
    }
}

/// RAII guard that disconnects a slot when dropped.
///
/// Returned by [`Signal::connect_guarded`]. Holds the signal alive for the
/// guard's lifetime.
pub struct ConnectionGuard<Args> {
    signal: Arc<Signal<Args>>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<Args> {
    /// The underlying connection ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        self.signal.disconnect(self.id);
    }
}
