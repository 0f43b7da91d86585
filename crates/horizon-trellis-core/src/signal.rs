//! Signal/slot system for Horizon Trellis.
//!
//! This module provides a type-safe signal/slot mechanism for notifying
//! observers of state changes. Signals are emitted by objects when their
//! state changes, and connected slots (callbacks) are invoked in response.
//!
//! Slots are always invoked directly on the emitting thread. Cross-thread
//! delivery is handled one level up, by posting work to the owning
//! [`Dispatcher`](crate::Dispatcher) before emitting.
//!
//! # Example
//!
//! ```
//! use horizon_trellis_core::Signal;
//!
//! let row_activated = Signal::<usize>::new();
//!
//! let conn_id = row_activated.connect(|row| {
//!     println!("Row {row} activated");
//! });
//!
//! row_activated.emit(3);
//! row_activated.disconnect(conn_id);
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
    /// The slot function to invoke (Arc-wrapped for safe capture).
    slot: Arc<dyn Fn(&Args) + Send + Sync>,
}

/// A type-safe signal that can have multiple connected slots.
///
/// When a signal is emitted, all connected slots are invoked with a
/// reference to the provided arguments, in connection order.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for
///   signals with no arguments, or a tuple like `(usize, bool)` for
///   multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync` and can be safely shared between
/// threads; emission invokes slots on the emitting thread.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
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

    /// Disconnect a previously connected slot.
    ///
    /// Returns `true` if the connection existed and was removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Emit the signal, invoking all connected slots.
    ///
    /// Emission is a no-op while the signal is [blocked](Self::set_blocked).
    /// Slots are collected under the lock and invoked after it is released,
    /// so a slot may connect or disconnect without deadlocking.
    pub fn emit(&self, args: Args) {
        if self.blocked.load(Ordering::Relaxed) {
            return;
        }

        let slots: Vec<_> = self
            .connections
            .lock()
            .values()
            .map(|conn| conn.slot.clone())
            .collect();

        for slot in slots {
            slot(&args);
        }
    }

    /// Block or unblock signal emission.
    ///
    /// Returns the previous blocked state.
    pub fn set_blocked(&self, blocked: bool) -> bool {
        self.blocked.swap(blocked, Ordering::Relaxed)
    }

    /// Returns `true` if emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Relaxed)
    }

    /// Returns the number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().len())
            .field("blocked", &self.blocked.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_and_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let recv = received.clone();
        signal.connect(move |value| {
            recv.lock().push(*value);
        });

        signal.emit(1);
        signal.emit(2);

        assert_eq!(*received.lock(), vec![1, 2]);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::<()>::new();
        let count = Arc::new(Mutex::new(0));

        let c = count.clone();
        let id = signal.connect(move |()| {
            *c.lock() += 1;
        });

        signal.emit(());
        assert!(signal.disconnect(id));
        signal.emit(());

        assert_eq!(*count.lock(), 1);
        assert!(!signal.disconnect(id));
    }

    #[test]
    fn test_blocked_emission() {
        let signal = Signal::<()>::new();
        let count = Arc::new(Mutex::new(0));

        let c = count.clone();
        signal.connect(move |()| {
            *c.lock() += 1;
        });

        assert!(!signal.set_blocked(true));
        signal.emit(());
        assert_eq!(*count.lock(), 0);

        assert!(signal.set_blocked(false));
        signal.emit(());
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_multiple_connections() {
        let signal = Signal::<()>::new();
        let count = Arc::new(Mutex::new(0));

        for _ in 0..3 {
            let c = count.clone();
            signal.connect(move |()| {
                *c.lock() += 1;
            });
        }

        assert_eq!(signal.connection_count(), 3);
        signal.emit(());
        assert_eq!(*count.lock(), 3);
    }

    #[test]
    fn test_slot_may_disconnect_during_emit() {
        let signal = Arc::new(Signal::<()>::new());
        let count = Arc::new(Mutex::new(0));

        let sig = signal.clone();
        let c = count.clone();
        signal.connect(move |()| {
            *c.lock() += 1;
            sig.disconnect_all();
        });

        signal.emit(());
        signal.emit(());
        assert_eq!(*count.lock(), 1);
    }
}
