//! Signal/slot system.
//!
//! A [`Signal<Args>`] notifies every connected slot when it is emitted. Each
//! connection decides how its slot runs:
//!
//! - **Direct**: the slot runs inside `emit`, before `emit` returns.
//! - **Queued**: the slot and a clone of the arguments are posted to an
//!   [`EventLoop`] and run on a later turn of that loop.
//!
//! Queued connections are how an object talks to itself asynchronously: it
//! connects one of its own signals to one of its own methods with a queued
//! connection, so emitting never re-enters the handler.
//!
//! # Example
//!
//! ```
//! use cashpoint_core::{EventLoop, Signal};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let event_loop = EventLoop::new();
//! let text_changed = Signal::<String>::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = seen.clone();
//! text_changed.connect_queued(&event_loop, move |text| sink.lock().push(text.clone()));
//!
//! text_changed.emit("hello".to_string());
//! assert!(seen.lock().is_empty());
//!
//! event_loop.process_pending();
//! assert_eq!(*seen.lock(), vec!["hello".to_string()]);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::SignalError;
use crate::event_loop::EventLoop;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

/// Specifies how a connected slot is invoked when the signal is emitted.
#[derive(Clone, Debug, Default)]
pub enum ConnectionType {
    /// Invoke the slot immediately, inside `emit`.
    #[default]
    Direct,

    /// Post the invocation to the given event loop.
    ///
    /// The slot runs when the loop is next turned, never inside `emit`.
    Queued(EventLoop),
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

struct Connection<Args> {
    slot: Slot<Args>,
    connection_type: ConnectionType,
}

/// A type-safe signal that can have multiple connected slots.
///
/// `Args` is the argument type passed to slots. Use `()` for signals without
/// arguments and a tuple such as `(String, String)` for several.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    blocked: AtomicBool,
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().len())
            .field("blocked", &self.blocked.load(Ordering::SeqCst))
            .finish()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot that runs directly inside `emit`.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connect_with_type(slot, ConnectionType::Direct)
    }

    /// Connect a slot whose invocations are deferred to `event_loop`.
    pub fn connect_queued<F>(&self, event_loop: &EventLoop, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connect_with_type(slot, ConnectionType::Queued(event_loop.clone()))
    }

    /// Connect a slot with a specific connection type.
    pub fn connect_with_type<F>(&self, slot: F, connection_type: ConnectionType) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let connection = Connection {
            slot: Arc::new(slot),
            connection_type,
        };
        self.connections.lock().insert(connection)
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Like [`disconnect`](Self::disconnect), but reports unknown IDs as an error.
    pub fn try_disconnect(&self, id: ConnectionId) -> Result<(), SignalError> {
        if self.disconnect(id) {
            Ok(())
        } else {
            Err(SignalError::InvalidConnection)
        }
    }

    /// Returns `true` while the connection `id` is still attached.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.lock().contains_key(id)
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
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking or queuing every connected slot.
    ///
    /// Queued invocations whose event loop has stopped are dropped with a
    /// warning. Use [`try_emit`](Self::try_emit) to observe that case.
    pub fn emit(&self, args: Args) {
        if let Err(err) = self.try_emit(args) {
            tracing::warn!(target: targets::SIGNAL, "signal emission incomplete: {err}");
        }
    }

    /// Emit the signal, reporting queued invocations that could not be posted.
    ///
    /// Every slot is still attempted; the error only says that at least one
    /// queued invocation was dropped.
    #[tracing::instrument(skip_all, target = "cashpoint_core::signal", level = "trace")]
    pub fn try_emit(&self, args: Args) -> Result<(), SignalError> {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return Ok(());
        }

        // Snapshot the connections so slots may connect/disconnect while running.
        let snapshot: Vec<(Slot<Args>, ConnectionType)> = self
            .connections
            .lock()
            .values()
            .map(|conn| (conn.slot.clone(), conn.connection_type.clone()))
            .collect();
        tracing::trace!(
            target: targets::SIGNAL,
            connection_count = snapshot.len(),
            "emitting signal"
        );

        let mut result = Ok(());
        for (slot, connection_type) in snapshot {
            match connection_type {
                ConnectionType::Direct => slot(&args),
                ConnectionType::Queued(event_loop) => {
                    let queued_args = args.clone();
                    if event_loop.post(move || slot(&queued_args)).is_err() {
                        result = Err(SignalError::QueueFailed);
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_slots_see_every_emit() {
        let bank_selected = Signal::<u32>::new();
        let selected = Arc::new(Mutex::new(Vec::new()));

        let sink = selected.clone();
        bank_selected.connect(move |&bank_id| sink.lock().push(bank_id));

        bank_selected.emit(1481);
        bank_selected.emit(322);

        assert_eq!(*selected.lock(), vec![1481, 322]);
    }

    #[test]
    fn test_disconnected_slot_stops_receiving() {
        let town_changed = Signal::<String>::new();
        let towns = Arc::new(Mutex::new(Vec::new()));

        let sink = towns.clone();
        let id = town_changed.connect(move |town| sink.lock().push(town.clone()));
        assert!(town_changed.is_connected(id));

        town_changed.emit("Kazan".into());
        assert!(town_changed.disconnect(id));
        town_changed.emit("Samara".into());

        assert_eq!(*towns.lock(), vec!["Kazan".to_string()]);
        assert!(!town_changed.is_connected(id));
        assert_eq!(
            town_changed.try_disconnect(id),
            Err(SignalError::InvalidConnection)
        );
    }

    #[test]
    fn test_blocked_signal_drops_emits() {
        let rows_uploaded = Signal::<usize>::new();
        let uploads = Arc::new(Mutex::new(Vec::new()));

        let sink = uploads.clone();
        rows_uploaded.connect(move |&count| sink.lock().push(count));

        rows_uploaded.emit(64);
        rows_uploaded.set_blocked(true);
        assert_eq!(rows_uploaded.try_emit(128), Ok(()));
        rows_uploaded.set_blocked(false);
        rows_uploaded.emit(32);

        assert_eq!(*uploads.lock(), vec![64, 32]);
    }

    #[test]
    fn test_disconnect_all() {
        let refreshed = Signal::<()>::new();
        let ids: Vec<_> = (0..3).map(|_| refreshed.connect(|_| {})).collect();

        assert_eq!(refreshed.connection_count(), 3);
        refreshed.disconnect_all();
        assert_eq!(refreshed.connection_count(), 0);
        assert!(ids.iter().all(|&id| !refreshed.is_connected(id)));
    }

    #[test]
    fn test_queued_slot_waits_for_loop_turn() {
        let event_loop = EventLoop::new();
        let filter_request = Signal::<(String, String)>::new();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let sink = requests.clone();
        filter_request.connect_queued(&event_loop, move |request| {
            sink.lock().push(request.clone());
        });

        filter_request.emit(("%alfa%".into(), r#"{"rub":true}"#.into()));
        assert!(requests.lock().is_empty());
        assert_eq!(event_loop.pending_count(), 1);

        event_loop.process_pending();
        assert_eq!(
            *requests.lock(),
            vec![("%alfa%".to_string(), r#"{"rub":true}"#.to_string())]
        );
    }

    #[test]
    fn test_direct_runs_before_queued() {
        let event_loop = EventLoop::new();
        let cash_point_opened = Signal::<u32>::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let later = order.clone();
        cash_point_opened.connect_queued(&event_loop, move |&id| later.lock().push(("queued", id)));
        let now = order.clone();
        cash_point_opened.connect(move |&id| now.lock().push(("direct", id)));

        cash_point_opened.emit(77);
        assert_eq!(*order.lock(), vec![("direct", 77)]);

        event_loop.process_pending();
        assert_eq!(*order.lock(), vec![("direct", 77), ("queued", 77)]);
    }

    #[test]
    fn test_queued_emit_on_stopped_loop() {
        let event_loop = EventLoop::new();
        let filter_request = Signal::<String>::new();
        filter_request.connect_queued(&event_loop, |_| {});

        event_loop.quit();
        assert_eq!(
            filter_request.try_emit("%vtb%".into()),
            Err(SignalError::QueueFailed)
        );
        assert_eq!(event_loop.pending_count(), 0);
    }

    #[test]
    fn test_slot_may_disconnect_itself_during_emit() {
        let icon_loaded = Arc::new(Signal::<String>::new());
        let own_id = Arc::new(Mutex::new(None));

        let signal = icon_loaded.clone();
        let id_cell = own_id.clone();
        let id = icon_loaded.connect(move |_| {
            if let Some(id) = id_cell.lock().take() {
                signal.disconnect(id);
            }
        });
        *own_id.lock() = Some(id);

        icon_loaded.emit("sberbank".into());
        assert_eq!(icon_loaded.connection_count(), 0);
    }
}
