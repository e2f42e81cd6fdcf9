//! Signal/slot system for Horizon Sections.
//!
//! This module provides the event channel that data sources publish their
//! change batches on. A [`Signal`] keeps an ordered list of connected slots
//! (callbacks) and invokes them synchronously, in registration order, every
//! time a value is emitted.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The channel type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`Subscription`] - Handle with idempotent [`dispose`](Subscription::dispose)
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Delivery Guarantees
//!
//! - Slots are called on the emitting thread before `emit` returns.
//! - Slots are called in the order they were connected.
//! - A slot connected while an emission is being delivered does not receive
//!   that in-flight value.
//! - A slot disconnected while an emission is being delivered is skipped for
//!   the rest of that delivery.
//! - No lock is held while slots run, so a slot may read the object that
//!   emitted, or connect and disconnect other slots.
//!
//! # Example
//!
//! ```
//! use horizon_sections_core::Signal;
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let removed = Signal::<Vec<usize>>::new();
//! let log = Arc::new(Mutex::new(Vec::new()));
//!
//! let log_clone = log.clone();
//! let id = removed.connect(move |rows| log_clone.lock().extend(rows.iter().copied()));
//!
//! removed.emit(vec![4, 2]);
//! removed.disconnect(id);
//! removed.emit(vec![1]);
//!
//! assert_eq!(*log.lock(), vec![4, 2]);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is explicitly disconnected or
    /// the signal is dropped.
    ///
    /// # Related
    ///
    /// - [`Signal::connect`] - Returns a `ConnectionId`
    /// - [`Signal::disconnect`] - Removes a connection by ID
    /// - [`ConnectionGuard`] - RAII alternative that auto-disconnects
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    /// The slot function to invoke.
    slot: Slot<Args>,
    /// Cleared on disconnect so an in-flight delivery can skip the slot.
    active: Arc<AtomicBool>,
}

/// Connections plus their registration order.
///
/// `SlotMap` reuses vacant slots, so its iteration order is not the order in
/// which connections were made. `order` is.
struct Connections<Args> {
    slots: SlotMap<ConnectionId, Connection<Args>>,
    order: Vec<ConnectionId>,
}

impl<Args> Connections<Args> {
    fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    fn remove(&mut self, id: ConnectionId) -> bool {
        match self.slots.remove(id) {
            Some(connection) => {
                connection.active.store(false, Ordering::Release);
                self.order.retain(|&other| other != id);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        for (_, connection) in self.slots.drain() {
            connection.active.store(false, Ordering::Release);
        }
        self.order.clear();
    }
}

struct SignalInner<Args> {
    connections: Mutex<Connections<Args>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args> SignalInner<Args> {
    fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id)
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// Signals are the transport for change notifications in Horizon Sections.
/// When a signal is emitted, all connected slots are invoked with a reference
/// to the emitted value.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(String, i32)` for multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`. Emission is synchronous on the calling
/// thread; the signal does not serialize concurrent emitters against each other.
///
/// # Related Types
///
/// - [`ConnectionId`] - Returned by [`connect`](Self::connect), used to disconnect
/// - [`Subscription`] - Returned by [`subscribe`](Self::subscribe)
/// - [`ConnectionGuard`] - RAII-style connection that auto-disconnects on drop
/// - [`crate::Property`] - Emits a signal on every write
pub struct Signal<Args> {
    inner: Arc<SignalInner<Args>>,
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
            inner: Arc::new(SignalInner {
                connections: Mutex::new(Connections::new()),
                blocked: AtomicBool::new(false),
            }),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_sections_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connect_inner(Arc::new(slot)).0
    }

    fn connect_inner(&self, slot: Slot<Args>) -> (ConnectionId, Arc<AtomicBool>) {
        let active = Arc::new(AtomicBool::new(true));
        let mut connections = self.inner.connections.lock();
        let id = connections.slots.insert(Connection {
            slot,
            active: active.clone(),
        });
        connections.order.push(id);
        (id, active)
    }

    /// Connect a slot and return a [`Subscription`] handle for it.
    ///
    /// Dropping the handle does not disconnect the slot; call
    /// [`Subscription::dispose`] for that.
    pub fn subscribe<F>(&self, slot: F) -> Subscription<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let (id, active) = self.connect_inner(Arc::new(slot));
        Subscription {
            signal: Arc::downgrade(&self.inner),
            id,
            active,
        }
    }

    /// Connect a slot with automatic disconnection when the guard is dropped.
    ///
    /// The guard only holds a weak reference, so it is fine for the signal to
    /// be dropped before the guard.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        ConnectionGuard {
            subscription: self.subscribe(slot),
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    /// Disconnecting the same ID twice is harmless.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.inner.disconnect(id)
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.inner.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.inner.connections.lock().slots.len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` will do nothing. This is useful
    /// during initialization to prevent cascading notifications.
    pub fn set_blocked(&self, blocked: bool) {
        self.inner.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.inner.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in registration order.
    ///
    /// If the signal is blocked, this does nothing.
    #[tracing::instrument(skip_all, target = "horizon_sections_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        // Snapshot the slots so none of them runs under the lock.
        let slots: Vec<(Arc<AtomicBool>, Slot<Args>)> = {
            let connections = self.inner.connections.lock();
            connections
                .order
                .iter()
                .filter_map(|&id| connections.slots.get(id))
                .map(|conn| (conn.active.clone(), conn.slot.clone()))
                .collect()
        };
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for (active, slot) in slots {
            if active.load(Ordering::Acquire) {
                slot(&args);
            }
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.inner.connections.lock().slots.len())
            .field("blocked", &self.inner.blocked.load(Ordering::SeqCst))
            .finish()
    }
}

/// A handle to one connection made with [`Signal::subscribe`].
///
/// Disposal stops further delivery to the slot. It can be called any number
/// of times, including after the signal itself has been dropped.
pub struct Subscription<Args> {
    signal: Weak<SignalInner<Args>>,
    id: ConnectionId,
    active: Arc<AtomicBool>,
}

impl<Args> Subscription<Args> {
    /// The connection ID behind this subscription.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the slot will still receive emissions.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) && self.signal.strong_count() > 0
    }

    /// Disconnect the slot. Returns `true` only for the call that actually
    /// removed the connection.
    pub fn dispose(&self) -> bool {
        self.active.store(false, Ordering::Release);
        match self.signal.upgrade() {
            Some(signal) => signal.disconnect(self.id),
            None => false,
        }
    }
}

impl<Args> fmt::Debug for Subscription<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Disconnects its slot when dropped.
///
/// Created via [`Signal::connect_scoped`]. Handy for observers whose
/// lifetime is a lexical scope.
///
/// # Example
///
/// ```
/// use horizon_sections_core::Signal;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let batches = Signal::<Vec<usize>>::new();
/// let total = Arc::new(AtomicUsize::new(0));
///
/// let total_clone = total.clone();
/// let guard = batches.connect_scoped(move |batch| {
///     total_clone.fetch_add(batch.len(), Ordering::SeqCst);
/// });
/// batches.emit(vec![1, 2]);
/// drop(guard);
/// batches.emit(vec![3]);
///
/// assert_eq!(total.load(Ordering::SeqCst), 2);
/// ```
pub struct ConnectionGuard<Args> {
    subscription: Subscription<Args>,
}

impl<Args> ConnectionGuard<Args> {
    /// The connection ID behind this guard.
    pub fn id(&self) -> ConnectionId {
        self.subscription.id()
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}

static_assertions::assert_impl_all!(Signal<Vec<u32>>: Send, Sync);
static_assertions::assert_impl_all!(Subscription<Vec<u32>>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Connects a slot that records every value it sees.
    fn record(signal: &Signal<i32>) -> (ConnectionId, Arc<Mutex<Vec<i32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let id = signal.connect(move |&value| seen_clone.lock().push(value));
        (id, seen)
    }

    #[test]
    fn test_emit_reaches_every_slot() {
        let signal = Signal::<i32>::new();
        let (_, first) = record(&signal);
        let (_, second) = record(&signal);
        assert_eq!(signal.connection_count(), 2);

        signal.emit(5);
        signal.emit(8);
        assert_eq!(*first.lock(), vec![5, 8]);
        assert_eq!(*second.lock(), vec![5, 8]);
    }

    #[test]
    fn test_disconnect_by_id() {
        let signal = Signal::<i32>::new();
        let (id, seen) = record(&signal);

        signal.emit(1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(2);
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_blocked_signal_drops_values() {
        let signal = Signal::<i32>::new();
        let (_, seen) = record(&signal);

        signal.set_blocked(true);
        assert!(signal.is_blocked());
        signal.emit(1);
        signal.set_blocked(false);
        signal.emit(2);
        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn test_delivery_follows_registration_order() {
        let signal = Signal::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let ids: Vec<_> = (0..3)
            .map(|n| {
                let order = order.clone();
                signal.connect(move |_| order.lock().push(n))
            })
            .collect();

        // Free a slot so the next connection reuses it.
        signal.disconnect(ids[0]);
        let order_clone = order.clone();
        signal.connect(move |_| order_clone.lock().push(3));

        signal.emit(());
        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_connect_during_emit_misses_in_flight_value() {
        let signal = Arc::new(Signal::<i32>::new());
        let late = Arc::new(Mutex::new(Vec::new()));

        let signal_clone = signal.clone();
        let late_clone = late.clone();
        signal.connect(move |&value| {
            if value == 1 {
                let late = late_clone.clone();
                signal_clone.connect(move |&v| late.lock().push(v));
            }
        });

        signal.emit(1);
        assert!(late.lock().is_empty());

        signal.emit(2);
        assert_eq!(*late.lock(), vec![2]);
    }

    #[test]
    fn test_disconnect_during_emit_skips_slot() {
        let signal = Arc::new(Signal::<i32>::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let victim = Arc::new(Mutex::new(None));

        let signal_clone = signal.clone();
        let victim_clone = victim.clone();
        signal.connect(move |_| {
            if let Some(id) = victim_clone.lock().take() {
                signal_clone.disconnect(id);
            }
        });

        let received_clone = received.clone();
        let id = signal.connect(move |&value| received_clone.lock().push(value));
        *victim.lock() = Some(id);

        signal.emit(7);
        assert!(received.lock().is_empty());
        assert_eq!(signal.connection_count(), 1);
    }

    #[test]
    fn test_subscription_dispose_is_idempotent() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let subscription = signal.subscribe(move |&value| received_clone.lock().push(value));
        assert!(subscription.is_active());

        signal.emit(1);
        assert!(subscription.dispose());
        assert!(!subscription.dispose());
        assert!(!subscription.is_active());
        signal.emit(2);

        assert_eq!(*received.lock(), vec![1]);
    }

    #[test]
    fn test_subscription_outlives_signal() {
        let signal = Signal::<i32>::new();
        let subscription = signal.subscribe(|_| {});
        drop(signal);

        assert!(!subscription.is_active());
        assert!(!subscription.dispose());
    }

    #[test]
    fn test_disconnect_all_deactivates_subscriptions() {
        let signal = Signal::<()>::new();
        let subscriptions: Vec<_> = (0..4).map(|_| signal.subscribe(|_| {})).collect();
        assert_eq!(signal.connection_count(), 4);

        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
        assert!(subscriptions.iter().all(|s| !s.is_active()));
    }

    #[test]
    fn test_guard_disconnects_on_drop() {
        let signal = Signal::<()>::new();
        let hits = Arc::new(AtomicBool::new(false));

        let hits_clone = hits.clone();
        let guard = signal.connect_scoped(move |_| hits_clone.store(true, Ordering::SeqCst));
        assert_eq!(signal.connection_count(), 1);
        drop(guard);

        signal.emit(());
        assert!(!hits.load(Ordering::SeqCst));
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_emit_from_other_thread() {
        let signal = Arc::new(Signal::<i32>::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| received_clone.lock().push(value));

        let signal_clone = signal.clone();
        std::thread::spawn(move || signal_clone.emit(100))
            .join()
            .unwrap();

        assert_eq!(*received.lock(), vec![100]);
    }
}
