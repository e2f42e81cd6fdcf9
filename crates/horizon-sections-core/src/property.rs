//! Observable value container for Horizon Sections.
//!
//! This module provides [`Property<T>`], a value that can be read and
//! replaced, and that notifies on every replacement through its
//! [`changed`](Property::changed) signal. Data sources hold their current
//! snapshot in a property so other parts of an application can observe
//! wholesale replacement without knowing about change batches.
//!
//! # Example
//!
//! ```
//! use horizon_sections_core::Property;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let prop = Property::new(vec![1, 2, 3]);
//! let writes = Arc::new(AtomicUsize::new(0));
//!
//! let writes_clone = writes.clone();
//! prop.changed().connect(move |_| {
//!     writes_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! prop.set(vec![4]);
//! assert_eq!(prop.get(), vec![4]);
//! assert_eq!(writes.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::logging::targets;
use crate::signal::Signal;

/// A value container that notifies on every write.
///
/// Unlike an equality-gated property, `set()` always counts as a change:
/// callers replace wholesale snapshots whose types generally have no cheap
/// equality, and a consumer must be told about exactly the writes that
/// happened.
///
/// # Thread Safety
///
/// `Property<T>` uses interior mutability with `RwLock` and is `Send + Sync`
/// when `T` is. The write lock is released before `changed` is emitted, so
/// slots may read the property.
pub struct Property<T> {
    value: RwLock<T>,
    changed: Signal<()>,
}

impl<T> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            changed: Signal::new(),
        }
    }

    /// Access the value through a closure without cloning.
    ///
    /// The read lock is held for the duration of `f`; do not write to the
    /// same property from inside it.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Replace the value and notify.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
        self.notify();
    }

    /// Replace the value, returning the previous one, and notify.
    pub fn replace(&self, value: T) -> T {
        let old = std::mem::replace(&mut *self.value.write(), value);
        self.notify();
        old
    }

    /// Set the value without change notification.
    ///
    /// This is useful during initialization where nobody can be observing yet.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }

    /// The signal emitted after every `set()` / `replace()`.
    pub fn changed(&self) -> &Signal<()> {
        &self.changed
    }

    /// Consume the property and return its value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    fn notify(&self) {
        tracing::trace!(target: targets::PROPERTY, "property written");
        self.changed.emit(());
    }
}

impl<T: Clone> Property<T> {
    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: Clone> Clone for Property<T> {
    /// Clones the value; the clone starts with no connections.
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.value.read())
            .finish()
    }
}

/// A read-only view of a property.
///
/// This provides read access without the ability to modify the underlying value.
/// Useful for exposing properties publicly while keeping the setter private.
pub struct ReadOnlyProperty<'a, T> {
    inner: &'a Property<T>,
}

impl<'a, T> ReadOnlyProperty<'a, T> {
    /// Create a read-only view of a property.
    pub fn new(property: &'a Property<T>) -> Self {
        Self { inner: property }
    }

    /// Access the value through a closure.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.with(f)
    }

    /// The signal emitted after every write to the underlying property.
    pub fn changed(&self) -> &Signal<()> {
        self.inner.changed()
    }
}

impl<T: Clone> ReadOnlyProperty<'_, T> {
    /// Get the current value.
    pub fn get(&self) -> T {
        self.inner.get()
    }
}

static_assertions::assert_impl_all!(Property<Vec<String>>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(prop: &Property<i32>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        prop.changed().connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_property_basic() {
        let prop = Property::new(42);
        assert_eq!(prop.get(), 42);
    }

    #[test]
    fn test_every_write_notifies() {
        let prop = Property::new(10);
        let count = counting(&prop);

        // Same value still counts as a write
        prop.set(10);
        prop.set(20);
        assert_eq!(prop.get(), 20);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_property_set_silent() {
        let prop = Property::new(100);
        let count = counting(&prop);

        prop.set_silent(200);
        assert_eq!(prop.get(), 200);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_property_replace() {
        let prop = Property::new("hello".to_string());
        let old = prop.replace("world".to_string());
        assert_eq!(old, "hello");
        assert_eq!(prop.get(), "world");
    }

    #[test]
    fn test_slot_can_read_during_notification() {
        let prop = Arc::new(Property::new(1));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let prop_clone = prop.clone();
        let seen_clone = seen.clone();
        prop.changed().connect(move |_| {
            seen_clone.lock().push(prop_clone.get());
        });

        prop.set(5);
        prop.replace(6);
        assert_eq!(*seen.lock(), vec![5, 6]);
    }

    #[test]
    fn test_property_with_closure() {
        let prop = Property::new(vec![1, 2, 3]);

        // Use with() to avoid cloning
        let sum: i32 = prop.with(|v| v.iter().sum());
        assert_eq!(sum, 6);
    }

    #[test]
    fn test_read_only_property() {
        let prop = Property::new(42);
        let ro = ReadOnlyProperty::new(&prop);

        assert_eq!(ro.get(), 42);

        // Modify through original
        prop.set_silent(100);
        assert_eq!(ro.get(), 100);
    }

    #[test]
    fn test_clone_does_not_share_connections() {
        let prop = Property::new(1);
        let count = counting(&prop);

        let copy = prop.clone();
        copy.set(2);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(prop.get(), 1);
    }

    #[test]
    fn test_property_default() {
        let prop: Property<i32> = Property::default();
        assert_eq!(prop.get(), 0);

        let prop: Property<String> = Property::default();
        assert_eq!(prop.into_inner(), "");
    }
}
