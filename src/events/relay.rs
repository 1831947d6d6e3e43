// ============================================================================
// ripple - Relay
// Weak-referencing multicast dispatcher, one per event channel
// ============================================================================
//
// A relay holds an array of slots, each with a weak reference to a listener
// closure and a monotonically-assigned slot id. The strong reference lives
// in the Subscription returned by add_listener, so dropping the subscription
// releases the listener and the relay sweeps the dead slot lazily on the
// next dispatch. The id doubles as a generation check: a slot removed
// mid-dispatch is never invoked afterwards in the same pass, even if the
// listener itself is still alive.
//
// Relays never invoke a dead listener, and live_count always reflects the
// slots that would actually fire.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use crate::core::constants::RELAY_INITIAL_SLOTS;
use crate::core::error::Violation;
use crate::core::report;
use crate::events::subscription::Subscription;

// =============================================================================
// LISTENER TYPE
// =============================================================================

/// A registered listener. Payloads are passed by reference.
pub type Listener<E> = Rc<dyn Fn(&E)>;

/// Wrap a closure as a [`Listener`].
///
/// Keeping the returned `Rc` (or the subscription that owns it) alive is what
/// keeps the listener registered; the relay itself only holds a weak slot.
pub fn listener<E>(f: impl Fn(&E) + 'static) -> Listener<E> {
    Rc::new(f)
}

// =============================================================================
// TYPE-ERASED RELAY ACCESS
// =============================================================================

/// Slot removal without knowing the payload type.
///
/// Subscriptions over different payload types are grouped together (a hub
/// subscription spans four relays), so revocation goes through this erased
/// interface, the same way the reactive-graph traits erase their value types.
pub(crate) trait AnyRelay {
    /// Remove the slot with the given id. Returns false if it is already gone.
    fn remove_slot(&self, id: u64) -> bool;
}

// =============================================================================
// RELAY
// =============================================================================

struct Slot<E: 'static> {
    id: u64,
    listener: Weak<dyn Fn(&E)>,
}

pub(crate) struct RelayInner<E: 'static> {
    /// Channel label, used only in reports ("on_add", "on_update", ...).
    label: &'static str,

    /// Slot storage. Never borrowed across a listener invocation.
    slots: RefCell<Vec<Slot<E>>>,

    /// Next slot id to hand out.
    next_id: Cell<u64>,
}

/// A multicast event channel.
///
/// Cloning a `Relay` clones the handle; both handles address the same slots.
///
/// # Example
///
/// ```
/// use ripple::events::{listener, Relay};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let relay: Relay<i32> = Relay::new();
/// let seen = Rc::new(Cell::new(0));
///
/// let seen_in = seen.clone();
/// let l = listener(move |n: &i32| seen_in.set(seen_in.get() + *n));
/// let _sub = relay.add_listener(&l).unwrap();
///
/// relay.dispatch(&5);
/// assert_eq!(seen.get(), 5);
/// ```
pub struct Relay<E: 'static> {
    inner: Rc<RelayInner<E>>,
}

impl<E: 'static> Clone for Relay<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: 'static> Default for Relay<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Relay<E> {
    /// Create an unlabeled relay.
    pub fn new() -> Self {
        Self::labeled("relay")
    }

    /// Create a relay whose label shows up in violation reports.
    pub fn labeled(label: &'static str) -> Self {
        Self {
            inner: Rc::new(RelayInner {
                label,
                slots: RefCell::new(Vec::with_capacity(RELAY_INITIAL_SLOTS)),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Register a listener.
    ///
    /// Returns `None` if a listener with the same identity is already
    /// registered (reported, count unchanged) - callers must check. The
    /// returned subscription owns the listener's strong reference; dropping
    /// it without unsubscribing leaves a dead slot for the next dispatch to
    /// sweep.
    pub fn add_listener(&self, listener: &Listener<E>) -> Option<Subscription> {
        if self.contains(listener) {
            report::invariant(&Violation::DuplicateListener {
                op: self.inner.label,
            });
            return None;
        }

        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        {
            let mut slots = self.inner.slots.borrow_mut();

            // Grow by doubling, compacting dead slots in the same pass.
            if slots.len() == slots.capacity() {
                slots.retain(|slot| slot.listener.strong_count() > 0);
                if slots.len() == slots.capacity() {
                    let grow_by = slots.capacity().max(RELAY_INITIAL_SLOTS);
                    slots.reserve(grow_by);
                }
            }

            slots.push(Slot {
                id,
                listener: Rc::downgrade(listener),
            });
        }

        Some(Subscription::binding(
            self.downgrade(),
            id,
            Box::new(listener.clone()),
        ))
    }

    /// Remove a listener by identity. Returns false if it was not registered.
    pub fn remove_listener(&self, listener: &Listener<E>) -> bool {
        let target = Rc::as_ptr(listener) as *const ();
        let mut found = false;
        let mut slots = self.inner.slots.borrow_mut();
        slots.retain(|slot| match slot.listener.upgrade() {
            Some(live) => {
                if Rc::as_ptr(&live) as *const () == target {
                    found = true;
                    false
                } else {
                    true
                }
            }
            // Sweep dead slots while we are here; they do not count as a match.
            None => false,
        });
        found
    }

    /// Whether a listener with this identity is currently registered and alive.
    pub fn contains(&self, listener: &Listener<E>) -> bool {
        let target = Rc::as_ptr(listener) as *const ();
        self.inner.slots.borrow().iter().any(|slot| {
            slot.listener
                .upgrade()
                .is_some_and(|live| Rc::as_ptr(&live) as *const () == target)
        })
    }

    /// Invoke every live listener with the event.
    ///
    /// The slot list is snapshotted first, so listeners may add or remove
    /// listeners (including themselves) mid-dispatch without skipping or
    /// double-invoking a third listener. Listeners added during the pass are
    /// not invoked until the next dispatch. Dead slots are evicted in the
    /// same pass. A panicking listener is reported and the remaining
    /// listeners still run.
    pub fn dispatch(&self, event: &E) {
        let snapshot: Vec<(u64, Weak<dyn Fn(&E)>)> = self
            .inner
            .slots
            .borrow()
            .iter()
            .map(|slot| (slot.id, slot.listener.clone()))
            .collect();

        for (id, weak) in snapshot {
            let Some(listener) = weak.upgrade() else {
                continue;
            };

            // Generation check: skip slots unsubscribed earlier in this pass.
            let still_registered = self
                .inner
                .slots
                .borrow()
                .iter()
                .any(|slot| slot.id == id);
            if !still_registered {
                continue;
            }

            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                report::listener_panic(self.inner.label);
            }
        }

        // Lazy sweep: correct the live count for listeners that died.
        self.inner
            .slots
            .borrow_mut()
            .retain(|slot| slot.listener.strong_count() > 0);
    }

    /// Clear all slots. Capacity is kept.
    pub fn remove_all(&self) {
        self.inner.slots.borrow_mut().clear();
    }

    /// Number of live slots.
    pub fn live_count(&self) -> usize {
        self.inner
            .slots
            .borrow()
            .iter()
            .filter(|slot| slot.listener.strong_count() > 0)
            .count()
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn AnyRelay> {
        Rc::downgrade(&self.inner) as Weak<dyn AnyRelay>
    }
}

impl<E: 'static> AnyRelay for RelayInner<E> {
    fn remove_slot(&self, id: u64) -> bool {
        let mut slots = self.slots.borrow_mut();
        let before = slots.len();
        slots.retain(|slot| slot.id != id);
        slots.len() < before
    }
}

// =============================================================================
// TESTS
// =============================================================================
