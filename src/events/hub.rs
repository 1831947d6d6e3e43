// ============================================================================
// ripple - Event Hub
// The four-channel event bundle owned by every container and derived view
// ============================================================================
//
// A hub is exactly four relays: on_add, on_remove, on_update, on_dispose.
// It is generic over the change record C and the update record U, which is
// what collapses the list/dictionary hub families into one type. Containers
// create their hub lazily on first subscription and publish through the
// pub(crate) publish_* methods, which become no-ops once the hub is
// disposed: on_dispose fires at most once, and afterwards no other event on
// the hub may fire.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use crate::core::types::{DictChange, DictUpdate, ListChange, ListUpdate};
use crate::events::relay::{Listener, Relay};
use crate::events::subscription::Subscription;

/// Hub shape for list-like publishers.
pub type ListHub<T> = EventHub<ListChange<T>, ListUpdate<T>>;

/// Hub shape for dictionary-like publishers.
pub type DictHub<K, V> = EventHub<DictChange<K, V>, DictUpdate<K, V>>;

// =============================================================================
// CALLBACK BUNDLE
// =============================================================================

/// Optional callbacks for a hub subscription.
///
/// Only the callbacks supplied are bound; the returned subscription groups
/// them and revokes them together.
///
/// # Example
///
/// ```
/// use ripple::events::HubCallbacks;
/// use ripple::core::types::{ListChange, ListUpdate};
///
/// let callbacks: HubCallbacks<ListChange<i32>, ListUpdate<i32>> = HubCallbacks::new()
///     .on_add(|change: &ListChange<i32>| println!("added {} at {}", change.item, change.index))
///     .on_dispose(|| println!("source gone"));
/// ```
pub struct HubCallbacks<C: 'static, U: 'static> {
    pub(crate) add: Option<Listener<C>>,
    pub(crate) remove: Option<Listener<C>>,
    pub(crate) update: Option<Listener<U>>,
    pub(crate) dispose: Option<Listener<()>>,
}

impl<C: 'static, U: 'static> Default for HubCallbacks<C, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static, U: 'static> HubCallbacks<C, U> {
    pub fn new() -> Self {
        Self {
            add: None,
            remove: None,
            update: None,
            dispose: None,
        }
    }

    pub fn on_add(mut self, f: impl Fn(&C) + 'static) -> Self {
        self.add = Some(Rc::new(f));
        self
    }

    pub fn on_remove(mut self, f: impl Fn(&C) + 'static) -> Self {
        self.remove = Some(Rc::new(f));
        self
    }

    pub fn on_update(mut self, f: impl Fn(&U) + 'static) -> Self {
        self.update = Some(Rc::new(f));
        self
    }

    pub fn on_dispose(mut self, f: impl Fn() + 'static) -> Self {
        self.dispose = Some(Rc::new(move |_: &()| f()));
        self
    }
}

// =============================================================================
// EVENT HUB
// =============================================================================

/// The Add/Remove/Update/Dispose channel bundle of one observable container
/// or derived view.
///
/// Consumers only ever see a hub read-only: they can subscribe and access
/// the raw relays, but publishing and disposal belong to the owning
/// container.
pub struct EventHub<C: 'static, U: 'static> {
    on_add: Relay<C>,
    on_remove: Relay<C>,
    on_update: Relay<U>,
    on_dispose: Relay<()>,
    disposed: Cell<bool>,
}

impl<C: 'static, U: 'static> Default for EventHub<C, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static, U: 'static> EventHub<C, U> {
    pub fn new() -> Self {
        Self {
            on_add: Relay::labeled("on_add"),
            on_remove: Relay::labeled("on_remove"),
            on_update: Relay::labeled("on_update"),
            on_dispose: Relay::labeled("on_dispose"),
            disposed: Cell::new(false),
        }
    }

    // =========================================================================
    // RAW CHANNEL ACCESS
    // =========================================================================

    pub fn on_add(&self) -> &Relay<C> {
        &self.on_add
    }

    pub fn on_remove(&self) -> &Relay<C> {
        &self.on_remove
    }

    pub fn on_update(&self) -> &Relay<U> {
        &self.on_update
    }

    pub fn on_dispose(&self) -> &Relay<()> {
        &self.on_dispose
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    // =========================================================================
    // SUBSCRIBE
    // =========================================================================

    /// Bind the supplied callbacks and return a group subscription over them.
    ///
    /// The subscription owns the callback closures: drop it (or call
    /// `unsubscribe`) and they stop firing.
    pub fn subscribe(&self, callbacks: HubCallbacks<C, U>) -> Subscription {
        let mut children = Vec::new();

        if let Some(listener) = callbacks.add {
            if let Some(sub) = self.on_add.add_listener(&listener) {
                children.push(sub);
            }
        }
        if let Some(listener) = callbacks.remove {
            if let Some(sub) = self.on_remove.add_listener(&listener) {
                children.push(sub);
            }
        }
        if let Some(listener) = callbacks.update {
            if let Some(sub) = self.on_update.add_listener(&listener) {
                children.push(sub);
            }
        }
        if let Some(listener) = callbacks.dispose {
            if let Some(sub) = self.on_dispose.add_listener(&listener) {
                children.push(sub);
            }
        }

        Subscription::group(children)
    }

    // =========================================================================
    // PUBLISH (owning container only)
    // =========================================================================

    pub(crate) fn publish_add(&self, change: &C) {
        if !self.disposed.get() {
            self.on_add.dispatch(change);
        }
    }

    pub(crate) fn publish_remove(&self, change: &C) {
        if !self.disposed.get() {
            self.on_remove.dispatch(change);
        }
    }

    pub(crate) fn publish_update(&self, update: &U) {
        if !self.disposed.get() {
            self.on_update.dispatch(update);
        }
    }

    /// Fire on_dispose exactly once. After this, every publish is a no-op.
    pub(crate) fn publish_dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.on_dispose.dispatch(&());
    }

    /// Release every relay slot. Called by the owner after its state is gone.
    pub(crate) fn clear_all(&self) {
        self.on_add.remove_all();
        self.on_remove.remove_all();
        self.on_update.remove_all();
        self.on_dispose.remove_all();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn subscribe_binds_only_supplied_callbacks() {
        let hub: ListHub<i32> = EventHub::new();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_add = seen.clone();
        let seen_update = seen.clone();

        let _sub = hub.subscribe(
            HubCallbacks::new()
                .on_add(move |c: &ListChange<i32>| seen_add.borrow_mut().push(("add", c.item)))
                .on_update(move |u: &ListUpdate<i32>| {
                    seen_update.borrow_mut().push(("update", u.new))
                }),
        );

        assert_eq!(hub.on_add().live_count(), 1);
        assert_eq!(hub.on_remove().live_count(), 0);
        assert_eq!(hub.on_update().live_count(), 1);
        assert_eq!(hub.on_dispose().live_count(), 0);

        hub.publish_add(&ListChange { index: 0, item: 7 });
        hub.publish_remove(&ListChange { index: 0, item: 7 });
        hub.publish_update(&ListUpdate {
            index: 0,
            old: 7,
            new: 8,
        });

        assert_eq!(*seen.borrow(), vec![("add", 7), ("update", 8)]);
    }

    #[test]
    fn unsubscribe_revokes_the_whole_group() {
        let hub: ListHub<i32> = EventHub::new();
        let calls = Rc::new(Cell::new(0));

        let calls_add = calls.clone();
        let calls_remove = calls.clone();
        let mut sub = hub.subscribe(
            HubCallbacks::new()
                .on_add(move |_: &ListChange<i32>| calls_add.set(calls_add.get() + 1))
                .on_remove(move |_: &ListChange<i32>| calls_remove.set(calls_remove.get() + 1)),
        );

        hub.publish_add(&ListChange { index: 0, item: 1 });
        assert_eq!(calls.get(), 1);

        sub.unsubscribe();
        hub.publish_add(&ListChange { index: 1, item: 2 });
        hub.publish_remove(&ListChange { index: 0, item: 1 });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn dispose_fires_once_then_silences_the_hub() {
        let hub: ListHub<i32> = EventHub::new();
        let dispose_count = Rc::new(Cell::new(0));
        let add_count = Rc::new(Cell::new(0));

        let dc = dispose_count.clone();
        let ac = add_count.clone();
        let _sub = hub.subscribe(
            HubCallbacks::new()
                .on_dispose(move || dc.set(dc.get() + 1))
                .on_add(move |_: &ListChange<i32>| ac.set(ac.get() + 1)),
        );

        hub.publish_dispose();
        hub.publish_dispose();
        assert_eq!(dispose_count.get(), 1, "on_dispose fires at most once");

        hub.publish_add(&ListChange { index: 0, item: 1 });
        assert_eq!(add_count.get(), 0, "no event may fire after dispose");
        assert!(hub.is_disposed());
    }

    #[test]
    fn dropping_the_subscription_releases_all_callbacks() {
        let hub: DictHub<u32, String> = EventHub::new();
        let calls = Rc::new(Cell::new(0));

        {
            let calls_clone = calls.clone();
            let _sub = hub.subscribe(HubCallbacks::new().on_add(
                move |_: &DictChange<u32, String>| calls_clone.set(calls_clone.get() + 1),
            ));
        }

        hub.publish_add(&DictChange {
            key: 1,
            value: "x".to_string(),
        });
        assert_eq!(calls.get(), 0);
        assert_eq!(hub.on_add().live_count(), 0);
    }
}
