// ============================================================================
// ripple - ObservedCount
// A live scalar tracking a container's length
// ============================================================================
//
// Counts carry no add/remove channel of their own; a scalar only ever
// changes value. So instead of a full hub this view owns two bare relays:
// on_update with old/new lengths, and on_dispose. The delta arithmetic
// rides the source's add and remove events; updates leave length untouched
// and are not wired at all.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::collections::dict::ObservableDictionary;
use crate::collections::list::ObservableList;
use crate::core::types::CountUpdate;
use crate::events::hub::{EventHub, HubCallbacks};
use crate::events::relay::{Listener, Relay};
use crate::events::subscription::Subscription;
use crate::views::filter::FilteredDict;
use crate::views::group_by::GroupedList;
use crate::views::map_list::MappedList;
use crate::views::map_values::MappedValuesDict;
use crate::views::projection::{DictProjection, ListProjection};
use crate::views::rekey::RekeyedDict;

// =============================================================================
// OBSERVED COUNT
// =============================================================================

pub(crate) struct CountInner {
    count: Cell<usize>,
    on_update: Relay<CountUpdate>,
    on_dispose: Relay<()>,
    upstream: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
}

impl CountInner {
    pub(crate) fn adjust(&self, delta: isize) {
        let old = self.count.get();
        let new = old.saturating_add_signed(delta);
        self.count.set(new);
        self.on_update.dispatch(&CountUpdate { old, new });
    }
}

/// A live count of a container's entries.
///
/// Created through [`crate::views::count`] over either container. Reads are
/// O(1) against the tracked scalar; every change announces the old and new
/// lengths.
///
/// # Example
///
/// ```
/// use ripple::collections::ObservableList;
/// use ripple::views;
///
/// let items = ObservableList::from_vec(vec![1, 2]);
/// let total = views::count(&items);
///
/// items.push(3);
/// assert_eq!(total.get(), 3);
/// ```
pub struct ObservedCount {
    inner: Rc<CountInner>,
}

impl Clone for ObservedCount {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl ObservedCount {
    fn with_initial(count: usize) -> Self {
        Self {
            inner: Rc::new(CountInner {
                count: Cell::new(count),
                on_update: Relay::labeled("count.on_update"),
                on_dispose: Relay::labeled("count.on_dispose"),
                upstream: RefCell::new(None),
                disposed: Cell::new(false),
            }),
        }
    }

    /// The current count.
    pub fn get(&self) -> usize {
        self.inner.count.get()
    }

    /// The update relay, dispatched with old/new on every length change.
    pub fn on_update(&self) -> &Relay<CountUpdate> {
        &self.inner.on_update
    }

    /// The dispose relay, dispatched once when the count view winds down.
    pub fn on_dispose(&self) -> &Relay<()> {
        &self.inner.on_dispose
    }

    /// Bind a callback to length changes. Convenience over
    /// [`on_update`](Self::on_update).
    pub fn subscribe(&self, f: impl Fn(&CountUpdate) + 'static) -> Subscription {
        let listener: Listener<CountUpdate> = Rc::new(f);
        self.inner
            .on_update
            .add_listener(&listener)
            .unwrap_or_else(Subscription::released)
    }

    pub(crate) fn downgrade(&self) -> Weak<CountInner> {
        Rc::downgrade(&self.inner)
    }

    /// Dispose the view: fire `on_dispose`, zero the scalar without an
    /// update event, detach from the source, clear both relays. Idempotent;
    /// also runs when the source disposes.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.on_dispose.dispatch(&());
        self.inner.count.set(0);
        if let Some(mut sub) = self.inner.upstream.borrow_mut().take() {
            sub.unsubscribe();
        }
        self.inner.on_update.remove_all();
        self.inner.on_dispose.remove_all();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

// =============================================================================
// COUNTABLE SOURCES
// =============================================================================

/// Anything whose length an [`ObservedCount`] can track: both observable
/// containers and every list- or dict-shaped view.
///
/// The wiring half needs access to the count's internals, so foreign
/// implementations cannot do anything useful with it.
pub trait Countable {
    fn current_len(&self) -> usize;
    fn wire(&self, counter: &ObservedCount) -> Subscription;
}

/// Ride a hub's add/remove/dispose channels with the count's delta
/// arithmetic. The payload types are irrelevant; only arrivals, departures
/// and the wind-down matter.
fn wire_hub<C: 'static, U: 'static>(hub: &EventHub<C, U>, counter: &ObservedCount) -> Subscription {
    let weak_add = counter.downgrade();
    let weak_remove = weak_add.clone();
    let weak_dispose = weak_add.clone();
    hub.subscribe(
        HubCallbacks::new()
            .on_add(move |_: &C| {
                if let Some(inner) = weak_add.upgrade() {
                    inner.adjust(1);
                }
            })
            .on_remove(move |_: &C| {
                if let Some(inner) = weak_remove.upgrade() {
                    inner.adjust(-1);
                }
            })
            .on_dispose(move || {
                if let Some(inner) = weak_dispose.upgrade() {
                    ObservedCount {
                        inner,
                    }
                    .dispose();
                }
            }),
    )
}

impl<T: Clone + 'static> Countable for ObservableList<T> {
    fn current_len(&self) -> usize {
        self.len()
    }

    fn wire(&self, counter: &ObservedCount) -> Subscription {
        wire_hub(&self.events(), counter)
    }
}

impl<K, V> Countable for ObservableDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn wire(&self, counter: &ObservedCount) -> Subscription {
        wire_hub(&self.events(), counter)
    }
}

impl<T: Clone + 'static, U: Clone + 'static> Countable for MappedList<T, U> {
    fn current_len(&self) -> usize {
        self.len()
    }

    fn wire(&self, counter: &ObservedCount) -> Subscription {
        wire_hub(&self.events(), counter)
    }
}

impl<T: Clone + 'static, U: Clone + 'static> Countable for ListProjection<T, U> {
    fn current_len(&self) -> usize {
        self.len()
    }

    fn wire(&self, counter: &ObservedCount) -> Subscription {
        wire_hub(&self.events(), counter)
    }
}

impl<K, V, TOut> Countable for DictProjection<K, V, TOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
    TOut: Clone + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn wire(&self, counter: &ObservedCount) -> Subscription {
        wire_hub(&self.events(), counter)
    }
}

impl<KIn, KOut, V> Countable for RekeyedDict<KIn, KOut, V>
where
    KIn: Eq + Hash + Clone + Debug + 'static,
    KOut: Eq + Hash + Clone + Debug + 'static,
    V: Clone + PartialEq + Debug + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn wire(&self, counter: &ObservedCount) -> Subscription {
        wire_hub(&self.events(), counter)
    }
}

impl<K, VIn, VOut> Countable for MappedValuesDict<K, VIn, VOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    VIn: Clone + 'static,
    VOut: Clone + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn wire(&self, counter: &ObservedCount) -> Subscription {
        wire_hub(&self.events(), counter)
    }
}

impl<K, V> Countable for FilteredDict<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    fn current_len(&self) -> usize {
        self.len()
    }

    fn wire(&self, counter: &ObservedCount) -> Subscription {
        wire_hub(&self.events(), counter)
    }
}

impl<G, T> Countable for GroupedList<G, T>
where
    G: Eq + Hash + Clone + Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    /// Counts groups, not members.
    fn current_len(&self) -> usize {
        self.len()
    }

    fn wire(&self, counter: &ObservedCount) -> Subscription {
        wire_hub(&self.events(), counter)
    }
}

/// A live count over any countable source, container or view.
pub fn count<S: Countable>(source: &S) -> ObservedCount {
    let counter = ObservedCount::with_initial(source.current_len());
    let sub = source.wire(&counter);
    *counter.inner.upstream.borrow_mut() = Some(sub);
    counter
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::ObservableDictionary;

    #[test]
    fn tracks_list_length_through_mutations() {
        let list = ObservableList::from_vec(vec![1, 2]);
        let total = count(&list);
        assert_eq!(total.get(), 2);

        list.push(3);
        assert_eq!(total.get(), 3);

        list.remove_at(0);
        assert_eq!(total.get(), 2);

        list.set(0, 9); // length unchanged
        assert_eq!(total.get(), 2);

        list.clear();
        assert_eq!(total.get(), 0);
    }

    #[test]
    fn announces_old_and_new_on_every_change() {
        let list: ObservableList<i32> = ObservableList::new();
        let total = count(&list);

        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        let _sub = total.subscribe(move |u: &CountUpdate| {
            log_clone.borrow_mut().push((u.old, u.new));
        });

        list.push(1);
        list.push(2);
        list.remove_at(0);
        assert_eq!(*log.borrow(), vec![(0, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn tracks_dictionary_length() {
        let dict: ObservableDictionary<&str, i32> = ObservableDictionary::new();
        let total = count(&dict);

        dict.add("a", 1);
        dict.add("b", 2);
        dict.upsert("a", 10); // update, not a length change
        assert_eq!(total.get(), 2);

        dict.remove(&"a");
        assert_eq!(total.get(), 1);
    }

    #[test]
    fn source_dispose_zeroes_without_an_update_event() {
        let list = ObservableList::from_vec(vec![1, 2, 3]);
        let total = count(&list);

        let updates = Rc::new(Cell::new(0));
        let disposed = Rc::new(Cell::new(false));

        let updates_clone = updates.clone();
        let _update_sub = total.subscribe(move |_| updates_clone.set(updates_clone.get() + 1));

        let disposed_clone = disposed.clone();
        let dispose_listener: Listener<()> = Rc::new(move |_| disposed_clone.set(true));
        let _dispose_sub = total.on_dispose().add_listener(&dispose_listener).unwrap();

        list.dispose();
        assert!(disposed.get());
        assert!(total.is_disposed());
        assert_eq!(total.get(), 0);
        assert_eq!(updates.get(), 0, "winding down is not a length change");
    }

    #[test]
    fn counts_a_derived_view() {
        let dict: ObservableDictionary<&str, i32> = ObservableDictionary::new();
        let evens = FilteredDict::new(&dict, |_, value| value % 2 == 0);
        let total = count(&evens);

        dict.add("a", 2);
        dict.add("b", 3);
        assert_eq!(total.get(), 1, "only admitted entries are counted");

        dict.upsert("b", 4); // enters the filtered view
        assert_eq!(total.get(), 2);

        dict.dispose();
        assert!(total.is_disposed());
        assert_eq!(total.get(), 0);
    }

    #[test]
    fn dispose_is_idempotent() {
        let list: ObservableList<i32> = ObservableList::new();
        let total = count(&list);
        total.dispose();
        total.dispose();
        assert!(total.is_disposed());

        list.push(1);
        assert_eq!(total.get(), 0, "detached from the source");
    }
}
