// ============================================================================
// ripple - ObservableList
// A mutable, owning list that publishes every mutation through its hub
// ============================================================================

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::Rc;

use crate::core::report;
use crate::core::types::{ListChange, ListUpdate};
use crate::events::hub::{EventHub, HubCallbacks, ListHub};
use crate::events::subscription::Subscription;
use crate::views::map_list::MappedList;
use crate::views::projection::ListProjection;

// =============================================================================
// OBSERVABLE LIST
// =============================================================================

pub(crate) struct ListInner<T: Clone + 'static> {
    /// The owned elements. Never borrowed across an event dispatch.
    data: RefCell<Vec<T>>,

    /// Event hub, created lazily on first subscription.
    hub: OnceCell<Rc<ListHub<T>>>,

    disposed: Cell<bool>,
}

/// An observable list: mutate it, and every mutation is published as a
/// structured event to whoever subscribed.
///
/// `ObservableList` is a cloneable handle; clones share the same underlying
/// store. All mutation goes through `&self`, so a handle can be captured by
/// listeners and derived views freely.
///
/// # Example
///
/// ```
/// use ripple::collections::ObservableList;
/// use ripple::events::HubCallbacks;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let items: ObservableList<i32> = ObservableList::new();
///
/// let added = Rc::new(RefCell::new(Vec::new()));
/// let added_in = added.clone();
/// let _sub = items.subscribe(
///     HubCallbacks::new().on_add(move |change: &ripple::core::types::ListChange<i32>| added_in.borrow_mut().push(change.item)),
/// );
///
/// items.push(1);
/// items.push(2);
/// assert_eq!(*added.borrow(), vec![1, 2]);
/// ```
pub struct ObservableList<T: Clone + 'static> {
    inner: Rc<ListInner<T>>,
}

impl<T: Clone + 'static> Clone for ObservableList<T> {
    /// Handle clone: both handles address the same store and hub.
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> ObservableList<T> {
    /// Create a new empty observable list.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create an observable list seeded from an existing vec.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                data: RefCell::new(data),
                hub: OnceCell::new(),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Create an observable list from an iterator.
    pub fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.inner.data.borrow().len()
    }

    /// True if the list contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone out the element at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.data.borrow().get(index).cloned()
    }

    /// Run a closure over the elements without cloning.
    ///
    /// The borrow is released before the closure could observe any further
    /// events, so do not mutate this list from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.data.borrow())
    }

    /// Clone the contents into a plain vec.
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.data.borrow().clone()
    }

    /// Position of the first element equal to `item`.
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.inner.data.borrow().iter().position(|x| x == item)
    }

    /// Whether any element equals `item`.
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(item).is_some()
    }

    // =========================================================================
    // MUTATE
    // =========================================================================

    /// Append an element. Fires `on_add` with the element's new index.
    pub fn push(&self, item: T) {
        if self.inner.disposed.get() {
            report::disposed_op("list.push");
            return;
        }
        let index = {
            let mut data = self.inner.data.borrow_mut();
            data.push(item.clone());
            data.len() - 1
        };
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_add(&ListChange { index, item });
        }
    }

    /// Insert an element at `index`, shifting later elements right.
    /// Fires `on_add` with `index`.
    ///
    /// # Panics
    /// Panics if `index > len` (caller misuse).
    pub fn insert(&self, index: usize, item: T) {
        if self.inner.disposed.get() {
            report::disposed_op("list.insert");
            return;
        }
        self.inner.data.borrow_mut().insert(index, item.clone());
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_add(&ListChange { index, item });
        }
    }

    /// Remove and return the element at `index`, shifting later elements
    /// left. Fires `on_remove` with the index the element occupied.
    ///
    /// # Panics
    /// Panics if `index >= len` (caller misuse). A disposed list is empty,
    /// so every index panics; [`try_remove_at`](Self::try_remove_at) is the
    /// checked form.
    pub fn remove_at(&self, index: usize) -> T {
        let item = self.inner.data.borrow_mut().remove(index);
        if !self.inner.disposed.get() {
            if let Some(hub) = self.inner.hub.get() {
                hub.publish_remove(&ListChange {
                    index,
                    item: item.clone(),
                });
            }
        }
        item
    }

    /// Remove and return the element at `index` if it exists.
    pub fn try_remove_at(&self, index: usize) -> Option<T> {
        if index < self.len() {
            Some(self.remove_at(index))
        } else {
            None
        }
    }

    /// Remove the first element equal to `item`.
    ///
    /// Linear scan by equality: two distinct equal-valued elements are
    /// indistinguishable here, and the first match wins. Fires `on_remove`
    /// with the found index; returns false without firing when absent.
    pub fn remove(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(item) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Replace the element at `index`, returning the old value.
    /// Fires `on_update` with the old and new values.
    ///
    /// # Panics
    /// Panics if `index >= len` (caller misuse, indexer semantics). A
    /// disposed list is empty, so every index panics.
    pub fn set(&self, index: usize, item: T) -> T {
        let old = {
            let mut data = self.inner.data.borrow_mut();
            std::mem::replace(&mut data[index], item.clone())
        };
        if !self.inner.disposed.get() {
            if let Some(hub) = self.inner.hub.get() {
                hub.publish_update(&ListUpdate {
                    index,
                    old: old.clone(),
                    new: item,
                });
            }
        }
        old
    }

    /// Alias for [`set`](Self::set).
    pub fn update(&self, index: usize, item: T) -> T {
        self.set(index, item)
    }

    /// Move the element at `old_index` to `new_index`.
    ///
    /// Published as a remove followed by an add, so derived views stay
    /// index-consistent without special move handling. `new_index` addresses
    /// the list as it stands after the removal.
    ///
    /// # Panics
    /// Panics if either index is out of range (caller misuse).
    pub fn move_item(&self, old_index: usize, new_index: usize) {
        if self.inner.disposed.get() {
            report::disposed_op("list.move_item");
            return;
        }
        if old_index == new_index {
            // Still validate, like the indexer would.
            assert!(old_index < self.len(), "move_item index out of range");
            return;
        }

        let item = self.inner.data.borrow_mut().remove(old_index);
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_remove(&ListChange {
                index: old_index,
                item: item.clone(),
            });
        }

        self.inner.data.borrow_mut().insert(new_index, item.clone());
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_add(&ListChange {
                index: new_index,
                item,
            });
        }
    }

    /// Remove every element, firing `on_remove` once per element, highest
    /// index first, so the indices of not-yet-removed elements stay valid
    /// throughout.
    pub fn clear(&self) {
        if self.inner.disposed.get() {
            report::disposed_op("list.clear");
            return;
        }
        loop {
            let popped = self.inner.data.borrow_mut().pop();
            let Some(item) = popped else { break };
            let index = self.inner.data.borrow().len();
            if let Some(hub) = self.inner.hub.get() {
                hub.publish_remove(&ListChange { index, item });
            }
        }
    }

    // =========================================================================
    // DERIVATION ROOTS
    // =========================================================================

    /// A non-materializing projection over this list: computes `f` per read
    /// and re-emits transformed events.
    pub fn project<U: Clone + 'static>(
        &self,
        f: impl Fn(&T) -> U + 'static,
    ) -> ListProjection<T, U> {
        ListProjection::new(self, f)
    }

    /// A plain read-only mirror of this list, kept live through events.
    pub fn mirror(&self) -> MappedList<T, T> {
        MappedList::new(self, |item| item.clone())
    }

    // =========================================================================
    // EVENTS & LIFECYCLE
    // =========================================================================

    /// The event hub, created lazily on first use.
    pub fn events(&self) -> Rc<ListHub<T>> {
        self.inner
            .hub
            .get_or_init(|| Rc::new(EventHub::new()))
            .clone()
    }

    /// Subscribe the supplied callbacks to this list's hub.
    pub fn subscribe(
        &self,
        callbacks: HubCallbacks<ListChange<T>, ListUpdate<T>>,
    ) -> Subscription {
        self.events().subscribe(callbacks)
    }

    /// Dispose the list: fire `on_dispose` (listeners can still read the
    /// contents), release the contents, then clear every relay slot.
    /// Idempotent; cascades to derived views subscribed to `on_dispose`.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_dispose();
        }
        self.inner.data.borrow_mut().clear();
        if let Some(hub) = self.inner.hub.get() {
            hub.clear_all();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableList")
            .field("data", &*self.inner.data.borrow())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn record_events<T: Clone + 'static>(
        list: &ObservableList<T>,
    ) -> (Rc<RefCell<Vec<String>>>, Subscription)
    where
        T: std::fmt::Debug,
    {
        let log = Rc::new(RefCell::new(Vec::new()));
        let add_log = log.clone();
        let remove_log = log.clone();
        let update_log = log.clone();
        let dispose_log = log.clone();
        let sub = list.subscribe(
            HubCallbacks::new()
                .on_add(move |c: &ListChange<T>| {
                    add_log.borrow_mut().push(format!("add {} {:?}", c.index, c.item))
                })
                .on_remove(move |c: &ListChange<T>| {
                    remove_log
                        .borrow_mut()
                        .push(format!("remove {} {:?}", c.index, c.item))
                })
                .on_update(move |u: &ListUpdate<T>| {
                    update_log
                        .borrow_mut()
                        .push(format!("update {} {:?} {:?}", u.index, u.old, u.new))
                })
                .on_dispose(move || dispose_log.borrow_mut().push("dispose".to_string())),
        );
        (log, sub)
    }

    #[test]
    fn push_and_insert_fire_add_with_post_mutation_index() {
        let list = ObservableList::new();
        let (log, _sub) = record_events(&list);

        list.push(10);
        list.push(30);
        list.insert(1, 20);

        assert_eq!(list.to_vec(), vec![10, 20, 30]);
        assert_eq!(
            *log.borrow(),
            vec!["add 0 10", "add 1 30", "add 1 20"]
        );
    }

    #[test]
    fn remove_at_fires_with_pre_removal_index() {
        let list = ObservableList::from_vec(vec![1, 2, 3]);
        let (log, _sub) = record_events(&list);

        let removed = list.remove_at(1);
        assert_eq!(removed, 2);
        assert_eq!(list.to_vec(), vec![1, 3]);
        assert_eq!(*log.borrow(), vec!["remove 1 2"]);
    }

    #[test]
    fn remove_by_equality_takes_first_match() {
        let list = ObservableList::from_vec(vec!["a", "b", "a"]);
        let (log, _sub) = record_events(&list);

        assert!(list.remove(&"a"));
        assert_eq!(list.to_vec(), vec!["b", "a"]);

        assert!(!list.remove(&"z"), "absent item returns false");
        assert_eq!(*log.borrow(), vec!["remove 0 \"a\""], "no event for absent item");
    }

    #[test]
    fn set_fires_update_with_old_and_new() {
        let list = ObservableList::from_vec(vec![1, 2, 3]);
        let (log, _sub) = record_events(&list);

        let old = list.set(1, 20);
        assert_eq!(old, 2);
        assert_eq!(*log.borrow(), vec!["update 1 2 20"]);
    }

    #[test]
    fn move_item_publishes_remove_then_add() {
        let list = ObservableList::from_vec(vec![1, 2, 3]);
        let (log, _sub) = record_events(&list);

        list.move_item(0, 2);
        assert_eq!(list.to_vec(), vec![2, 3, 1]);
        assert_eq!(*log.borrow(), vec!["remove 0 1", "add 2 1"]);
    }

    #[test]
    fn clear_removes_highest_index_first() {
        let list = ObservableList::from_vec(vec![1, 2, 3]);
        let (log, _sub) = record_events(&list);

        list.clear();
        assert!(list.is_empty());
        assert_eq!(
            *log.borrow(),
            vec!["remove 2 3", "remove 1 2", "remove 0 1"]
        );
    }

    #[test]
    fn listener_can_read_source_during_clear() {
        // Indices of not-yet-removed elements stay valid during iteration.
        let list = ObservableList::from_vec(vec![1, 2, 3]);
        let list_reader = list.clone();
        let lens = Rc::new(RefCell::new(Vec::new()));
        let lens_clone = lens.clone();

        let _sub = list.subscribe(HubCallbacks::new().on_remove(move |c: &ListChange<i32>| {
            // After removing index i, exactly i elements remain.
            lens_clone.borrow_mut().push((c.index, list_reader.len()));
        }));

        list.clear();
        assert_eq!(*lens.borrow(), vec![(2, 2), (1, 1), (0, 0)]);
    }

    #[test]
    fn dispose_fires_before_contents_are_released() {
        let list = ObservableList::from_vec(vec![1, 2, 3]);
        let list_reader = list.clone();
        let seen_len = Rc::new(Cell::new(usize::MAX));
        let seen_clone = seen_len.clone();

        let _sub = list.subscribe(
            HubCallbacks::new().on_dispose(move || seen_clone.set(list_reader.len())),
        );

        list.dispose();
        assert_eq!(seen_len.get(), 3, "listeners react before state is gone");
        assert_eq!(list.len(), 0);
        assert!(list.is_disposed());
    }

    #[test]
    fn dispose_is_idempotent_and_silences_mutations() {
        let list = ObservableList::from_vec(vec![1]);
        let (log, _sub) = record_events(&list);

        list.dispose();
        list.dispose(); // no double-fire, no panic

        list.push(2);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(*log.borrow(), vec!["dispose"]);
    }

    #[test]
    fn disposed_list_indexers_behave_like_an_empty_list() {
        let list = ObservableList::from_vec(vec![1, 2]);
        let (log, _sub) = record_events(&list);
        list.dispose();

        // Value-returning indexers keep their empty-list semantics; the
        // checked and equality forms degrade to quiet misses.
        assert_eq!(list.try_remove_at(0), None);
        assert!(!list.remove(&1));
        assert_eq!(*log.borrow(), vec!["dispose"], "no events after dispose");
    }

    #[test]
    #[should_panic]
    fn set_on_a_disposed_list_panics_out_of_range() {
        let list = ObservableList::from_vec(vec![1]);
        list.dispose();
        list.set(0, 2);
    }

    #[test]
    #[should_panic]
    fn remove_at_on_a_disposed_list_panics_out_of_range() {
        let list = ObservableList::from_vec(vec![1]);
        list.dispose();
        list.remove_at(0);
    }

    #[test]
    fn events_before_first_subscription_are_not_materialized() {
        // The hub is created lazily; mutating without subscribers is fine.
        let list = ObservableList::new();
        list.push(1);
        list.remove_at(0);
        assert!(list.is_empty());
    }

    #[test]
    fn handle_clones_share_the_store() {
        let a = ObservableList::new();
        let b = a.clone();
        a.push(1);
        assert_eq!(b.to_vec(), vec![1]);
    }
}
