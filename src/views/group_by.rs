// ============================================================================
// ripple - GroupedList
// Materialized group-by view over an observable list
// ============================================================================
//
// Partitions the source's elements into buckets keyed by a grouping
// function. Each bucket is itself an ObservableList, so consumers can
// subscribe at two granularities: the view's own hub announces groups
// appearing and vanishing, and every bucket announces its own membership.
//
// A bucket exists exactly while it has members. Updates migrate uniformly:
// remove the old element from its bucket, add the new one to its bucket,
// even when both land in the same group.
// ============================================================================

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::collections::list::ObservableList;
use crate::core::error::Violation;
use crate::core::report;
use crate::core::types::{DictChange, DictUpdate, ListChange, ListUpdate};
use crate::events::hub::{DictHub, EventHub, HubCallbacks};
use crate::events::subscription::Subscription;
use crate::views::source::ListSource;

// =============================================================================
// GROUPED LIST
// =============================================================================

struct GroupedListInner<G, T>
where
    G: Eq + Hash + Clone + Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    source: Rc<dyn ListSource<T>>,
    group: Rc<dyn Fn(&T) -> G>,
    groups: RefCell<HashMap<G, ObservableList<T>>>,
    hub: OnceCell<Rc<DictHub<G, ObservableList<T>>>>,
    upstream: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
}

/// A live partition of an [`ObservableList`] into per-key buckets.
///
/// Created through [`crate::views::group_by`].
///
/// # Example
///
/// ```
/// use ripple::collections::ObservableList;
/// use ripple::views;
///
/// let words = ObservableList::from_vec(vec!["apple", "avocado", "banana"]);
/// let by_initial = views::group_by(&words, |word| word.chars().next().unwrap());
///
/// assert_eq!(by_initial.len(), 2);
/// assert_eq!(by_initial.group(&'a').unwrap().len(), 2);
///
/// words.remove(&"banana");
/// assert!(by_initial.group(&'b').is_none(), "empty buckets vanish");
/// ```
pub struct GroupedList<G, T>
where
    G: Eq + Hash + Clone + Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    inner: Rc<GroupedListInner<G, T>>,
}

impl<G, T> Clone for GroupedList<G, T>
where
    G: Eq + Hash + Clone + Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<G, T> GroupedList<G, T>
where
    G: Eq + Hash + Clone + Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    pub(crate) fn new<S>(source: &S, group: impl Fn(&T) -> G + 'static) -> Self
    where
        S: ListSource<T> + Clone + 'static,
    {
        let group: Rc<dyn Fn(&T) -> G> = Rc::new(group);
        let mut seeded: HashMap<G, ObservableList<T>> = HashMap::new();
        for item in source.snapshot() {
            seeded
                .entry(group(&item))
                .or_insert_with(ObservableList::new)
                .push(item);
        }

        let inner = Rc::new(GroupedListInner {
            source: Rc::new(source.clone()),
            group,
            groups: RefCell::new(seeded),
            hub: OnceCell::new(),
            upstream: RefCell::new(None),
            disposed: Cell::new(false),
        });

        let weak_add: Weak<GroupedListInner<G, T>> = Rc::downgrade(&inner);
        let weak_remove = weak_add.clone();
        let weak_update = weak_add.clone();
        let weak_dispose = weak_add.clone();

        let sub = source.hub().subscribe(
            HubCallbacks::new()
                .on_add(move |change: &ListChange<T>| {
                    if let Some(inner) = weak_add.upgrade() {
                        inner.add_member(&change.item);
                    }
                })
                .on_remove(move |change: &ListChange<T>| {
                    if let Some(inner) = weak_remove.upgrade() {
                        inner.remove_member(&change.item, "group_by.on_remove");
                    }
                })
                .on_update(move |update: &ListUpdate<T>| {
                    if let Some(inner) = weak_update.upgrade() {
                        // Uniform migration, even within one group.
                        inner.remove_member(&update.old, "group_by.on_update");
                        inner.add_member(&update.new);
                    }
                })
                .on_dispose(move || {
                    if let Some(inner) = weak_dispose.upgrade() {
                        Self {
                            inner,
                        }
                        .dispose();
                    }
                }),
        );
        *inner.upstream.borrow_mut() = Some(sub);

        Self { inner }
    }

    /// Number of non-empty groups.
    pub fn len(&self) -> usize {
        self.inner.groups.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bucket for `key`, if it currently has members.
    pub fn group(&self, key: &G) -> Option<ObservableList<T>> {
        self.inner.groups.borrow().get(key).cloned()
    }

    pub fn contains_group(&self, key: &G) -> bool {
        self.inner.groups.borrow().contains_key(key)
    }

    /// Clone out the current group keys, in no particular order.
    pub fn group_keys(&self) -> Vec<G> {
        self.inner.groups.borrow().keys().cloned().collect()
    }

    /// Run a closure over the group table without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&HashMap<G, ObservableList<T>>) -> R) -> R {
        f(&self.inner.groups.borrow())
    }

    /// The upstream this view derives from. The handle is itself a
    /// [`ListSource`], so further views can be built on it.
    pub fn source(&self) -> Rc<dyn ListSource<T>> {
        self.inner.source.clone()
    }

    /// The view's own event hub, created lazily. Its add/remove channels
    /// announce buckets appearing and vanishing.
    pub fn events(&self) -> Rc<DictHub<G, ObservableList<T>>> {
        self.inner
            .hub
            .get_or_init(|| Rc::new(EventHub::new()))
            .clone()
    }

    /// Subscribe the supplied callbacks to this view's hub.
    pub fn subscribe(
        &self,
        callbacks: HubCallbacks<
            DictChange<G, ObservableList<T>>,
            DictUpdate<G, ObservableList<T>>,
        >,
    ) -> Subscription {
        self.events().subscribe(callbacks)
    }

    /// Dispose the view: fire its own `on_dispose`, dispose every bucket,
    /// detach from the source, clear its relay slots. Idempotent; also runs
    /// when the source disposes.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_dispose();
        }
        let buckets: Vec<ObservableList<T>> =
            self.inner.groups.borrow_mut().drain().map(|(_, b)| b).collect();
        for bucket in buckets {
            bucket.dispose();
        }
        if let Some(mut sub) = self.inner.upstream.borrow_mut().take() {
            sub.unsubscribe();
        }
        if let Some(hub) = self.inner.hub.get() {
            hub.clear_all();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<G, T> GroupedListInner<G, T>
where
    G: Eq + Hash + Clone + Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    fn add_member(&self, item: &T) {
        let key = (self.group)(item);
        let (bucket, created) = {
            let mut groups = self.groups.borrow_mut();
            match groups.get(&key) {
                Some(bucket) => (bucket.clone(), false),
                None => {
                    let bucket = ObservableList::new();
                    groups.insert(key.clone(), bucket.clone());
                    (bucket, true)
                }
            }
        };
        if created {
            if let Some(hub) = self.hub.get() {
                hub.publish_add(&DictChange {
                    key,
                    value: bucket.clone(),
                });
            }
        }
        bucket.push(item.clone());
    }

    fn remove_member(&self, item: &T, op: &'static str) {
        let key = (self.group)(item);
        let bucket = self.groups.borrow().get(&key).cloned();
        let Some(bucket) = bucket else {
            report::invariant(&Violation::GroupNotFound {
                op,
                key: format!("{key:?}"),
            });
            return;
        };
        if !bucket.remove(item) {
            report::invariant(&Violation::MemberNotFound {
                op,
                key: format!("{key:?}"),
            });
            return;
        }
        if bucket.is_empty() {
            self.groups.borrow_mut().remove(&key);
            if let Some(hub) = self.hub.get() {
                hub.publish_remove(&DictChange {
                    key,
                    value: bucket.clone(),
                });
            }
            bucket.dispose();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
