// ============================================================================
// ripple - FilteredDict
// Materialized predicate view over an observable dictionary
// ============================================================================
//
// Membership is exactly "present in the mirror". Source updates are where
// the interesting transitions live: an entry can enter the view, leave it,
// change inside it, or stay irrelevant, depending on how the predicate
// judges the old and new pair. An entry leaving the view is announced with
// the last value it was included under.
// ============================================================================

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::core::error::Violation;
use crate::core::report;
use crate::core::types::{DictChange, DictUpdate};
use crate::events::hub::{DictHub, EventHub, HubCallbacks};
use crate::events::subscription::Subscription;
use crate::views::source::DictSource;

// =============================================================================
// FILTERED DICT
// =============================================================================

struct FilteredDictInner<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    source: Rc<dyn DictSource<K, V>>,
    predicate: Rc<dyn Fn(&K, &V) -> bool>,
    mirror: RefCell<HashMap<K, V>>,
    hub: OnceCell<Rc<DictHub<K, V>>>,
    upstream: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
}

/// A live dictionary view holding only the entries a predicate admits.
///
/// Created through [`crate::views::filter`]. The predicate is re-judged on
/// every update, so entries flow in and out of the view as their values
/// change.
///
/// # Example
///
/// ```
/// use ripple::collections::ObservableDictionary;
/// use ripple::views;
///
/// let stock: ObservableDictionary<&str, u32> = ObservableDictionary::new();
/// let in_stock = views::filter(&stock, |_, count| *count > 0);
///
/// stock.add("apples", 3);
/// stock.add("pears", 0);
/// assert_eq!(in_stock.len(), 1);
///
/// stock.upsert("pears", 5);
/// assert_eq!(in_stock.len(), 2);
/// ```
pub struct FilteredDict<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    inner: Rc<FilteredDictInner<K, V>>,
}

impl<K, V> Clone for FilteredDict<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> FilteredDict<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    pub(crate) fn new<S>(source: &S, predicate: impl Fn(&K, &V) -> bool + 'static) -> Self
    where
        S: DictSource<K, V> + Clone + 'static,
    {
        let predicate: Rc<dyn Fn(&K, &V) -> bool> = Rc::new(predicate);
        let seeded: HashMap<K, V> = source
            .snapshot()
            .into_iter()
            .filter(|(key, value)| predicate(key, value))
            .collect();

        let inner = Rc::new(FilteredDictInner {
            source: Rc::new(source.clone()),
            predicate,
            mirror: RefCell::new(seeded),
            hub: OnceCell::new(),
            upstream: RefCell::new(None),
            disposed: Cell::new(false),
        });

        let weak_add: Weak<FilteredDictInner<K, V>> = Rc::downgrade(&inner);
        let weak_remove = weak_add.clone();
        let weak_update = weak_add.clone();
        let weak_dispose = weak_add.clone();

        let sub = source.hub().subscribe(
            HubCallbacks::new()
                .on_add(move |change: &DictChange<K, V>| {
                    if let Some(inner) = weak_add.upgrade() {
                        inner.source_added(change);
                    }
                })
                .on_remove(move |change: &DictChange<K, V>| {
                    if let Some(inner) = weak_remove.upgrade() {
                        inner.source_removed(change);
                    }
                })
                .on_update(move |update: &DictUpdate<K, V>| {
                    if let Some(inner) = weak_update.upgrade() {
                        inner.source_updated(update);
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

    /// Number of admitted entries.
    pub fn len(&self) -> usize {
        self.inner.mirror.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone out the admitted value stored under `key`.
    pub fn try_get(&self, key: &K) -> Option<V> {
        self.inner.mirror.borrow().get(key).cloned()
    }

    /// Whether `key` is currently admitted.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.mirror.borrow().contains_key(key)
    }

    /// Run a closure over the admitted entries without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&HashMap<K, V>) -> R) -> R {
        f(&self.inner.mirror.borrow())
    }

    /// Clone the admitted entries into a plain map.
    pub fn to_map(&self) -> HashMap<K, V> {
        self.inner.mirror.borrow().clone()
    }

    /// The upstream this view derives from. The handle is itself a
    /// [`DictSource`], so further views can be built on it.
    pub fn source(&self) -> Rc<dyn DictSource<K, V>> {
        self.inner.source.clone()
    }

    /// The view's own event hub, created lazily.
    pub fn events(&self) -> Rc<DictHub<K, V>> {
        self.inner
            .hub
            .get_or_init(|| Rc::new(EventHub::new()))
            .clone()
    }

    /// Subscribe the supplied callbacks to this view's hub.
    pub fn subscribe(
        &self,
        callbacks: HubCallbacks<DictChange<K, V>, DictUpdate<K, V>>,
    ) -> Subscription {
        self.events().subscribe(callbacks)
    }

    /// Dispose the view: fire its own `on_dispose`, release the mirror,
    /// detach from the source, clear its relay slots. Idempotent; also runs
    /// when the source disposes.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_dispose();
        }
        self.inner.mirror.borrow_mut().clear();
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

impl<K, V> FilteredDictInner<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    fn source_added(&self, change: &DictChange<K, V>) {
        if !(self.predicate)(&change.key, &change.value) {
            return;
        }
        {
            let mut mirror = self.mirror.borrow_mut();
            if mirror.contains_key(&change.key) {
                drop(mirror);
                report::invariant(&Violation::DuplicateKey {
                    op: "filter.on_add",
                    key: format!("{:?}", change.key),
                });
                return;
            }
            mirror.insert(change.key.clone(), change.value.clone());
        }
        if let Some(hub) = self.hub.get() {
            hub.publish_add(&DictChange {
                key: change.key.clone(),
                value: change.value.clone(),
            });
        }
    }

    fn source_removed(&self, change: &DictChange<K, V>) {
        // An entry the predicate never admitted is not a desync; silence.
        let Some(stored) = self.mirror.borrow_mut().remove(&change.key) else {
            return;
        };
        if let Some(hub) = self.hub.get() {
            hub.publish_remove(&DictChange {
                key: change.key.clone(),
                value: stored,
            });
        }
    }

    fn source_updated(&self, update: &DictUpdate<K, V>) {
        let was_in = self.mirror.borrow().contains_key(&update.key);
        let now_in = (self.predicate)(&update.key, &update.new);

        match (was_in, now_in) {
            (false, false) => {}
            (false, true) => {
                self.mirror
                    .borrow_mut()
                    .insert(update.key.clone(), update.new.clone());
                if let Some(hub) = self.hub.get() {
                    hub.publish_add(&DictChange {
                        key: update.key.clone(),
                        value: update.new.clone(),
                    });
                }
            }
            (true, true) => {
                let stored_old = {
                    let mut mirror = self.mirror.borrow_mut();
                    match mirror.get_mut(&update.key) {
                        Some(stored) => std::mem::replace(stored, update.new.clone()),
                        None => return,
                    }
                };
                if let Some(hub) = self.hub.get() {
                    hub.publish_update(&DictUpdate {
                        key: update.key.clone(),
                        old: stored_old,
                        new: update.new.clone(),
                    });
                }
            }
            (true, false) => {
                let Some(stored) = self.mirror.borrow_mut().remove(&update.key) else {
                    return;
                };
                if let Some(hub) = self.hub.get() {
                    hub.publish_remove(&DictChange {
                        key: update.key.clone(),
                        value: stored,
                    });
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
