// ============================================================================
// ripple - ObservableDictionary
// A mutable, owning key/value store that publishes every mutation
// ============================================================================

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use crate::core::error::Violation;
use crate::core::report;
use crate::core::types::{DictChange, DictUpdate};
use crate::events::hub::{DictHub, EventHub, HubCallbacks};
use crate::events::subscription::Subscription;
use crate::views::projection::DictProjection;

// =============================================================================
// OBSERVABLE DICTIONARY
// =============================================================================

pub(crate) struct DictInner<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    data: RefCell<HashMap<K, V>>,

    /// Event hub, created lazily on first subscription.
    hub: OnceCell<Rc<DictHub<K, V>>>,

    // Cached list-shaped projections, created lazily and shared by every
    // caller of keys()/values()/pairs().
    keys_view: OnceCell<DictProjection<K, V, K>>,
    values_view: OnceCell<DictProjection<K, V, V>>,
    pairs_view: OnceCell<DictProjection<K, V, (K, V)>>,

    disposed: Cell<bool>,
}

/// An observable dictionary: mutate it, and every mutation is published as a
/// structured event to whoever subscribed.
///
/// Like [`ObservableList`](crate::collections::ObservableList) this is a
/// cloneable handle over a shared store. Keys are unique; `add` refuses a
/// duplicate key while `upsert` turns it into an update.
///
/// # Example
///
/// ```
/// use ripple::collections::ObservableDictionary;
/// use ripple::events::HubCallbacks;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let scores: ObservableDictionary<String, u32> = ObservableDictionary::new();
///
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let log_in = log.clone();
/// let _sub = scores.subscribe(
///     HubCallbacks::new().on_add(move |c: &ripple::core::types::DictChange<String, u32>| log_in.borrow_mut().push((c.key.clone(), c.value))),
/// );
///
/// scores.add("alice".to_string(), 10);
/// assert_eq!(*log.borrow(), vec![("alice".to_string(), 10)]);
/// ```
pub struct ObservableDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    inner: Rc<DictInner<K, V>>,
}

impl<K, V> Clone for ObservableDictionary<K, V>
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

impl<K, V> Default for ObservableDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ObservableDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    /// Create a new empty observable dictionary.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DictInner {
                data: RefCell::new(HashMap::new()),
                hub: OnceCell::new(),
                keys_view: OnceCell::new(),
                values_view: OnceCell::new(),
                pairs_view: OnceCell::new(),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Create an observable dictionary seeded from key/value pairs.
    /// A duplicate key keeps the last value, like `HashMap::from_iter`.
    pub fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let dict = Self::new();
        dict.inner.data.borrow_mut().extend(iter);
        dict
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.data.borrow().len()
    }

    /// True if the dictionary contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone out the value stored under `key`, or `None` when absent.
    pub fn try_get(&self, key: &K) -> Option<V> {
        self.inner.data.borrow().get(key).cloned()
    }

    /// Whether an entry exists under `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.data.borrow().contains_key(key)
    }

    /// Run a closure over the entries without cloning.
    ///
    /// Do not mutate this dictionary from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&HashMap<K, V>) -> R) -> R {
        f(&self.inner.data.borrow())
    }

    /// Clone the contents into a plain map.
    pub fn to_map(&self) -> HashMap<K, V> {
        self.inner.data.borrow().clone()
    }

    // =========================================================================
    // MUTATE
    // =========================================================================

    /// Insert a new entry. Fires `on_add` and returns true.
    ///
    /// A duplicate key is reported as a violation and refused: the store is
    /// untouched, no event fires, and false comes back.
    pub fn add(&self, key: K, value: V) -> bool {
        if self.inner.disposed.get() {
            report::disposed_op("dict.add");
            return false;
        }
        {
            let mut data = self.inner.data.borrow_mut();
            if data.contains_key(&key) {
                drop(data);
                report::invariant(&Violation::DuplicateKey {
                    op: "dict.add",
                    key: format!("{key:?}"),
                });
                return false;
            }
            data.insert(key.clone(), value.clone());
        }
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_add(&DictChange { key, value });
        }
        true
    }

    /// Insert or replace the entry under `key`.
    ///
    /// Fires `on_add` when the key was absent, `on_update` (with the replaced
    /// value) when it was present.
    pub fn upsert(&self, key: K, value: V) {
        if self.inner.disposed.get() {
            report::disposed_op("dict.upsert");
            return;
        }
        let old = self
            .inner
            .data
            .borrow_mut()
            .insert(key.clone(), value.clone());
        if let Some(hub) = self.inner.hub.get() {
            match old {
                None => hub.publish_add(&DictChange { key, value }),
                Some(old) => hub.publish_update(&DictUpdate {
                    key,
                    old,
                    new: value,
                }),
            }
        }
    }

    /// Remove the entry under `key`, returning its value. Fires `on_remove`
    /// when an entry was present; an absent key is a silent `None`.
    pub fn remove(&self, key: &K) -> Option<V> {
        let removed = self.inner.data.borrow_mut().remove(key)?;
        if !self.inner.disposed.get() {
            if let Some(hub) = self.inner.hub.get() {
                hub.publish_remove(&DictChange {
                    key: key.clone(),
                    value: removed.clone(),
                });
            }
        }
        Some(removed)
    }

    /// Remove every entry, firing `on_remove` once per entry.
    /// Entry order is the store's iteration order, which is not specified.
    pub fn clear(&self) {
        if self.inner.disposed.get() {
            report::disposed_op("dict.clear");
            return;
        }
        let keys: Vec<K> = self.inner.data.borrow().keys().cloned().collect();
        for key in keys {
            self.remove(&key);
        }
    }

    // =========================================================================
    // DERIVATION ROOTS
    // =========================================================================

    /// A list-shaped live projection of this dictionary's keys.
    ///
    /// Cached: every call returns a handle to the same view.
    pub fn keys(&self) -> DictProjection<K, V, K> {
        self.inner
            .keys_view
            .get_or_init(|| DictProjection::new(self, |key, _| key.clone()))
            .clone()
    }

    /// A list-shaped live projection of this dictionary's values. Cached.
    pub fn values(&self) -> DictProjection<K, V, V> {
        self.inner
            .values_view
            .get_or_init(|| DictProjection::new(self, |_, value| value.clone()))
            .clone()
    }

    /// A list-shaped live projection of this dictionary's entries. Cached.
    pub fn pairs(&self) -> DictProjection<K, V, (K, V)> {
        self.inner
            .pairs_view
            .get_or_init(|| DictProjection::new(self, |key, value| (key.clone(), value.clone())))
            .clone()
    }

    /// An uncached list-shaped projection computing `f` over each entry.
    pub fn project<TOut: Clone + 'static>(
        &self,
        f: impl Fn(&K, &V) -> TOut + 'static,
    ) -> DictProjection<K, V, TOut> {
        DictProjection::new(self, f)
    }

    // =========================================================================
    // EVENTS & LIFECYCLE
    // =========================================================================

    /// The event hub, created lazily on first use.
    pub fn events(&self) -> Rc<DictHub<K, V>> {
        self.inner
            .hub
            .get_or_init(|| Rc::new(EventHub::new()))
            .clone()
    }

    /// Subscribe the supplied callbacks to this dictionary's hub.
    pub fn subscribe(
        &self,
        callbacks: HubCallbacks<DictChange<K, V>, DictUpdate<K, V>>,
    ) -> Subscription {
        self.events().subscribe(callbacks)
    }

    /// Dispose the dictionary: fire `on_dispose` (listeners can still read
    /// the contents), release the contents, then clear every relay slot.
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

impl<K, V> Debug for ObservableDictionary<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableDictionary")
            .field("data", &*self.inner.data.borrow())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
