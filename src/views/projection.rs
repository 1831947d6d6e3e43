// ============================================================================
// ripple - Projections
// Lightweight list-shaped read surfaces over a container
// ============================================================================
//
// Two flavours:
//
// 1. ListProjection: non-materializing. Reads delegate to the source list
//    and compute the transform per element; events are re-emitted with the
//    source's indices and transformed payloads. Nothing is stored.
//
// 2. DictProjection: backs keys()/values()/pairs(). Dictionaries have no
//    index order of their own, so this one materializes entries in append
//    order and exposes them through a list hub. Because it is cached inside
//    the dictionary it must not point back at it strongly, and since the
//    mirror answers every read it does not point back at all.
// ============================================================================

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::core::types::{DictChange, DictUpdate, ListChange, ListUpdate};
use crate::events::hub::{EventHub, HubCallbacks, ListHub};
use crate::events::subscription::Subscription;
use crate::views::source::{DictSource, ListSource};

// =============================================================================
// LIST PROJECTION
// =============================================================================

struct ListProjectionInner<T: Clone + 'static, U: Clone + 'static> {
    source: Rc<dyn ListSource<T>>,
    transform: Rc<dyn Fn(&T) -> U>,
    hub: OnceCell<Rc<ListHub<U>>>,
    upstream: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
}

/// A computed, list-shaped view over any [`ListSource`].
///
/// Created through
/// [`ObservableList::project`](crate::collections::list::ObservableList::project).
/// Nothing is materialized:
/// every read runs the transform over the source's current element, and
/// every source event is re-emitted with the transformed payload at the
/// same index.
pub struct ListProjection<T: Clone + 'static, U: Clone + 'static> {
    inner: Rc<ListProjectionInner<T, U>>,
}

impl<T: Clone + 'static, U: Clone + 'static> Clone for ListProjection<T, U> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static, U: Clone + 'static> ListProjection<T, U> {
    pub(crate) fn new<S>(source: &S, transform: impl Fn(&T) -> U + 'static) -> Self
    where
        S: ListSource<T> + Clone + 'static,
    {
        let inner = Rc::new(ListProjectionInner {
            source: Rc::new(source.clone()) as Rc<dyn ListSource<T>>,
            transform: Rc::new(transform),
            hub: OnceCell::new(),
            upstream: RefCell::new(None),
            disposed: Cell::new(false),
        });

        let weak_add: Weak<ListProjectionInner<T, U>> = Rc::downgrade(&inner);
        let weak_remove = weak_add.clone();
        let weak_update = weak_add.clone();
        let weak_dispose = weak_add.clone();

        let sub = source.hub().subscribe(
            HubCallbacks::new()
                .on_add(move |change: &ListChange<T>| {
                    if let Some(inner) = weak_add.upgrade() {
                        inner.forward_add(change);
                    }
                })
                .on_remove(move |change: &ListChange<T>| {
                    if let Some(inner) = weak_remove.upgrade() {
                        inner.forward_remove(change);
                    }
                })
                .on_update(move |update: &ListUpdate<T>| {
                    if let Some(inner) = weak_update.upgrade() {
                        inner.forward_update(update);
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

    /// Number of projected elements.
    pub fn len(&self) -> usize {
        if self.inner.disposed.get() {
            return 0;
        }
        self.inner.source.current_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute the projection of the source element at `index`.
    pub fn get(&self, index: usize) -> Option<U> {
        if self.inner.disposed.get() {
            return None;
        }
        self.inner
            .source
            .item_at(index)
            .map(|item| (self.inner.transform)(&item))
    }

    /// Compute the whole projection into a plain vec.
    pub fn to_vec(&self) -> Vec<U> {
        if self.inner.disposed.get() {
            return Vec::new();
        }
        self.inner
            .source
            .snapshot()
            .iter()
            .map(|item| (self.inner.transform)(item))
            .collect()
    }

    /// The view's own event hub, created lazily.
    pub fn events(&self) -> Rc<ListHub<U>> {
        self.inner
            .hub
            .get_or_init(|| Rc::new(EventHub::new()))
            .clone()
    }

    /// Subscribe the supplied callbacks to this view's hub.
    pub fn subscribe(&self, callbacks: HubCallbacks<ListChange<U>, ListUpdate<U>>) -> Subscription {
        self.events().subscribe(callbacks)
    }

    /// Dispose the view: fire its own `on_dispose`, detach from the source,
    /// clear its relay slots. Idempotent; also runs when the source disposes.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        if let Some(hub) = self.inner.hub.get() {
            hub.publish_dispose();
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

impl<T: Clone + 'static, U: Clone + 'static> ListProjectionInner<T, U> {
    fn forward_add(&self, change: &ListChange<T>) {
        if let Some(hub) = self.hub.get() {
            hub.publish_add(&ListChange {
                index: change.index,
                item: (self.transform)(&change.item),
            });
        }
    }

    fn forward_remove(&self, change: &ListChange<T>) {
        if let Some(hub) = self.hub.get() {
            hub.publish_remove(&ListChange {
                index: change.index,
                item: (self.transform)(&change.item),
            });
        }
    }

    fn forward_update(&self, update: &ListUpdate<T>) {
        if let Some(hub) = self.hub.get() {
            hub.publish_update(&ListUpdate {
                index: update.index,
                old: (self.transform)(&update.old),
                new: (self.transform)(&update.new),
            });
        }
    }
}

// =============================================================================
// DICT PROJECTION
// =============================================================================

struct DictProjectionInner<K, V, TOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
    TOut: Clone + 'static,
{
    /// Entries in append order. The dictionary itself has no order, so this
    /// mirror is what gives the projection stable list semantics.
    mirror: RefCell<Vec<(K, V)>>,
    project: Rc<dyn Fn(&K, &V) -> TOut>,
    hub: OnceCell<Rc<ListHub<TOut>>>,
    upstream: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
}

/// A materialized, list-shaped view over any [`DictSource`].
///
/// Backs [`keys`](crate::collections::dict::ObservableDictionary::keys),
/// [`values`](crate::collections::dict::ObservableDictionary::values),
/// [`pairs`](crate::collections::dict::ObservableDictionary::pairs) and
/// [`project`](crate::collections::dict::ObservableDictionary::project).
/// Entries appear in append order.
///
/// Dictionary mutations have no positional meaning, so the `index` carried
/// by this view's events is the entry's append-order position: adds report
/// the new length minus one, removals report the position the entry
/// occupied before removal, updates report the entry's current position.
pub struct DictProjection<K, V, TOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
    TOut: Clone + 'static,
{
    inner: Rc<DictProjectionInner<K, V, TOut>>,
}

impl<K, V, TOut> Clone for DictProjection<K, V, TOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
    TOut: Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V, TOut> DictProjection<K, V, TOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
    TOut: Clone + 'static,
{
    pub(crate) fn new<S>(source: &S, project: impl Fn(&K, &V) -> TOut + 'static) -> Self
    where
        S: DictSource<K, V>,
    {
        let seeded: Vec<(K, V)> = source.snapshot().into_iter().collect();

        let inner = Rc::new(DictProjectionInner {
            mirror: RefCell::new(seeded),
            project: Rc::new(project),
            hub: OnceCell::new(),
            upstream: RefCell::new(None),
            disposed: Cell::new(false),
        });

        let weak_add: Weak<DictProjectionInner<K, V, TOut>> = Rc::downgrade(&inner);
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

    /// Number of projected entries.
    pub fn len(&self) -> usize {
        self.inner.mirror.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute the projection of the entry at append-order `index`.
    pub fn get(&self, index: usize) -> Option<TOut> {
        self.inner
            .mirror
            .borrow()
            .get(index)
            .map(|(key, value)| (self.inner.project)(key, value))
    }

    /// Compute the whole projection, in append order, into a plain vec.
    pub fn to_vec(&self) -> Vec<TOut> {
        self.inner
            .mirror
            .borrow()
            .iter()
            .map(|(key, value)| (self.inner.project)(key, value))
            .collect()
    }

    /// The view's own event hub, created lazily.
    pub fn events(&self) -> Rc<ListHub<TOut>> {
        self.inner
            .hub
            .get_or_init(|| Rc::new(EventHub::new()))
            .clone()
    }

    /// Subscribe the supplied callbacks to this view's hub.
    pub fn subscribe(
        &self,
        callbacks: HubCallbacks<ListChange<TOut>, ListUpdate<TOut>>,
    ) -> Subscription {
        self.events().subscribe(callbacks)
    }

    /// Dispose the view: fire its own `on_dispose`, release the mirror,
    /// detach from the source, clear its relay slots. Idempotent.
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

impl<K, V, TOut> DictProjectionInner<K, V, TOut>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
    TOut: Clone + 'static,
{
    fn source_added(&self, change: &DictChange<K, V>) {
        let index = {
            let mut mirror = self.mirror.borrow_mut();
            mirror.push((change.key.clone(), change.value.clone()));
            mirror.len() - 1
        };
        if let Some(hub) = self.hub.get() {
            hub.publish_add(&ListChange {
                index,
                item: (self.project)(&change.key, &change.value),
            });
        }
    }

    fn source_removed(&self, change: &DictChange<K, V>) {
        let removed = {
            let mut mirror = self.mirror.borrow_mut();
            mirror
                .iter()
                .position(|(key, _)| *key == change.key)
                .map(|position| (mirror.remove(position), position))
        };
        // A key we never mirrored is already consistent; nothing to emit.
        let Some(((key, value), position)) = removed else {
            return;
        };
        if let Some(hub) = self.hub.get() {
            hub.publish_remove(&ListChange {
                index: position,
                item: (self.project)(&key, &value),
            });
        }
    }

    fn source_updated(&self, update: &DictUpdate<K, V>) {
        let replaced = {
            let mut mirror = self.mirror.borrow_mut();
            match mirror.iter().position(|(key, _)| *key == update.key) {
                Some(position) => {
                    let old_value =
                        std::mem::replace(&mut mirror[position].1, update.new.clone());
                    Some((position, old_value))
                }
                None => None,
            }
        };
        let Some((position, old_value)) = replaced else {
            return;
        };
        if let Some(hub) = self.hub.get() {
            hub.publish_update(&ListUpdate {
                index: position,
                old: (self.project)(&update.key, &old_value),
                new: (self.project)(&update.key, &update.new),
            });
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
