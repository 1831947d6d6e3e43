// ============================================================================
// ripple - MappedList
// Materialized element-map view over an observable list
// ============================================================================
//
// Keeps a mirror vec of transformed elements, index-aligned with the source
// at all times. The transform runs exactly once per source element, when the
// element arrives or is replaced; removals re-emit the stored mirror value
// rather than recomputing, so a non-pure transform still yields the value
// subscribers saw added.
// ============================================================================

use std::cell::{Cell, OnceCell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::error::Violation;
use crate::core::report;
use crate::core::types::{ListChange, ListUpdate};
use crate::events::hub::{EventHub, HubCallbacks, ListHub};
use crate::events::subscription::Subscription;
use crate::views::source::ListSource;

// =============================================================================
// MAPPED LIST
// =============================================================================

struct MappedListInner<T: Clone + 'static, U: Clone + 'static> {
    source: Rc<dyn ListSource<T>>,
    transform: Rc<dyn Fn(&T) -> U>,
    mirror: RefCell<Vec<U>>,
    hub: OnceCell<Rc<ListHub<U>>>,
    upstream: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
}

/// A live, materialized map of an [`ObservableList`] through a transform.
///
/// The mirror always holds exactly one transformed value per source element,
/// at the same index. Created through [`crate::views::map`] from any
/// [`ListSource`], so mapped lists stack: a `MappedList` is itself a valid
/// upstream. A transform of `Clone::clone` (see
/// [`ObservableList::mirror`](crate::collections::list::ObservableList::mirror))
/// makes it a plain read-only replica.
///
/// # Example
///
/// ```
/// use ripple::collections::ObservableList;
/// use ripple::views;
///
/// let numbers = ObservableList::from_vec(vec![1, 2, 3]);
/// let labels = views::map(&numbers, |n| format!("#{n}"));
///
/// numbers.push(4);
/// assert_eq!(labels.to_vec(), vec!["#1", "#2", "#3", "#4"]);
/// ```
pub struct MappedList<T: Clone + 'static, U: Clone + 'static> {
    inner: Rc<MappedListInner<T, U>>,
}

impl<T: Clone + 'static, U: Clone + 'static> Clone for MappedList<T, U> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static, U: Clone + 'static> MappedList<T, U> {
    pub(crate) fn new<S>(source: &S, transform: impl Fn(&T) -> U + 'static) -> Self
    where
        S: ListSource<T> + Clone + 'static,
    {
        let transform: Rc<dyn Fn(&T) -> U> = Rc::new(transform);
        let seeded: Vec<U> = source.snapshot().iter().map(|item| transform(item)).collect();

        let inner = Rc::new(MappedListInner {
            source: Rc::new(source.clone()),
            transform,
            mirror: RefCell::new(seeded),
            hub: OnceCell::new(),
            upstream: RefCell::new(None),
            disposed: Cell::new(false),
        });

        let weak_add: Weak<MappedListInner<T, U>> = Rc::downgrade(&inner);
        let weak_remove = weak_add.clone();
        let weak_update = weak_add.clone();
        let weak_dispose = weak_add.clone();

        let sub = source.hub().subscribe(
            HubCallbacks::new()
                .on_add(move |change: &ListChange<T>| {
                    if let Some(inner) = weak_add.upgrade() {
                        inner.source_added(change);
                    }
                })
                .on_remove(move |change: &ListChange<T>| {
                    if let Some(inner) = weak_remove.upgrade() {
                        inner.source_removed(change);
                    }
                })
                .on_update(move |update: &ListUpdate<T>| {
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

    /// Number of mirrored elements. Always equals the source's length while
    /// both are live.
    pub fn len(&self) -> usize {
        self.inner.mirror.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone out the mirrored value at `index`.
    pub fn get(&self, index: usize) -> Option<U> {
        self.inner.mirror.borrow().get(index).cloned()
    }

    /// Run a closure over the mirror without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&[U]) -> R) -> R {
        f(&self.inner.mirror.borrow())
    }

    /// Clone the mirror into a plain vec.
    pub fn to_vec(&self) -> Vec<U> {
        self.inner.mirror.borrow().clone()
    }

    /// The upstream this view derives from. The handle is itself a
    /// [`ListSource`], so further views can be built on it.
    pub fn source(&self) -> Rc<dyn ListSource<T>> {
        self.inner.source.clone()
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

impl<T: Clone + 'static, U: Clone + 'static> MappedListInner<T, U> {
    fn source_added(&self, change: &ListChange<T>) {
        let mapped = (self.transform)(&change.item);
        {
            let mut mirror = self.mirror.borrow_mut();
            if change.index > mirror.len() {
                drop(mirror);
                report::invariant(&Violation::IndexOutOfRange {
                    op: "mapped_list.add",
                    index: change.index,
                    len: self.mirror.borrow().len(),
                });
                return;
            }
            mirror.insert(change.index, mapped.clone());
        }
        if let Some(hub) = self.hub.get() {
            hub.publish_add(&ListChange {
                index: change.index,
                item: mapped,
            });
        }
    }

    fn source_removed(&self, change: &ListChange<T>) {
        let removed = {
            let mut mirror = self.mirror.borrow_mut();
            if change.index >= mirror.len() {
                drop(mirror);
                report::invariant(&Violation::IndexOutOfRange {
                    op: "mapped_list.remove",
                    index: change.index,
                    len: self.mirror.borrow().len(),
                });
                return;
            }
            mirror.remove(change.index)
        };
        if let Some(hub) = self.hub.get() {
            hub.publish_remove(&ListChange {
                index: change.index,
                item: removed,
            });
        }
    }

    fn source_updated(&self, update: &ListUpdate<T>) {
        let mapped_new = (self.transform)(&update.new);
        let mapped_old = {
            let mut mirror = self.mirror.borrow_mut();
            if update.index >= mirror.len() {
                drop(mirror);
                report::invariant(&Violation::IndexOutOfRange {
                    op: "mapped_list.update",
                    index: update.index,
                    len: self.mirror.borrow().len(),
                });
                return;
            }
            std::mem::replace(&mut mirror[update.index], mapped_new.clone())
        };
        if let Some(hub) = self.hub.get() {
            hub.publish_update(&ListUpdate {
                index: update.index,
                old: mapped_old,
                new: mapped_new,
            });
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
