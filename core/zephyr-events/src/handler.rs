//! Handler wrappers with identity semantics
//!
//! Handlers are shared closures. Two handles refer to the same registration
//! when they point at the same closure allocation, so cloning a handler keeps
//! its identity while wrapping the same code twice creates a new one.

use crate::key::EventKey;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// Identity of a registered closure (address of its shared allocation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

type EventFn<T> = dyn Fn(&T) + Send + Sync;
type WildcardFn<T> = dyn Fn(&EventKey, &T) + Send + Sync;

/// Unary callback invoked with the payload of a keyed emission
pub struct Handler<T> {
    f: Arc<EventFn<T>>,
}

impl<T> Handler<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    #[inline]
    pub fn call(&self, payload: &T) {
        (self.f)(payload)
    }

    pub fn id(&self) -> ListenerId {
        ListenerId(Arc::as_ptr(&self.f) as *const () as usize)
    }
}

/// Binary callback invoked with `(key, payload)` for every emission
pub struct WildcardHandler<T> {
    f: Arc<WildcardFn<T>>,
}

impl<T> WildcardHandler<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&EventKey, &T) + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    #[inline]
    pub fn call(&self, key: &EventKey, payload: &T) {
        (self.f)(key, payload)
    }

    pub fn id(&self) -> ListenerId {
        ListenerId(Arc::as_ptr(&self.f) as *const () as usize)
    }
}

/// Entry stored under an [`EventKey`]
///
/// Keyed entries hold a [`Handler`]; the wildcard key holds
/// [`WildcardHandler`]s.
pub enum Listener<T> {
    Event(Handler<T>),
    Wildcard(WildcardHandler<T>),
}

impl<T> Listener<T> {
    /// Shorthand for `Listener::Event(Handler::new(f))`
    pub fn event<F>(f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Listener::Event(Handler::new(f))
    }

    /// Shorthand for `Listener::Wildcard(WildcardHandler::new(f))`
    pub fn wildcard<F>(f: F) -> Self
    where
        F: Fn(&EventKey, &T) + Send + Sync + 'static,
    {
        Listener::Wildcard(WildcardHandler::new(f))
    }

    pub fn id(&self) -> ListenerId {
        match self {
            Listener::Event(h) => h.id(),
            Listener::Wildcard(h) => h.id(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Listener::Wildcard(_))
    }

    /// Whether this listener's signature fits `key`
    pub fn accepts(&self, key: &EventKey) -> bool {
        self.is_wildcard() == key.is_wildcard()
    }

    /// Invoke with the signature the listener was registered with
    #[inline]
    pub fn dispatch(&self, key: &EventKey, payload: &T) {
        match self {
            Listener::Event(h) => h.call(payload),
            Listener::Wildcard(h) => h.call(key, payload),
        }
    }
}

impl<T> Listener<T> {
    /// Identity handle that does not keep the closure alive
    pub(crate) fn downgrade(&self) -> WeakListener<T> {
        let alloc = match self {
            Listener::Event(h) => WeakFn::Event(Arc::downgrade(&h.f)),
            Listener::Wildcard(h) => WeakFn::Wildcard(Arc::downgrade(&h.f)),
        };
        WeakListener { id: self.id(), alloc }
    }
}

/// Weak counterpart of [`Listener`] held by [`Unsubscribe`]
///
/// The weak reference pins the closure's allocation, so `id` cannot be
/// taken over by a listener created later.
pub(crate) struct WeakListener<T> {
    id: ListenerId,
    alloc: WeakFn<T>,
}

enum WeakFn<T> {
    Event(Weak<EventFn<T>>),
    Wildcard(Weak<WildcardFn<T>>),
}

impl<T> WeakListener<T> {
    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    /// False once every strong handle is gone; a dead listener is in no set
    pub(crate) fn is_live(&self) -> bool {
        match &self.alloc {
            WeakFn::Event(w) => w.strong_count() > 0,
            WeakFn::Wildcard(w) => w.strong_count() > 0,
        }
    }
}

impl<T> From<Handler<T>> for Listener<T> {
    fn from(handler: Handler<T>) -> Self {
        Listener::Event(handler)
    }
}

impl<T> From<&Handler<T>> for Listener<T> {
    fn from(handler: &Handler<T>) -> Self {
        Listener::Event(handler.clone())
    }
}

impl<T> From<WildcardHandler<T>> for Listener<T> {
    fn from(handler: WildcardHandler<T>) -> Self {
        Listener::Wildcard(handler)
    }
}

impl<T> From<&WildcardHandler<T>> for Listener<T> {
    fn from(handler: &WildcardHandler<T>) -> Self {
        Listener::Wildcard(handler.clone())
    }
}

impl<T> From<&Listener<T>> for Listener<T> {
    fn from(listener: &Listener<T>) -> Self {
        listener.clone()
    }
}

// Manual impls: a derive would demand `T: Clone` / `T: Debug`.

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<T> Clone for WildcardHandler<T> {
    fn clone(&self) -> Self {
        Self { f: Arc::clone(&self.f) }
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        match self {
            Listener::Event(h) => Listener::Event(h.clone()),
            Listener::Wildcard(h) => Listener::Wildcard(h.clone()),
        }
    }
}

impl<T> PartialEq for Handler<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T> Eq for Handler<T> {}

impl<T> PartialEq for WildcardHandler<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T> Eq for WildcardHandler<T> {}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T> Eq for Listener<T> {}

impl<T> Hash for Listener<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.id()).finish()
    }
}

impl<T> fmt::Debug for WildcardHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WildcardHandler").field(&self.id()).finish()
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Event(h) => fmt::Debug::fmt(h, f),
            Listener::Wildcard(h) => fmt::Debug::fmt(h, f),
        }
    }
}

/// Removes one registration when invoked
///
/// Calling [`Unsubscribe::unsubscribe`] more than once is a no-op after the
/// first call. Dropping it does **not** unsubscribe.
#[derive(Clone)]
pub struct Unsubscribe {
    f: Arc<dyn Fn() + Send + Sync>,
}

impl Unsubscribe {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    pub fn unsubscribe(&self) {
        (self.f)()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unsubscribe")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_clone_keeps_identity() {
        let h: Handler<u32> = Handler::new(|_| {});
        let copy = h.clone();

        assert_eq!(h, copy);
        assert_eq!(Listener::from(&h), Listener::from(copy));
    }

    #[test]
    fn test_identical_closures_are_distinct() {
        let a: Handler<u32> = Handler::new(|_| {});
        let b: Handler<u32> = Handler::new(|_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn test_accepts_matching_signature() {
        let keyed: Listener<u32> = Listener::event(|_| {});
        let any: Listener<u32> = Listener::wildcard(|_, _| {});

        assert!(keyed.accepts(&EventKey::from("x")));
        assert!(!keyed.accepts(&EventKey::Wildcard));
        assert!(any.accepts(&EventKey::Wildcard));
        assert!(!any.accepts(&EventKey::from("x")));
    }

    #[test]
    fn test_dispatch_uses_registered_signature() {
        let seen = Arc::new(AtomicUsize::new(0));

        let s = Arc::clone(&seen);
        let keyed: Listener<usize> = Listener::event(move |v| {
            s.fetch_add(*v, Ordering::SeqCst);
        });
        let s = Arc::clone(&seen);
        let any: Listener<usize> = Listener::wildcard(move |key, v| {
            assert_eq!(key, &EventKey::from("x"));
            s.fetch_add(*v * 10, Ordering::SeqCst);
        });

        let key = EventKey::from("x");
        keyed.dispatch(&key, &1);
        any.dispatch(&key, &2);
        assert_eq!(seen.load(Ordering::SeqCst), 21);
    }

    #[test]
    fn test_weak_listener_tracks_liveness() {
        let h: Listener<u32> = Listener::event(|_| {});
        let weak = h.downgrade();

        assert_eq!(weak.id(), h.id());
        assert!(weak.is_live());

        drop(h);
        assert!(!weak.is_live());
    }

    #[test]
    fn test_unsubscribe_clones_share_callable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let unsub = Unsubscribe::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        unsub.clone().unsubscribe();
        unsub.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
