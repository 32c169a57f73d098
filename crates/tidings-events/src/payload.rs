//! Type-erased payloads and handlers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;

/// Result returned by every handler.
pub type HandlerResult = Result<(), HandlerError>;

type HandlerFn = dyn Fn(&Payload) -> HandlerResult + Send + Sync;

/// A value published with an event.
///
/// Payloads are shared, not copied: every handler of one dispatch sees the
/// same value, and cloning a payload only bumps a reference count.
#[derive(Clone)]
pub struct Payload(Arc<dyn Any + Send + Sync>);

impl Payload {
    /// Wrap a value as a payload.
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self(Arc::new(value))
    }

    /// The payload of an event that carries nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(())
    }

    /// Borrow the payload as `T`, if that is what it holds.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).downcast_ref::<T>()
    }

    /// Whether the payload holds a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        (*self.0).is::<T>()
    }

    /// Whether this is the empty payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is::<()>()
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("empty", &self.is_empty())
            .finish_non_exhaustive()
    }
}

/// A handler registered against an event.
///
/// Identity is by reference: clones of a `Handler` are the same handler and
/// can be passed to `off` to remove a registration made with any of them.
/// Two handlers built from separate `new` calls are never equal, even when
/// they wrap identical closures.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    /// Create a handler from a fallible closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Payload) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Create a handler from a closure that cannot fail.
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(&Payload) + Send + Sync + 'static,
    {
        Self::new(move |payload| {
            f(payload);
            Ok(())
        })
    }

    /// Whether `other` is the same handler (reference identity).
    #[must_use]
    pub fn same(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn call(&self, payload: &Payload) -> HandlerResult {
        (self.0)(payload)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}
