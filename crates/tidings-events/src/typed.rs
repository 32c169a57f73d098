//! Compile-time event schemas over the untyped emitter.
//!
//! A schema is a set of event marker types, each naming one declared event
//! and its payload type. [`TypedEmitter`] forwards every call to an inner
//! [`Emitter`] and does the payload conversion at the edges, so handlers
//! receive `&E::Payload` rather than a type-erased [`Payload`].
//!
//! Schemas are normally declared with [`event_schema!`](crate::event_schema).

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::EmitterConfig;
use crate::emitter::Emitter;
use crate::error::{EmitterError, EmitterResult};
use crate::payload::{Handler, HandlerResult, Payload};
use crate::subscription::Unsubscribe;
use crate::trigger::{Trigger, Triggers};
use crate::wait::Wait;

/// The full set of events a [`TypedEmitter`] is built for.
pub trait EventSchema: 'static {
    /// Declared event names, in declaration order.
    const EVENT_NAMES: &'static [&'static str];
}

/// One event of a schema.
pub trait Event: 'static {
    /// Schema this event belongs to.
    type Schema: EventSchema;
    /// Value published with the event.
    type Payload: Send + Sync + 'static;
    /// Declared name of the event.
    const NAME: &'static str;

    /// Typed token for this event, for APIs listing several events.
    #[must_use]
    fn id() -> EventId<Self::Schema, Self::Payload>
    where
        Self: Sized,
    {
        EventId::new(Self::NAME)
    }

    /// Build a handler for this event.
    fn handler<F>(f: F) -> TypedHandler<Self>
    where
        Self: Sized,
        F: Fn(&Self::Payload) -> HandlerResult + Send + Sync + 'static,
    {
        TypedHandler::new(f)
    }
}

/// Name of an event of schema `S` whose payload is `P`.
pub struct EventId<S, P> {
    name: &'static str,
    _marker: PhantomData<fn() -> (S, P)>,
}

impl<S, P> EventId<S, P> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The event's declared name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<S, P> Clone for EventId<S, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, P> Copy for EventId<S, P> {}

impl<S, P> PartialEq for EventId<S, P> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<S, P> Eq for EventId<S, P> {}

impl<S, P> fmt::Debug for EventId<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventId").field(&self.name).finish()
    }
}

fn downcast<E: Event>(payload: &Payload) -> Result<&E::Payload, EmitterError> {
    payload
        .downcast_ref::<E::Payload>()
        .ok_or_else(|| EmitterError::PayloadTypeMismatch {
            event: E::NAME.to_owned(),
            expected: type_name::<E::Payload>(),
        })
}

/// A handler for event `E`.
///
/// Keep a clone to remove the registration later with [`TypedEmitter::off`].
pub struct TypedHandler<E> {
    handler: Handler,
    _event: PhantomData<fn() -> E>,
}

impl<E: Event> TypedHandler<E> {
    /// Wrap a closure over `E`'s payload.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E::Payload) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            handler: Handler::new(move |payload| f(downcast::<E>(payload)?)),
            _event: PhantomData,
        }
    }

    /// The untyped handler registered with the inner emitter.
    #[must_use]
    pub fn as_handler(&self) -> &Handler {
        &self.handler
    }
}

impl<E> Clone for TypedHandler<E> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            _event: PhantomData,
        }
    }
}

impl<E> fmt::Debug for TypedHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedHandler")
            .field("event", &type_name::<E>())
            .finish_non_exhaustive()
    }
}

/// An [`Emitter`] whose events and payloads are fixed by schema `S`.
pub struct TypedEmitter<S> {
    inner: Emitter,
    _schema: PhantomData<fn() -> S>,
}

impl<S: EventSchema> TypedEmitter<S> {
    /// Create an emitter for every event of `S`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEventNames` if two events of `S` share a name.
    pub fn new() -> EmitterResult<Self> {
        Self::with_config(EmitterConfig::default())
    }

    /// Create an emitter for every event of `S` with `config`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEventNames` if two events of `S` share a name.
    pub fn with_config(config: EmitterConfig) -> EmitterResult<Self> {
        Ok(Self {
            inner: Emitter::with_config(S::EVENT_NAMES.iter().copied(), config)?,
            _schema: PhantomData,
        })
    }

    /// The untyped emitter, for APIs the schema cannot express (races over
    /// events with different payload types, forwarding by name).
    #[must_use]
    pub fn inner(&self) -> &Emitter {
        &self.inner
    }

    /// Register `handler` for `E`.
    ///
    /// # Errors
    ///
    /// Returns `ListenerLimitExceeded` when `E` is full, or `UnknownEvent` if
    /// `E` is missing from `S::EVENT_NAMES`.
    pub fn on<E>(&self, handler: &TypedHandler<E>) -> EmitterResult<Unsubscribe>
    where
        E: Event<Schema = S>,
    {
        self.inner.on(E::NAME, handler.handler.clone())
    }

    /// Register `handler` for the next firing of `E` only.
    ///
    /// # Errors
    ///
    /// Returns `ListenerLimitExceeded` when `E` is full, or `UnknownEvent` if
    /// `E` is missing from `S::EVENT_NAMES`.
    pub fn once<E>(&self, handler: &TypedHandler<E>) -> EmitterResult<Unsubscribe>
    where
        E: Event<Schema = S>,
    {
        self.inner.once(E::NAME, handler.handler.clone())
    }

    /// Call `handler` for whichever of `events` fires first, then never again.
    ///
    /// # Errors
    ///
    /// Returns `ListenerLimitExceeded` when one of the events is full, or
    /// `UnknownEvent` if one is missing from `S::EVENT_NAMES`.
    pub fn once_race<P, F>(&self, events: &[EventId<S, P>], handler: F) -> EmitterResult<Unsubscribe>
    where
        P: Send + Sync + 'static,
        F: Fn(&P, EventId<S, P>) -> HandlerResult + Send + Sync + 'static,
    {
        let names: Vec<&str> = events.iter().map(EventId::name).collect();
        self.inner.once_race(&names, race_adapter(events, handler))
    }

    /// Call `handler` every time any of `events` fires.
    ///
    /// # Errors
    ///
    /// Returns `ListenerLimitExceeded` when one of the events is full, or
    /// `UnknownEvent` if one is missing from `S::EVENT_NAMES`.
    pub fn race<P, F>(&self, events: &[EventId<S, P>], handler: F) -> EmitterResult<Unsubscribe>
    where
        P: Send + Sync + 'static,
        F: Fn(&P, EventId<S, P>) -> HandlerResult + Send + Sync + 'static,
    {
        let names: Vec<&str> = events.iter().map(EventId::name).collect();
        self.inner.race(&names, race_adapter(events, handler))
    }

    /// A future resolving with the payload of the next firing of `E`.
    ///
    /// # Errors
    ///
    /// Returns `ListenerLimitExceeded` when `E` is full, or `UnknownEvent` if
    /// `E` is missing from `S::EVENT_NAMES`.
    pub fn wait<E>(&self) -> EmitterResult<Wait<E::Payload>>
    where
        E: Event<Schema = S>,
        E::Payload: Clone,
    {
        self.inner
            .wait_with(E::NAME, |payload| Ok(downcast::<E>(payload)?.clone()))
    }

    /// Remove the earliest registration of `handler` for `E`. Returns whether
    /// a registration was removed.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` if `E` is missing from `S::EVENT_NAMES`.
    pub fn off<E>(&self, handler: &TypedHandler<E>) -> EmitterResult<bool>
    where
        E: Event<Schema = S>,
    {
        self.inner.off(E::NAME, &handler.handler)
    }

    /// Remove every handler of `E`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` if `E` is missing from `S::EVENT_NAMES`.
    pub fn off_all<E>(&self) -> EmitterResult<()>
    where
        E: Event<Schema = S>,
    {
        self.inner.off_all(Some(E::NAME))
    }

    /// Remove every handler of every event.
    pub fn off_all_events(&self) {
        // Infallible without a name.
        let _ = self.inner.off_all(None);
    }

    /// Whether `E` has at least one handler.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` if `E` is missing from `S::EVENT_NAMES`.
    pub fn has_handlers<E>(&self) -> EmitterResult<bool>
    where
        E: Event<Schema = S>,
    {
        self.inner.has_handlers(E::NAME)
    }

    /// Number of registrations for `E`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` if `E` is missing from `S::EVENT_NAMES`.
    pub fn listener_count<E>(&self) -> EmitterResult<usize>
    where
        E: Event<Schema = S>,
    {
        self.inner.listener_count(E::NAME)
    }

    /// Dispatch `payload` to the handlers of `E`.
    ///
    /// # Errors
    ///
    /// Without a debug sink, returns the first handler error.
    pub fn trigger<E>(&self, payload: E::Payload) -> EmitterResult<()>
    where
        E: Event<Schema = S>,
    {
        self.inner.trigger(E::NAME, Payload::new(payload))
    }

    /// Dispatch an event that carries no payload.
    ///
    /// # Errors
    ///
    /// Without a debug sink, returns the first handler error.
    pub fn trigger_empty<E>(&self) -> EmitterResult<()>
    where
        E: Event<Schema = S, Payload = ()>,
    {
        self.inner.trigger_empty(E::NAME)
    }

    /// Alias of [`TypedEmitter::trigger`].
    ///
    /// # Errors
    ///
    /// Same as [`TypedEmitter::trigger`].
    pub fn emit<E>(&self, payload: E::Payload) -> EmitterResult<()>
    where
        E: Event<Schema = S>,
    {
        self.trigger::<E>(payload)
    }

    /// Alias of [`TypedEmitter::trigger_empty`].
    ///
    /// # Errors
    ///
    /// Same as [`TypedEmitter::trigger`].
    pub fn emit_empty<E>(&self) -> EmitterResult<()>
    where
        E: Event<Schema = S, Payload = ()>,
    {
        self.trigger_empty::<E>()
    }

    /// Snapshot of the bound triggers.
    #[must_use]
    pub fn triggers(&self) -> Triggers {
        self.inner.triggers()
    }

    /// Call `f(trigger, name)` for every bound trigger, in declaration order.
    pub fn each_triggers<F>(&self, f: F)
    where
        F: FnMut(&Trigger, &str),
    {
        self.inner.each_triggers(f);
    }

    /// See [`Emitter::remove_event_handlers`].
    pub fn remove_event_handlers(&self) {
        self.inner.remove_event_handlers();
    }

    /// See [`Emitter::activate`].
    pub fn activate(&self) {
        self.inner.activate();
    }

    /// See [`Emitter::deactivate`].
    pub fn deactivate(&self) {
        self.inner.deactivate();
    }

    /// See [`Emitter::is_active`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    /// See [`Emitter::destroy`].
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

fn race_adapter<S, P, F>(
    events: &[EventId<S, P>],
    handler: F,
) -> impl Fn(&Payload, &str) -> HandlerResult + Send + Sync + 'static
where
    S: EventSchema,
    P: Send + Sync + 'static,
    F: Fn(&P, EventId<S, P>) -> HandlerResult + Send + Sync + 'static,
{
    let ids: Arc<[EventId<S, P>]> = events.into();
    move |payload, name| {
        let Some(&id) = ids.iter().find(|id| id.name() == name) else {
            return Ok(());
        };
        let value = payload
            .downcast_ref::<P>()
            .ok_or_else(|| EmitterError::PayloadTypeMismatch {
                event: name.to_owned(),
                expected: type_name::<P>(),
            })?;
        handler(value, id)
    }
}

impl<S> Clone for TypedEmitter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _schema: PhantomData,
        }
    }
}

impl<S> fmt::Debug for TypedEmitter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedEmitter")
            .field("schema", &type_name::<S>())
            .field("inner", &self.inner)
            .finish()
    }
}
