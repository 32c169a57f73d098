//! The untyped emitter.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::config::EmitterConfig;
use crate::error::{EmitterResult, HandlerError};
use crate::payload::{Handler, HandlerResult, Payload};
use crate::registry::{Registry, validate_event_names};
use crate::subscription::{ListenerId, Unsubscribe};
use crate::trigger::{Trigger, Triggers};
use crate::wait::Wait;

/// Synchronous event emitter over a fixed, declared set of event names.
///
/// `Emitter` is a handle: clones share the same registry. Handlers run on
/// the thread that triggers the event, in registration order, and may use
/// the emitter re-entrantly.
///
/// **WARNING:** a handler that captures a clone of its own emitter creates
/// an `Arc` reference cycle that keeps both alive until the handler is
/// removed (`off`, `off_all`, `destroy`, or firing a `once`). Capture a
/// [`Trigger`] instead when the handler only needs to publish.
#[derive(Clone)]
pub struct Emitter {
    registry: Arc<Registry>,
}

impl Emitter {
    /// Create an emitter for `event_names` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::DuplicateEventNames`](crate::EmitterError::DuplicateEventNames)
    /// if a name is declared more than once.
    pub fn new<I, N>(event_names: I) -> EmitterResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Arc<str>>,
    {
        Self::with_config(event_names, EmitterConfig::default())
    }

    /// Create an emitter for `event_names` with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::DuplicateEventNames`](crate::EmitterError::DuplicateEventNames)
    /// if a name is declared more than once.
    pub fn with_config<I, N>(event_names: I, config: EmitterConfig) -> EmitterResult<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Arc<str>>,
    {
        let names: Vec<Arc<str>> = event_names.into_iter().map(Into::into).collect();
        validate_event_names(&names)?;

        debug!(
            event_count = names.len(),
            max_listeners = ?config.max_listeners,
            debug_sink = config.debug.is_some(),
            "Emitter created"
        );

        Ok(Self {
            registry: Registry::new(names, config),
        })
    }

    /// Declared event names, in declaration order.
    pub fn event_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.registry.names().iter().map(AsRef::as_ref)
    }

    /// Register `handler` for `event`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` for an undeclared name and
    /// `ListenerLimitExceeded` when the event already holds `max_listeners`
    /// handlers; nothing is registered in either case.
    pub fn on(&self, event: &str, handler: Handler) -> EmitterResult<Unsubscribe> {
        let slot = self.registry.slot(event)?;
        let id = ListenerId::new();
        self.registry.register(slot, id, handler)?;
        Ok(self.handle(vec![(slot, id)]))
    }

    /// Register `handler` for the next firing of `event` only.
    ///
    /// The registration is removed right before `handler` runs, so a trigger
    /// of the same event from inside `handler` does not reach it again.
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::on`].
    pub fn once(&self, event: &str, handler: Handler) -> EmitterResult<Unsubscribe> {
        let slot = self.registry.slot(event)?;
        let id = self.subscribe_once(slot, handler)?;
        Ok(self.handle(vec![(slot, id)]))
    }

    /// Call `handler` with the payload and name of whichever of `events`
    /// fires first, then never again.
    ///
    /// The first firing removes the pending registrations on every other
    /// listed event before `handler` runs.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` if any name is undeclared (nothing is
    /// registered), or `ListenerLimitExceeded` if one event is full (the
    /// registrations already made are rolled back).
    pub fn once_race<F>(&self, events: &[&str], handler: F) -> EmitterResult<Unsubscribe>
    where
        F: Fn(&Payload, &str) -> HandlerResult + Send + Sync + 'static,
    {
        let slots = self.slots(events)?;
        let handler = Arc::new(handler);
        let fired = Arc::new(AtomicBool::new(false));
        let cancel: Arc<OnceLock<Unsubscribe>> = Arc::new(OnceLock::new());

        let mut registrations = Vec::with_capacity(slots.len());
        for slot in slots {
            let handler = Arc::clone(&handler);
            let fired = Arc::clone(&fired);
            let cancel = Arc::clone(&cancel);
            let name = Arc::clone(self.registry.name(slot));

            let wrapper = Handler::new(move |payload| {
                if fired.swap(true, Ordering::AcqRel) {
                    return Ok(());
                }
                if let Some(cancel) = cancel.get() {
                    cancel.unsubscribe();
                }
                handler(payload, &*name)
            });

            match self.subscribe_once(slot, wrapper) {
                Ok(id) => registrations.push((slot, id)),
                Err(e) => {
                    self.handle(registrations).unsubscribe();
                    return Err(e);
                },
            }
        }

        let unsubscribe = self.handle(registrations);
        // Only ever set here; `get` in the wrappers sees it from now on.
        let _ = cancel.set(unsubscribe.clone());
        Ok(unsubscribe)
    }

    /// Call `handler` with the payload and name every time any of `events`
    /// fires.
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::once_race`].
    pub fn race<F>(&self, events: &[&str], handler: F) -> EmitterResult<Unsubscribe>
    where
        F: Fn(&Payload, &str) -> HandlerResult + Send + Sync + 'static,
    {
        let slots = self.slots(events)?;
        let handler = Arc::new(handler);

        let mut registrations = Vec::with_capacity(slots.len());
        for slot in slots {
            let handler = Arc::clone(&handler);
            let name = Arc::clone(self.registry.name(slot));
            let wrapper = Handler::new(move |payload| handler(payload, &*name));

            let id = ListenerId::new();
            if let Err(e) = self.registry.register(slot, id, wrapper) {
                self.handle(registrations).unsubscribe();
                return Err(e);
            }
            registrations.push((slot, id));
        }

        Ok(self.handle(registrations))
    }

    /// A future resolving with the payload of the next firing of `event`.
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::on`]; the returned future itself never fails.
    pub fn wait(&self, event: &str) -> EmitterResult<Wait> {
        self.wait_with(event, |payload| Ok(payload.clone()))
    }

    /// `wait`, converting the payload with `extract` inside the handler.
    pub(crate) fn wait_with<T, F>(&self, event: &str, extract: F) -> EmitterResult<Wait<T>>
    where
        T: Send + 'static,
        F: Fn(&Payload) -> Result<T, HandlerError> + Send + Sync + 'static,
    {
        let slot = self.registry.slot(event)?;
        let (sender, receiver) = oneshot::channel();
        let sender = Mutex::new(Some(sender));

        let handler = Handler::new(move |payload| {
            let value = extract(payload)?;
            let sender = sender.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(sender) = sender {
                // The waiter may be gone; nothing to deliver to then.
                let _ = sender.send(value);
            }
            Ok(())
        });

        let id = self.subscribe_once(slot, handler)?;
        Ok(Wait::new(receiver, self.handle(vec![(slot, id)])))
    }

    /// Remove the earliest registration of `handler` for `event`.
    ///
    /// Returns whether a registration was removed; an unknown handler is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` for an undeclared name.
    pub fn off(&self, event: &str, handler: &Handler) -> EmitterResult<bool> {
        let slot = self.registry.slot(event)?;
        Ok(self.registry.remove_handler(slot, handler))
    }

    /// Remove every handler of `event`, or of every event when `None`.
    ///
    /// Triggers stay bound.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` for an undeclared name.
    pub fn off_all(&self, event: Option<&str>) -> EmitterResult<()> {
        let slot = event.map(|e| self.registry.slot(e)).transpose()?;
        self.registry.clear(slot);
        Ok(())
    }

    /// Whether `event` has at least one handler.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` for an undeclared name.
    pub fn has_handlers(&self, event: &str) -> EmitterResult<bool> {
        Ok(self.listener_count(event)? > 0)
    }

    /// Number of registrations for `event`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` for an undeclared name.
    pub fn listener_count(&self, event: &str) -> EmitterResult<usize> {
        let slot = self.registry.slot(event)?;
        Ok(self.registry.listener_count(slot))
    }

    /// Dispatch `payload` to the handlers of `event`.
    ///
    /// Silently does nothing while the emitter is deactivated or after it
    /// was destroyed.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEvent` for an undeclared name, whatever the lifecycle
    /// state. Without a debug sink, returns the first handler error and skips
    /// the remaining handlers; a handler panic is resumed on the caller.
    pub fn trigger(&self, event: &str, payload: Payload) -> EmitterResult<()> {
        let slot = self.registry.slot(event)?;
        match self.registry.trigger(slot) {
            Some(trigger) => trigger.call(payload),
            None => {
                trace!(event, "No trigger bound, emitter destroyed");
                Ok(())
            },
        }
    }

    /// Dispatch the empty payload to the handlers of `event`.
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::trigger`].
    pub fn trigger_empty(&self, event: &str) -> EmitterResult<()> {
        self.trigger(event, Payload::empty())
    }

    /// Alias of [`Emitter::trigger`].
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::trigger`].
    pub fn emit(&self, event: &str, payload: Payload) -> EmitterResult<()> {
        self.trigger(event, payload)
    }

    /// Alias of [`Emitter::trigger_empty`].
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::trigger`].
    pub fn emit_empty(&self, event: &str) -> EmitterResult<()> {
        self.trigger_empty(event)
    }

    /// Snapshot of the bound triggers. Empty after [`Emitter::destroy`].
    #[must_use]
    pub fn triggers(&self) -> Triggers {
        Triggers::new(self.registry.triggers())
    }

    /// Call `f(trigger, name)` for every bound trigger, in declaration order.
    ///
    /// Iterates over a snapshot, so `f` may use the emitter freely.
    pub fn each_triggers<F>(&self, mut f: F)
    where
        F: FnMut(&Trigger, &str),
    {
        let triggers = self.triggers();
        for trigger in &triggers {
            f(trigger, trigger.name());
        }
    }

    /// Drop every registration and bind a fresh trigger per event.
    ///
    /// The activity flag is left as it is.
    pub fn remove_event_handlers(&self) {
        self.registry.reset();
    }

    /// Let triggers dispatch again.
    pub fn activate(&self) {
        self.registry.set_active(true);
    }

    /// Make triggers drop their payloads. Registrations are kept.
    pub fn deactivate(&self) {
        self.registry.set_active(false);
    }

    /// Whether triggers currently dispatch.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry.is_active()
    }

    /// Deactivate, remove every handler and unbind every trigger.
    ///
    /// Triggering a declared event afterwards is a silent no-op.
    pub fn destroy(&self) {
        self.registry.destroy();
    }

    /// Whether [`Emitter::destroy`] was called (and not undone by
    /// [`Emitter::remove_event_handlers`]).
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.registry.is_destroyed()
    }

    fn slots(&self, events: &[&str]) -> EmitterResult<Vec<usize>> {
        events.iter().map(|e| self.registry.slot(e)).collect()
    }

    fn handle(&self, registrations: Vec<(usize, ListenerId)>) -> Unsubscribe {
        Unsubscribe::new(Arc::downgrade(&self.registry), registrations)
    }

    /// Register a wrapper that removes itself, then runs `handler`.
    fn subscribe_once(&self, slot: usize, handler: Handler) -> EmitterResult<ListenerId> {
        let id = ListenerId::new();
        let registry = Arc::downgrade(&self.registry);

        let wrapper = Handler::new(move |payload| {
            // Only the dispatch that actually removes the registration runs it.
            let removed = registry
                .upgrade()
                .is_some_and(|registry| registry.unregister(slot, id));
            if removed {
                handler.call(payload)
            } else {
                Ok(())
            }
        });

        self.registry.register(slot, id, wrapper)?;
        Ok(id)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("event_names", &self.registry.names())
            .field("active", &self.registry.is_active())
            .field("destroyed", &self.registry.is_destroyed())
            .finish_non_exhaustive()
    }
}
