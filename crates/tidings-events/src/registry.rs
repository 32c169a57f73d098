//! Handler registry and the dispatch loop.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, trace, warn};

use crate::config::EmitterConfig;
use crate::error::{EmitterError, EmitterResult};
use crate::payload::{Handler, Payload};
use crate::subscription::ListenerId;
use crate::trigger::Trigger;

/// One entry of a handler set.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) id: ListenerId,
    pub(crate) handler: Handler,
}

/// State shared by an emitter, its triggers and its unsubscribe handles.
///
/// No lock is ever held while a handler runs, so handlers may subscribe,
/// unsubscribe, trigger or destroy re-entrantly.
pub(crate) struct Registry {
    names: Vec<Arc<str>>,
    slots: HashMap<Arc<str>, usize>,
    handlers: RwLock<Vec<Vec<Registration>>>,
    /// Empty once the emitter is destroyed.
    triggers: RwLock<Vec<Trigger>>,
    active: AtomicBool,
    destroyed: AtomicBool,
    config: EmitterConfig,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Reject a name sequence containing repeats, listing each repeat once.
pub(crate) fn validate_event_names(names: &[Arc<str>]) -> EmitterResult<()> {
    let mut seen = HashSet::with_capacity(names.len());
    let mut duplicates: Vec<String> = Vec::new();

    for name in names {
        if !seen.insert(name.as_ref()) && !duplicates.iter().any(|d| d == name.as_ref()) {
            duplicates.push(name.to_string());
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(EmitterError::DuplicateEventNames { names: duplicates })
    }
}

fn build_triggers(registry: &Weak<Registry>, names: &[Arc<str>]) -> Vec<Trigger> {
    names
        .iter()
        .enumerate()
        .map(|(slot, name)| Trigger::new(Weak::clone(registry), slot, Arc::clone(name)))
        .collect()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Registry {
    /// Build the registry for an already validated name sequence.
    pub(crate) fn new(names: Vec<Arc<str>>, config: EmitterConfig) -> Arc<Self> {
        let slots = names
            .iter()
            .enumerate()
            .map(|(slot, name)| (Arc::clone(name), slot))
            .collect();
        let handlers = vec![Vec::new(); names.len()];

        Arc::new_cyclic(|weak| Self {
            triggers: RwLock::new(build_triggers(weak, &names)),
            names,
            slots,
            handlers: RwLock::new(handlers),
            active: AtomicBool::new(true),
            destroyed: AtomicBool::new(false),
            config,
        })
    }

    pub(crate) fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    pub(crate) fn name(&self, slot: usize) -> &Arc<str> {
        &self.names[slot]
    }

    /// Resolve an event name to its slot.
    pub(crate) fn slot(&self, event: &str) -> EmitterResult<usize> {
        self.slots
            .get(event)
            .copied()
            .ok_or_else(|| EmitterError::unknown_event(event))
    }

    /// Append a registration, honouring the listener cap.
    pub(crate) fn register(&self, slot: usize, id: ListenerId, handler: Handler) -> EmitterResult<()> {
        let mut handlers = write(&self.handlers);
        let set = &mut handlers[slot];

        if let Some(limit) = self.config.max_listeners
            && set.len() >= limit
        {
            return Err(EmitterError::ListenerLimitExceeded {
                event: self.names[slot].to_string(),
                limit,
            });
        }

        set.push(Registration { id, handler });
        debug!(event = %self.names[slot], listener_id = %id, "Handler registered");
        Ok(())
    }

    /// Remove one registration by id. Returns `true` if it was still present.
    pub(crate) fn unregister(&self, slot: usize, id: ListenerId) -> bool {
        let mut handlers = write(&self.handlers);
        let set = &mut handlers[slot];

        let Some(position) = set.iter().position(|r| r.id == id) else {
            return false;
        };
        // The removed handler must outlive the guard: its captures may call back in.
        let _removed = set.remove(position);
        drop(handlers);

        debug!(event = %self.names[slot], listener_id = %id, "Handler unregistered");
        true
    }

    /// Remove the earliest registration of `handler` (by reference).
    pub(crate) fn remove_handler(&self, slot: usize, handler: &Handler) -> bool {
        let mut handlers = write(&self.handlers);
        let set = &mut handlers[slot];

        let Some(position) = set.iter().position(|r| r.handler.same(handler)) else {
            return false;
        };
        let removed = set.remove(position);
        drop(handlers);

        debug!(event = %self.names[slot], listener_id = %removed.id, "Handler removed");
        true
    }

    /// Clear one slot, or every slot when `slot` is `None`.
    pub(crate) fn clear(&self, slot: Option<usize>) {
        let mut handlers = write(&self.handlers);
        let _removed: Vec<Vec<Registration>> = match slot {
            Some(slot) => vec![std::mem::take(&mut handlers[slot])],
            None => handlers.iter_mut().map(std::mem::take).collect(),
        };
        drop(handlers);

        match slot {
            Some(slot) => debug!(event = %self.names[slot], "Handlers cleared"),
            None => debug!("All handlers cleared"),
        }
    }

    pub(crate) fn is_live(&self, slot: usize, id: ListenerId) -> bool {
        read(&self.handlers)[slot].iter().any(|r| r.id == id)
    }

    pub(crate) fn listener_count(&self, slot: usize) -> usize {
        read(&self.handlers)[slot].len()
    }

    pub(crate) fn trigger(&self, slot: usize) -> Option<Trigger> {
        read(&self.triggers).get(slot).cloned()
    }

    pub(crate) fn triggers(&self) -> Vec<Trigger> {
        read(&self.triggers).clone()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
        debug!(active, "Emitter activity changed");
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Reset every handler set and bind a fresh trigger per event.
    pub(crate) fn reset(self: &Arc<Self>) {
        let fresh = build_triggers(&Arc::downgrade(self), &self.names);
        let _old_handlers = std::mem::replace(
            &mut *write(&self.handlers),
            vec![Vec::new(); self.names.len()],
        );
        let _old_triggers = std::mem::replace(&mut *write(&self.triggers), fresh);
        self.destroyed.store(false, Ordering::Release);

        debug!(event_count = self.names.len(), "Event handlers reset");
    }

    /// Deactivate, drop every handler and unbind every trigger.
    pub(crate) fn destroy(&self) {
        self.set_active(false);
        self.clear(None);
        let _old_triggers = std::mem::take(&mut *write(&self.triggers));
        self.destroyed.store(true, Ordering::Release);

        debug!("Emitter destroyed");
    }

    /// Run every live handler of `slot` with `payload`.
    ///
    /// The handler set is copied before iterating; each entry is then checked
    /// against the live set right before it runs, so handlers added during
    /// this dispatch are not called and handlers removed during it are
    /// skipped if their turn has not come yet.
    pub(crate) fn dispatch(&self, slot: usize, payload: &Payload) -> EmitterResult<()> {
        let event = &self.names[slot];

        if !self.is_active() {
            trace!(event = %event, "Emitter inactive, payload dropped");
            return Ok(());
        }

        let snapshot: Vec<Registration> = read(&self.handlers)[slot].clone();
        trace!(event = %event, handler_count = snapshot.len(), "Dispatching event");

        for registration in snapshot {
            if !self.is_live(slot, registration.id) {
                trace!(
                    event = %event,
                    listener_id = %registration.id,
                    "Handler removed before its turn, skipping"
                );
                continue;
            }

            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| registration.handler.call(payload)));

            match outcome {
                Ok(Ok(())) => {},
                Ok(Err(source)) => {
                    self.report(EmitterError::Handler {
                        event: event.to_string(),
                        source,
                    })?;
                },
                Err(panic) => {
                    if self.config.debug.is_none() {
                        panic::resume_unwind(panic);
                    }
                    self.report(EmitterError::HandlerPanicked {
                        event: event.to_string(),
                        message: panic_message(&*panic),
                    })?;
                },
            }
        }

        Ok(())
    }

    /// Hand a handler failure to the debug sink, or return it to abort the
    /// dispatch when no sink is configured.
    fn report(&self, error: EmitterError) -> EmitterResult<()> {
        let Some(sink) = &self.config.debug else {
            return Err(error);
        };

        warn!(error = %error, "Handler failed, reported to debug sink");
        sink(&error);
        Ok(())
    }
}
