//! Bound dispatch functions.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::EmitterResult;
use crate::payload::Payload;
use crate::registry::Registry;

/// The dispatch function bound to one event name.
///
/// A trigger skips the name lookup `Emitter::trigger` performs, which makes
/// it suitable for forwarding one emitter's events into another. It holds no
/// strong reference to the emitter: once the emitter is dropped, calling it
/// does nothing.
#[derive(Clone)]
pub struct Trigger {
    registry: Weak<Registry>,
    slot: usize,
    name: Arc<str>,
}

impl Trigger {
    pub(crate) fn new(registry: Weak<Registry>, slot: usize, name: Arc<str>) -> Self {
        Self {
            registry,
            slot,
            name,
        }
    }

    /// The event this trigger dispatches.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dispatch `payload` to the event's live handlers.
    ///
    /// # Errors
    ///
    /// Returns the first handler failure when the emitter has no debug sink.
    pub fn call(&self, payload: Payload) -> EmitterResult<()> {
        match self.registry.upgrade() {
            Some(registry) => registry.dispatch(self.slot, &payload),
            None => Ok(()),
        }
    }

    /// Dispatch the empty payload.
    ///
    /// # Errors
    ///
    /// Same as [`Trigger::call`].
    pub fn call_empty(&self) -> EmitterResult<()> {
        self.call(Payload::empty())
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Read-only view of an emitter's triggers, in declaration order.
///
/// This is a snapshot: destroying or resetting the emitter afterwards does
/// not change it.
#[derive(Debug, Clone, Default)]
pub struct Triggers {
    entries: Vec<Trigger>,
}

impl Triggers {
    pub(crate) fn new(entries: Vec<Trigger>) -> Self {
        Self { entries }
    }

    /// The trigger bound to `name`, if one is bound.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Trigger> {
        self.entries.iter().find(|t| t.name() == name)
    }

    /// Iterate over the triggers in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Trigger> {
        self.entries.iter()
    }

    /// Number of bound triggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no trigger is bound (the emitter was destroyed, or declared no events).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Triggers {
    type Item = &'a Trigger;
    type IntoIter = std::slice::Iter<'a, Trigger>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
