//! Listener identifiers and unsubscribe handles.

use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

use crate::registry::Registry;

/// Identifier of a single handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle returned by every subscribe operation.
///
/// Calling [`Unsubscribe::unsubscribe`] removes exactly the registrations
/// this handle was created for (one for `on`/`once`, one per listed event for
/// `race`/`once_race`). It is idempotent and does nothing once the emitter
/// is gone. Dropping the handle does **not** unsubscribe.
#[derive(Clone)]
pub struct Unsubscribe {
    registry: Weak<Registry>,
    registrations: Arc<[(usize, ListenerId)]>,
}

impl Unsubscribe {
    pub(crate) fn new(registry: Weak<Registry>, registrations: Vec<(usize, ListenerId)>) -> Self {
        Self {
            registry,
            registrations: registrations.into(),
        }
    }

    /// Remove this handle's registrations that are still present.
    pub fn unsubscribe(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        for &(slot, id) in self.registrations.iter() {
            registry.unregister(slot, id);
        }
    }

    /// Whether at least one of this handle's registrations is still present.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            self.registrations
                .iter()
                .any(|&(slot, id)| registry.is_live(slot, id))
        })
    }

    /// Ids of the registrations covered by this handle.
    pub fn listener_ids(&self) -> impl Iterator<Item = ListenerId> + '_ {
        self.registrations.iter().map(|&(_, id)| id)
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("registrations", &self.registrations.len())
            .finish_non_exhaustive()
    }
}
