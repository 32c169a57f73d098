//! Futures resolving on the next firing of an event.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use crate::payload::Payload;
use crate::subscription::Unsubscribe;

/// Resolves with the payload of the next firing of an event.
///
/// Backed by a `once` registration. It never fails: if that registration is
/// removed without the event firing (`off_all`, `destroy`, dropping the
/// emitter), the future simply stays pending. Dropping a `Wait` leaves the
/// registration in place; use [`Wait::cancel`] to remove it.
#[must_use = "futures do nothing unless polled"]
pub struct Wait<T = Payload> {
    receiver: oneshot::Receiver<T>,
    subscription: Unsubscribe,
    closed: bool,
}

impl<T> Wait<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<T>, subscription: Unsubscribe) -> Self {
        Self {
            receiver,
            subscription,
            closed: false,
        }
    }

    /// Remove the underlying registration; the future will never resolve.
    pub fn cancel(self) {
        self.subscription.unsubscribe();
    }

    /// Whether the underlying registration is still waiting for the event.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.subscription.is_subscribed()
    }
}

impl<T> Future for Wait<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Pending;
        }

        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(value),
            Poll::Ready(Err(_)) => {
                // Sender dropped without firing.
                this.closed = true;
                Poll::Pending
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for Wait<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("subscription", &self.subscription)
            .field("closed", &self.closed)
            .finish()
    }
}
