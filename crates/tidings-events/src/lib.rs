//! Tidings Events - a synchronous event emitter over a declared set of event names.
//!
//! This crate provides:
//! - `Emitter`, an untyped emitter keyed by event name with type-erased payloads
//! - `TypedEmitter`, a façade binding each event to a payload type at compile time
//! - once, race and wait compositions on top of plain subscriptions
//! - activation, reset and destroy lifecycle controls
//!
//! # Architecture
//!
//! The set of event names is fixed when the emitter is built; every name
//! gets a handler set and a bound [`Trigger`]. Triggering an event runs its
//! handlers synchronously, in registration order, over a snapshot of the
//! handler set. Handlers may subscribe, unsubscribe or trigger re-entrantly:
//! registrations made during a dispatch are not called by it, and handlers
//! removed during a dispatch are skipped if their turn has not come.
//!
//! A handler error aborts the dispatch and is returned to the caller, unless
//! the emitter was configured with a debug sink, which then receives the
//! error while the remaining handlers still run.
//!
//! # Example
//!
//! ```rust
//! use tidings_events::{Emitter, Handler, Payload};
//!
//! # fn main() -> Result<(), tidings_events::EmitterError> {
//! let emitter = Emitter::new(["login", "logout"])?;
//!
//! let on_login = Handler::infallible(|payload| {
//!     let user = payload.downcast_ref::<&str>().copied().unwrap_or_default();
//!     println!("{user} logged in");
//! });
//! emitter.on("login", on_login.clone())?;
//!
//! emitter.trigger("login", Payload::new("u1"))?;
//! emitter.off("login", &on_login)?;
//!
//! assert!(emitter.trigger("signup", Payload::empty()).is_err());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod config;
mod emitter;
mod error;
mod macros;
mod payload;
mod registry;
mod subscription;
mod trigger;
mod typed;
mod wait;

pub use config::{DebugSink, EmitterConfig};
pub use emitter::Emitter;
pub use error::{EmitterError, EmitterResult, HandlerError};
pub use payload::{Handler, HandlerResult, Payload};
pub use subscription::{ListenerId, Unsubscribe};
pub use trigger::{Trigger, Triggers};
pub use typed::{Event, EventId, EventSchema, TypedEmitter, TypedHandler};
pub use wait::Wait;
