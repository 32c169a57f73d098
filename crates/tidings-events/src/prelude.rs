//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tidings_events::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use tidings_events::prelude::*;
//!
//! # fn main() -> EmitterResult<()> {
//! let emitter = Emitter::new(["ready"])?;
//! emitter.once("ready", Handler::infallible(|_| println!("ready")))?;
//! emitter.trigger_empty("ready")?;
//! # Ok(())
//! # }
//! ```

// Emitter
pub use crate::{Emitter, EmitterConfig};

// Errors
pub use crate::{EmitterError, EmitterResult, HandlerError};

// Handlers and payloads
pub use crate::{Handler, HandlerResult, Payload};

// Subscriptions and triggers
pub use crate::{Trigger, Triggers, Unsubscribe, Wait};

// Typed façade
pub use crate::{Event, EventId, EventSchema, TypedEmitter, TypedHandler, event_schema};
