//! Emitter error types.

use thiserror::Error;

/// Error type returned by user handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while configuring, subscribing to or dispatching
/// through an emitter.
#[derive(Debug, Error)]
pub enum EmitterError {
    /// The declared event names contain repeats.
    #[error("event names must be unique: {}", .names.join(", "))]
    DuplicateEventNames {
        /// Every repeated name, once each, in the order the repeat was seen.
        names: Vec<String>,
    },

    /// The event name was never declared on this emitter.
    #[error("event {event} not supported")]
    UnknownEvent {
        /// The undeclared name.
        event: String,
    },

    /// Registering another handler would exceed the per-event cap.
    #[error("max listeners ({limit}) for event {event} exceeded")]
    ListenerLimitExceeded {
        /// Event the registration targeted.
        event: String,
        /// Configured cap.
        limit: usize,
    },

    /// A handler returned an error during dispatch.
    #[error("handler for event {event} failed: {source}")]
    Handler {
        /// Event being dispatched.
        event: String,
        /// The handler's error.
        source: HandlerError,
    },

    /// A handler panicked during dispatch. Only ever reported to a debug sink;
    /// without one the panic is resumed on the caller.
    #[error("handler for event {event} panicked: {message}")]
    HandlerPanicked {
        /// Event being dispatched.
        event: String,
        /// Panic message, when it was a string.
        message: String,
    },

    /// A typed handler received a payload of a different type.
    #[error("payload for event {event} is not a {expected}")]
    PayloadTypeMismatch {
        /// Event being dispatched.
        event: String,
        /// Type name the handler expected.
        expected: &'static str,
    },

    /// Emitter configuration could not be parsed.
    #[error("invalid emitter configuration: {0}")]
    InvalidConfig(String),
}

impl EmitterError {
    pub(crate) fn unknown_event(event: &str) -> Self {
        Self::UnknownEvent {
            event: event.to_owned(),
        }
    }

    /// Name of the event this error concerns, if any.
    #[must_use]
    pub fn event(&self) -> Option<&str> {
        match self {
            Self::UnknownEvent { event }
            | Self::ListenerLimitExceeded { event, .. }
            | Self::Handler { event, .. }
            | Self::HandlerPanicked { event, .. }
            | Self::PayloadTypeMismatch { event, .. } => Some(event),
            Self::DuplicateEventNames { .. } | Self::InvalidConfig(_) => None,
        }
    }
}

/// Result type for emitter operations.
pub type EmitterResult<T> = Result<T, EmitterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_message_lists_names() {
        let err = EmitterError::DuplicateEventNames {
            names: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "event names must be unique: a, b");
        assert!(err.event().is_none());
    }

    #[test]
    fn test_limit_message_names_event_and_limit() {
        let err = EmitterError::ListenerLimitExceeded {
            event: "x".to_string(),
            limit: 1,
        };
        assert_eq!(err.to_string(), "max listeners (1) for event x exceeded");
        assert_eq!(err.event(), Some("x"));
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let err = EmitterError::Handler {
            event: "y".to_string(),
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "handler for event y failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
