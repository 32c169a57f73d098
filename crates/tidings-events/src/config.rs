//! Emitter configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{EmitterError, EmitterResult};

/// Sink that receives handler failures instead of the dispatch caller.
pub type DebugSink = Arc<dyn Fn(&EmitterError) + Send + Sync>;

/// Configuration applied when an emitter is constructed.
///
/// Only `max_listeners` is (de)serializable; the debug sink is a runtime
/// value and has to be attached with [`EmitterConfig::with_debug_sink`].
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Per-event cap on concurrently registered handlers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_listeners: Option<usize>,
    /// Receives handler errors and panics raised during dispatch. When unset,
    /// the first handler failure aborts the dispatch and reaches the caller.
    #[serde(skip)]
    pub debug: Option<DebugSink>,
}

impl fmt::Debug for EmitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterConfig")
            .field("max_listeners", &self.max_listeners)
            .field("debug", &self.debug.is_some())
            .finish()
    }
}

impl EmitterConfig {
    /// Create a configuration with no listener cap and no debug sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of handlers registered per event.
    #[must_use]
    pub fn with_max_listeners(mut self, limit: usize) -> Self {
        self.max_listeners = Some(limit);
        self
    }

    /// Route handler failures to `sink` and keep dispatching.
    #[must_use]
    pub fn with_debug_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&EmitterError) + Send + Sync + 'static,
    {
        self.debug = Some(Arc::new(sink));
        self
    }

    /// Parse the serializable part of a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidConfig`] if the document is malformed or
    /// a field has the wrong type.
    pub fn from_toml_str(input: &str) -> EmitterResult<Self> {
        toml::from_str(input).map_err(|e| EmitterError::InvalidConfig(e.to_string()))
    }
}
