//! Tidings Test - Shared test utilities for the Tidings crates.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! tidings-test.workspace = true
//! ```
//!
//! ```rust
//! use tidings_test::CallRecorder;
//!
//! let recorder = CallRecorder::new();
//! let sink = recorder.clone();
//! let callback = move |value: &str| sink.record(value.to_string());
//!
//! callback("a");
//! callback("b");
//! assert_eq!(recorder.calls(), vec!["a", "b"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod recorder;

pub use recorder::CallRecorder;

use std::sync::Once;
use tidings_telemetry::{LogConfig, LogFormat};

static TRACING: Once = Once::new();

/// Install a compact, timestamp-free subscriber for tests.
///
/// The level comes from `TIDINGS_TEST_LOG` (default `warn`). Safe to call from
/// every test; only the first call in a process does anything, and a
/// subscriber installed elsewhere is left in place.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let level = std::env::var("TIDINGS_TEST_LOG").unwrap_or_else(|_| "warn".to_string());
        let config = LogConfig::new(level)
            .with_format(LogFormat::Compact)
            .without_timestamps()
            .without_ansi();

        if let Err(e) = tidings_telemetry::setup_logging(&config) {
            tracing::debug!(error = %e, "Test tracing not installed");
        }
    });
}
