//! Emitter configuration.

use serde::{Deserialize, Serialize};

/// Listener count on a single event name past which registration logs a
/// possible-leak warning.
pub const DEFAULT_LEAK_WARNING_THRESHOLD: usize = 10;

/// Options for [`EventEmitter::with_config`](crate::EventEmitter::with_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmitterConfig {
    /// Treat a panicking listener as a failed invocation instead of letting
    /// the panic unwind out of `emit`.
    pub catch_panics: bool,
    /// `None` disables the warning.
    pub leak_warning_threshold: Option<usize>,
}

impl EmitterConfig {
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    pub fn with_leak_warning_threshold(mut self, threshold: Option<usize>) -> Self {
        self.leak_warning_threshold = threshold;
        self
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            leak_warning_threshold: Some(DEFAULT_LEAK_WARNING_THRESHOLD),
        }
    }
}
