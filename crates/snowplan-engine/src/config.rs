//! Session configuration

use std::time::Duration;

/// Tuning for a project session
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Quiet period after the last content edit before a write is issued
    pub debounce_window: Duration,
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(1000),
        }
    }
}
