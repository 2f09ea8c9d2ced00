//! Build log sinks for user-facing retrieval output.

use std::sync::{Mutex, PoisonError};

use tracing::info;

/// Line-oriented log of the build that requested a library.
pub trait BuildLog: Send + Sync {
    /// Append one line.
    fn line(&self, message: &str);
}

/// Forwards build log lines to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl BuildLog for TracingLog {
    fn line(&self, message: &str) {
        info!(target: "oraslib::build_log", "{message}");
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BuildLog for MemoryLog {
    fn line(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
