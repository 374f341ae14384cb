//! Runtime configuration.
//!
//! Configuration is resolved once by the process entry point (CLI flags
//! with environment fallbacks) and handed to the components that need it.
//! Nothing in the core reads the environment directly.

use crate::Result;
use crate::rendering::ThoughtLog;
use std::path::PathBuf;

/// Settings for the thought-tracking server.
#[derive(Debug, Clone, Default)]
pub struct ThinkingConfig {
    /// Whether accepted thoughts are rendered to the diagnostic stream.
    pub log_thoughts: bool,
    /// Frame destination; stderr when unset.
    pub thought_log: Option<PathBuf>,
}

impl ThinkingConfig {
    /// Creates a configuration with rendering disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether accepted thoughts are rendered.
    #[must_use]
    pub const fn with_log_thoughts(mut self, enabled: bool) -> Self {
        self.log_thoughts = enabled;
        self
    }

    /// Sets a file destination for rendered thoughts.
    #[must_use]
    pub fn with_thought_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.thought_log = Some(path.into());
        self
    }

    /// Builds the diagnostic sink this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured log file cannot be opened.
    pub fn build_log(&self) -> Result<ThoughtLog> {
        if !self.log_thoughts {
            return Ok(ThoughtLog::disabled());
        }
        match &self.thought_log {
            Some(path) => ThoughtLog::to_file(path),
            None => Ok(ThoughtLog::stderr()),
        }
    }
}
