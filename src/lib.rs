//! # Seqthink
//!
//! A sequential thinking MCP server for dynamic, step-by-step problem solving.
//!
//! Seqthink exposes a single stateful tool, `sequentialthinking`, over the
//! Model Context Protocol. Callers submit one reasoning step ("thought") at a
//! time; the server validates each step, records it in process-wide history,
//! tracks named branches of the reasoning tree, and returns a compact status
//! snapshot the caller can build on.
//!
//! ## Features
//!
//! - Single-binary distribution, stdio transport by default
//! - Optional HTTP transport (`http` cargo feature)
//! - Concurrency-safe thought history and branch tracking
//! - Optional box-drawn console rendering of accepted thoughts
//!
//! ## Example
//!
//! ```rust
//! use seqthink::{ThoughtRecord, ThoughtTracker};
//!
//! let tracker = ThoughtTracker::default();
//! let snapshot = tracker.submit(&ThoughtRecord {
//!     thought: "Break the problem into subgoals".to_string(),
//!     next_thought_needed: true,
//!     thought_number: 1,
//!     total_thoughts: 3,
//!     ..ThoughtRecord::default()
//! })?;
//! assert_eq!(snapshot.thought_history_length, 1);
//! # Ok::<(), seqthink::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod mcp;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod tracker;

// Re-exports for convenience
pub use config::ThinkingConfig;
pub use models::{ThoughtRecord, ThoughtSnapshot};
pub use rendering::ThoughtLog;
pub use tracker::ThoughtTracker;

/// Error type for seqthink operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Missing/empty required fields, non-positive step numbers, malformed tool arguments, unknown tool names |
/// | `OperationFailed` | Transport I/O errors, listener bind failures, observability init failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - `thought` is empty
    /// - `thoughtNumber` or `totalThoughts` is not positive
    /// - Tool arguments fail to deserialize
    /// - An unknown tool name is called
    ///
    /// Always raised before any state mutation; the tracker is left
    /// unchanged when a submission fails validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised by the transport and process plumbing, never by
    /// [`ThoughtTracker::submit`]:
    /// - stdio read/write errors
    /// - HTTP listener bind or serve failures
    /// - Logging initialization failures
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for seqthink operations.
pub type Result<T> = std::result::Result<T, Error>;
