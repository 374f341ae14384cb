//! Console rendering of accepted thoughts.
//!
//! Each accepted submission can be rendered as a box-drawn frame on a
//! diagnostic stream. The frame is cosmetic: it is never part of the
//! response payload and write failures are swallowed.

use crate::models::ThoughtRecord;
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const RESET: &str = "\x1b[0m";

/// Classification of a thought for rendering.
///
/// Uses the same branch trigger as the tracker's mutation path, so the frame
/// header always agrees with what was recorded.
#[derive(Clone, Copy)]
enum ThoughtKind<'a> {
    Revision { revises: Option<i64> },
    Branch { from: i64, id: &'a str },
    Plain,
}

fn classify(record: &ThoughtRecord) -> ThoughtKind<'_> {
    if record.is_revision {
        return ThoughtKind::Revision {
            revises: record.revises_thought,
        };
    }
    if let (Some(from), Some(id)) = (record.branch_from_thought, record.branch_registration()) {
        return ThoughtKind::Branch { from, id };
    }
    ThoughtKind::Plain
}

/// Renders a thought as a box-drawn frame.
///
/// The header carries the step position against the (normalized) total plus
/// revision or branch context; the body is the thought text. Border width is
/// the longer of the two lines plus padding, measured on the uncolored text.
#[must_use]
pub fn format_frame(record: &ThoughtRecord, total_thoughts: i64) -> String {
    let kind = classify(record);

    let prefix = match kind {
        ThoughtKind::Revision { .. } => "🔄 Revision",
        ThoughtKind::Branch { .. } => "🌿 Branch",
        ThoughtKind::Plain => "💭 Thought",
    };
    let context = match kind {
        ThoughtKind::Revision { revises: Some(n) } => format!(" (revising thought {n})"),
        ThoughtKind::Branch { from, id } => format!(" (from thought {from}, ID: {id})"),
        _ => String::new(),
    };
    let color = match kind {
        ThoughtKind::Revision { .. } => YELLOW,
        ThoughtKind::Branch { .. } => GREEN,
        ThoughtKind::Plain => BLUE,
    };

    let header = format!(
        "{prefix} {}/{}{context}",
        record.thought_number, total_thoughts
    );
    let colored_header = header.replacen(prefix, &format!("{color}{prefix}{RESET}"), 1);

    // Layout is computed on uncolored text; escape sequences have no width.
    let header_len = header.chars().count();
    let thought_len = record.thought.chars().count();
    let border_len = header_len.max(thought_len) + 4;
    let border = "─".repeat(border_len);

    format!(
        "\n┌{border}┐\n│ {colored_header}{} │\n├{border}┤\n│ {}{} │\n└{border}┘",
        " ".repeat(border_len - header_len - 2),
        record.thought,
        " ".repeat(border_len - thought_len - 2),
    )
}

/// Best-effort sink for rendered thought frames.
///
/// Construction decides the destination once; afterwards the sink is
/// immutable. A disabled sink renders nothing. Write failures never
/// surface to callers.
pub struct ThoughtLog {
    sink: Option<Mutex<Box<dyn Write + Send>>>,
}

impl ThoughtLog {
    /// A sink that discards everything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { sink: None }
    }

    /// A sink writing frames to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::to_writer(Box::new(std::io::stderr()))
    }

    /// A sink appending frames to the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn to_file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::OperationFailed {
                operation: "open_thought_log".to_string(),
                cause: format!("{}: {}", path.display(), e),
            })?;
        Ok(Self::to_writer(Box::new(file)))
    }

    /// A sink writing frames to an arbitrary writer.
    #[must_use]
    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Some(Mutex::new(writer)),
        }
    }

    /// Whether this sink renders anything at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Renders `record` and writes the frame, best-effort.
    pub fn record(&self, record: &ThoughtRecord, total_thoughts: i64) {
        let Some(sink) = &self.sink else {
            return;
        };

        let frame = format_frame(record, total_thoughts);
        let mut writer = sink.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{frame}");
        let _ = writer.flush();
    }
}

impl Default for ThoughtLog {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Writer handle whose contents outlive the sink that owns it.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            let guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&guard).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn record(thought: &str) -> ThoughtRecord {
        ThoughtRecord {
            thought: thought.to_string(),
            thought_number: 1,
            total_thoughts: 1,
            ..ThoughtRecord::default()
        }
    }

    #[test]
    fn test_plain_frame_contents() {
        let frame = format_frame(&record("think"), 3);

        assert!(frame.contains("💭 Thought"));
        assert!(frame.contains("1/3"));
        assert!(frame.contains("think"));
        assert!(frame.contains(BLUE));
    }

    #[test]
    fn test_revision_frame_contents() {
        let mut rec = record("revise");
        rec.is_revision = true;
        rec.revises_thought = Some(2);

        let frame = format_frame(&rec, 3);
        assert!(frame.contains("🔄 Revision"));
        assert!(frame.contains("(revising thought 2)"));
        assert!(frame.contains(YELLOW));
    }

    #[test]
    fn test_revision_without_target_has_no_context() {
        let mut rec = record("revise");
        rec.is_revision = true;

        let frame = format_frame(&rec, 3);
        assert!(frame.contains("🔄 Revision"));
        assert!(!frame.contains("revising thought"));
    }

    #[test]
    fn test_branch_frame_contents() {
        let mut rec = record("fork");
        rec.branch_from_thought = Some(1);
        rec.branch_id = Some("b1".to_string());

        let frame = format_frame(&rec, 3);
        assert!(frame.contains("🌿 Branch"));
        assert!(frame.contains("(from thought 1, ID: b1)"));
        assert!(frame.contains(GREEN));
    }

    #[test]
    fn test_branch_id_alone_renders_as_plain_thought() {
        // Same gate as the tracker: no branching point, no branch frame.
        let mut rec = record("not a fork");
        rec.branch_id = Some("b1".to_string());

        let frame = format_frame(&rec, 1);
        assert!(frame.contains("💭 Thought"));
    }

    #[test]
    fn test_frame_lines_align() {
        let frame = format_frame(&record("a much longer thought than the header"), 1);

        let uncolored = frame.replace(BLUE, "").replace(RESET, "");
        let widths: Vec<usize> = uncolored
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| l.chars().count())
            .collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{uncolored}");
    }

    #[test]
    fn test_disabled_sink_is_silent() {
        let log = ThoughtLog::disabled();
        assert!(!log.is_enabled());
        // Must not panic or block.
        log.record(&record("quiet"), 1);
    }

    #[test]
    fn test_writer_sink_receives_frame() {
        let buf = SharedBuf::default();
        let log = ThoughtLog::to_writer(Box::new(buf.clone()));
        assert!(log.is_enabled());

        log.record(&record("log this"), 1);

        let written = buf.contents();
        assert!(written.contains("log this"));
        assert!(written.contains("Thought"));
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thoughts.log");

        let log = ThoughtLog::to_file(&path).unwrap();
        log.record(&record("persisted"), 1);
        log.record(&record("persisted again"), 1);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("persisted"));
        assert!(written.contains("persisted again"));
    }
}
