//! Pluggable progress logging
//!
//! The engine reports progress through a single-line [`LogSink`] capability:
//! poll status changes, transfer rates and every escalated failure go
//! through it. The default sink writes timestamped lines to standard output;
//! callers embedding the library can substitute their own implementation.

use std::time::Duration;

/// Receives human-readable progress lines from the engine
///
/// Implementations must be cheap and non-blocking; the engine calls `emit`
/// from the poll loop and the download stream.
pub trait LogSink: Send + Sync {
    /// Deliver one line of progress output
    fn emit(&self, line: &str);
}

/// Default sink: timestamped lines on standard output
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn emit(&self, line: &str) {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        println!("{now} {line}");
    }
}

/// Sink that discards every line
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, _line: &str) {}
}

/// Render a byte count with a binary-prefix unit, e.g. "1.5 MB"
pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// Render an elapsed duration compactly, e.g. "42s" or "3m12s"
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}
