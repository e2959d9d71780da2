//! Line-oriented log sinks.
//!
//! The original scripts each appended to their own plain-text log file;
//! the walker keeps that shape behind the LogSink trait. Item failures,
//! skips and the final summary go through it.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Receives one line of log text at a time.
///
/// Sinks are best-effort: a failing sink must not abort the walk, so
/// `write_line` does not return a Result.
pub trait LogSink {
    fn write_line(&mut self, line: &str);
}

/// Sink that discards everything.
pub struct NullLog;

impl LogSink for NullLog {
    fn write_line(&mut self, _line: &str) {}
}

/// Append-mode log file with a local timestamp per line.
pub struct FileLog {
    writer: BufWriter<File>,
}

impl FileLog {
    /// Opens (or creates) the log file for appending.
    pub fn open(path: &Path) -> io::Result<FileLog> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(FileLog {
            writer: BufWriter::new(file),
        })
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl LogSink for FileLog {
    fn write_line(&mut self, line: &str) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(self.writer, "[{}] {}", stamp, line);
    }
}

/// In-memory sink for tests and for callers that render the log
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Vec<String>,
}

impl MemoryLog {
    pub fn new() -> Self {
        MemoryLog::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl LogSink for MemoryLog {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}
