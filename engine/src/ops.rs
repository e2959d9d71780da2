//! Built-in operations.
//!
//! The operations the original automation scripts performed per file,
//! expressed against the `Operation` trait:
//! - ExternalToolOp: run an external converter/unpacker per file
//! - LineCountOp: total line counts over the matched set
//! - CsvListOp: write one CSV record per matched file
//!
//! All of them are ordinary `Operation` implementations; the walker does
//! not know which one it is driving.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::exec::ProcessInvoker;
use crate::model::{Item, OperationResult};
use crate::walker::Operation;

/// Placeholder in an argument template for the input file path.
pub const ARG_IN: &str = "{in}";
/// Placeholder in an argument template for the output file path.
pub const ARG_OUT: &str = "{out}";

/// Runs an external executable once per matched file.
///
/// Argument templates may contain `{in}` (full input path) and `{out}`
/// (input path with the extension replaced by `output_ext`). When an
/// output extension is configured, an already-existing output file is
/// reported as a conflict so the walker can route it through the
/// caller's decision hook.
pub struct ExternalToolOp<I: ProcessInvoker> {
    program: String,
    arg_template: Vec<String>,
    output_ext: Option<String>,
    base: PathBuf,
    invoker: I,
}

impl<I: ProcessInvoker> ExternalToolOp<I> {
    pub fn new(
        program: impl Into<String>,
        arg_template: Vec<String>,
        base: impl Into<PathBuf>,
        invoker: I,
    ) -> Self {
        ExternalToolOp {
            program: program.into(),
            arg_template,
            output_ext: None,
            base: base.into(),
            invoker,
        }
    }

    /// Extension (without the dot) of the per-file output path.
    pub fn with_output_ext(mut self, ext: impl Into<String>) -> Self {
        self.output_ext = Some(ext.into());
        self
    }

    fn input_path(&self, item: &Item) -> PathBuf {
        item.sub_path().join(&self.base)
    }

    fn output_path(&self, item: &Item) -> Option<PathBuf> {
        let ext = self.output_ext.as_ref()?;
        let mut path = self.input_path(item);
        path.set_extension(ext);
        Some(path)
    }

    fn expand_args(&self, input: &Path, output: Option<&Path>) -> Vec<String> {
        self.arg_template
            .iter()
            .map(|template| {
                let mut arg = template.replace(ARG_IN, &input.to_string_lossy());
                if let Some(out) = output {
                    arg = arg.replace(ARG_OUT, &out.to_string_lossy());
                }
                arg
            })
            .collect()
    }
}

impl<I: ProcessInvoker> Operation for ExternalToolOp<I> {
    fn label(&self) -> &str {
        &self.program
    }

    fn has_conflict(&self, item: &Item) -> bool {
        match self.output_path(item) {
            Some(out) => out.exists(),
            None => false,
        }
    }

    fn apply(&mut self, item: &Item) -> OperationResult {
        let input = self.input_path(item);
        let output = self.output_path(item);
        let args = self.expand_args(&input, output.as_deref());

        match self.invoker.invoke(&self.program, &args) {
            Ok(0) => OperationResult::Success,
            Ok(code) => OperationResult::Failed(format!("exit code {}", code)),
            Err(e) => OperationResult::Failed(e.to_string()),
        }
    }
}

/// Counts lines across every matched file.
pub struct LineCountOp {
    base: PathBuf,
    total_lines: u64,
    files_counted: u64,
}

impl LineCountOp {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        LineCountOp {
            base: base.into(),
            total_lines: 0,
            files_counted: 0,
        }
    }

    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }

    pub fn files_counted(&self) -> u64 {
        self.files_counted
    }
}

impl Operation for LineCountOp {
    fn label(&self) -> &str {
        "count"
    }

    fn apply(&mut self, item: &Item) -> OperationResult {
        let path = item.sub_path().join(&self.base);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => return OperationResult::Failed(e.to_string()),
        };

        let mut lines = 0u64;
        for line in BufReader::new(file).lines() {
            if let Err(e) = line {
                return OperationResult::Failed(e.to_string());
            }
            lines += 1;
        }

        self.total_lines += lines;
        self.files_counted += 1;
        OperationResult::Success
    }
}

#[derive(Debug, Serialize)]
struct ListRecord<'a> {
    directory: String,
    name: &'a str,
    size_bytes: u64,
}

/// Writes one CSV record (directory, name, size) per matched file.
pub struct CsvListOp<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvListOp<W> {
    pub fn new(writer: W) -> Self {
        CsvListOp {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

impl<W: Write> Operation for CsvListOp<W> {
    fn label(&self) -> &str {
        "list"
    }

    fn apply(&mut self, item: &Item) -> OperationResult {
        let record = ListRecord {
            directory: item.parent.to_string(),
            name: &item.name,
            size_bytes: item.size_bytes,
        };
        match self.writer.serialize(record) {
            Ok(()) => OperationResult::Success,
            Err(e) => OperationResult::Failed(e.to_string()),
        }
    }
}
