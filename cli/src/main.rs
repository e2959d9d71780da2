//! batchwalk - Command-line interface for the walk engine.
//!
//! Exposes the sample-script operations as subcommands: `run` shells out
//! to an external tool per matched file, `count` totals line counts, and
//! `list` emits one CSV record per match. Argument parsing, the progress
//! bar and the conflict prompt live here; the traversal itself is the
//! engine's.

mod progress;

use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

use engine::{
    create_run, estimate_run, execute_run, BatchRun, CsvListOp, DirSource, ExternalToolOp,
    FileLog, LineCountOp, LocalDirSource, NullLog, Operation, RunSummary, SubPath, SystemInvoker,
};
use progress::{ConflictPolicy, ConsoleHooks};

/// batchwalk - apply batch operations to files matched by a name mask
#[derive(Parser, Debug)]
#[command(name = "batchwalk")]
#[command(version)]
#[command(about = "Walk directories and apply a batch operation to matched files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an external tool once per matched file
    Run {
        #[command(flatten)]
        walk: WalkOpts,

        /// Program to execute
        #[arg(long, value_name = "PROGRAM")]
        tool: String,

        /// Tool argument; repeatable, {in} and {out} expand per file
        #[arg(long = "tool-arg", value_name = "ARG")]
        tool_args: Vec<String>,

        /// Extension of the per-file output (enables conflict prompts)
        #[arg(long, value_name = "EXT")]
        out_ext: Option<String>,
    },

    /// Count lines across all matched files
    Count {
        #[command(flatten)]
        walk: WalkOpts,
    },

    /// List matched files as CSV
    List {
        #[command(flatten)]
        walk: WalkOpts,

        /// Write the CSV here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct WalkOpts {
    /// Source directory bounding the walk
    #[arg(long, value_name = "PATH")]
    source: PathBuf,

    /// Root items inside the source (default: every top-level entry)
    #[arg(value_name = "ITEM")]
    roots: Vec<String>,

    /// Name mask, e.g. "*.jpg;*.png"; prefix | to invert
    #[arg(long, default_value = "*")]
    mask: String,

    /// Append walk log lines to this file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Conflict policy: yes, skip or ask
    #[arg(long, value_name = "POLICY", default_value = "ask")]
    overwrite: String,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

/// A source with an estimated run, ready to execute.
struct PreparedWalk {
    source: LocalDirSource,
    run: BatchRun,
    total_bytes: u64,
}

fn main() {
    let cli = Cli::parse();
    let code = match run_command(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            2
        }
    };
    process::exit(code);
}

fn run_command(command: Command) -> Result<i32, Box<dyn std::error::Error>> {
    match command {
        Command::Run {
            walk,
            tool,
            tool_args,
            out_ext,
        } => {
            let mut prepared = prepare(&walk)?;
            let mut op = ExternalToolOp::new(tool, tool_args, &walk.source, SystemInvoker);
            if let Some(ext) = out_ext {
                op = op.with_output_ext(ext);
            }
            let summary = execute(&walk, &mut prepared, &mut op)?;
            Ok(exit_code(&summary))
        }

        Command::Count { walk } => {
            let mut prepared = prepare(&walk)?;
            let mut op = LineCountOp::new(&walk.source);
            let summary = execute(&walk, &mut prepared, &mut op)?;
            println!(
                "{} line(s) in {} file(s)",
                op.total_lines(),
                op.files_counted()
            );
            Ok(exit_code(&summary))
        }

        Command::List { walk, output } => {
            let mut prepared = prepare(&walk)?;
            match output {
                Some(path) => {
                    let file = File::create(&path)?;
                    let mut op = CsvListOp::new(file);
                    let summary = execute(&walk, &mut prepared, &mut op)?;
                    op.finish()?;
                    Ok(exit_code(&summary))
                }
                None => {
                    let mut op = CsvListOp::new(io::stdout());
                    let summary = execute(&walk, &mut prepared, &mut op)?;
                    op.finish()?;
                    Ok(exit_code(&summary))
                }
            }
        }
    }
}

/// Builds the source, resolves default roots, validates the request and
/// runs the estimate pass.
fn prepare(walk: &WalkOpts) -> Result<PreparedWalk, Box<dyn std::error::Error>> {
    let source = LocalDirSource::new(&walk.source);
    let roots = if walk.roots.is_empty() {
        top_level_roots(&source)?
    } else {
        walk.roots.clone()
    };

    let mut run = create_run(&source, roots, &walk.mask)?;
    let estimate = estimate_run(&mut run, &source)?;
    if !walk.quiet {
        eprintln!(
            "{} file(s) matched, {}",
            estimate.item_count,
            format_bytes(estimate.total_bytes)
        );
    }

    Ok(PreparedWalk {
        source,
        run,
        total_bytes: estimate.total_bytes,
    })
}

/// Every top-level entry of the source, directories first.
fn top_level_roots(source: &LocalDirSource) -> io::Result<Vec<String>> {
    let root = SubPath::root();
    let mut names = source.list_subdirectories(&root)?;
    names.extend(source.list_files(&root)?.into_iter().map(|e| e.name));
    Ok(names)
}

fn execute(
    walk: &WalkOpts,
    prepared: &mut PreparedWalk,
    op: &mut dyn Operation,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let policy = parse_policy(&walk.overwrite)?;
    let mut hooks = ConsoleHooks::new(prepared.total_bytes, policy, walk.quiet);

    let summary = match &walk.log {
        Some(path) => {
            let mut log = FileLog::open(path)?;
            let summary =
                execute_run(&mut prepared.run, &prepared.source, op, &mut hooks, &mut log)?;
            log.flush()?;
            summary
        }
        None => execute_run(
            &mut prepared.run,
            &prepared.source,
            op,
            &mut hooks,
            &mut NullLog,
        )?,
    };

    hooks.finish();
    print_summary(&summary);
    Ok(summary)
}

fn parse_policy(s: &str) -> Result<ConflictPolicy, String> {
    match s {
        "yes" => Ok(ConflictPolicy::Yes),
        "skip" => Ok(ConflictPolicy::Skip),
        "ask" => Ok(ConflictPolicy::Ask),
        _ => Err(format!(
            "unknown overwrite policy: {} (expected yes, skip or ask)",
            s
        )),
    }
}

fn print_summary(summary: &RunSummary) {
    eprintln!(
        "{}: {} processed, {} skipped, {} failed, {} / {}",
        if summary.cancelled { "Cancelled" } else { "Done" },
        summary.items_processed,
        summary.items_skipped,
        summary.error_count,
        format_bytes(summary.bytes_processed),
        format_bytes(summary.bytes_total),
    );
}

fn exit_code(summary: &RunSummary) -> i32 {
    if summary.cancelled || summary.error_count > 0 {
        1
    } else {
        0
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        assert_eq!(parse_policy("yes").unwrap(), ConflictPolicy::Yes);
        assert_eq!(parse_policy("skip").unwrap(), ConflictPolicy::Skip);
        assert_eq!(parse_policy("ask").unwrap(), ConflictPolicy::Ask);
        assert!(parse_policy("maybe").is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_top_level_roots_lists_everything() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::create_dir(temp_dir.path().join("sub")).expect("Failed to create dir");
        std::fs::write(temp_dir.path().join("a.txt"), b"x").expect("Failed to write file");

        let source = LocalDirSource::new(temp_dir.path());
        let mut roots = top_level_roots(&source).expect("Failed to list roots");
        roots.sort();
        assert_eq!(roots, vec!["a.txt".to_string(), "sub".to_string()]);
    }
}
