//! Walk orchestration module.
//!
//! This module provides the run lifecycle functions:
//! - Creating a run from root items and a mask (`create_run`)
//! - Estimating a run (`estimate_run`, pass 1: count and total bytes)
//! - Executing a run (`execute_run`, pass 2: apply the operation)
//!
//! Both passes visit the tree in the same shape: at every directory
//! level, subdirectories depth-first before files, in the source's
//! native enumeration order. The mask is applied identically in both
//! passes, so execution never touches an item the estimate did not
//! count (assuming the tree is unchanged between the passes).

use std::io;
use std::time::SystemTime;
use uuid::Uuid;

use crate::error::WalkerError;
use crate::fs::DirSource;
use crate::hooks::WalkHooks;
use crate::logsink::LogSink;
use crate::mask::MaskGroup;
use crate::model::{
    BatchRun, Decision, Estimate, Item, ItemKind, OperationResult, Phase, RunState, RunSummary,
    StickyDecision, SubPath, WalkRequest,
};

/// The per-item action a walk applies.
///
/// Operations are polymorphic over what actually happens to a file
/// (convert, unpack, count, list); the walker only sees the outcome.
pub trait Operation {
    /// Short label used in log lines.
    fn label(&self) -> &str;

    /// True when applying to `item` would collide with existing output
    /// (e.g., the destination file already exists). A conflicting item is
    /// routed through the caller's decision hook before `apply`.
    fn has_conflict(&self, item: &Item) -> bool {
        let _ = item;
        false
    }

    /// Applies the action to one matched file.
    fn apply(&mut self, item: &Item) -> OperationResult;
}

/// Creates a run over `roots` (names of top-level entries under the
/// source) filtered by `mask`.
///
/// # Errors
/// Returns `InvalidMask` if the mask fails to validate and
/// `RootNotFound` if any root does not exist under the source. Nothing
/// is walked yet; the run starts in `Phase::Idle`.
pub fn create_run(
    source: &dyn DirSource,
    roots: Vec<String>,
    mask: &str,
) -> Result<BatchRun, WalkerError> {
    let mask = MaskGroup::parse(mask)?;

    for root in &roots {
        let path = SubPath::root().child(root);
        if let Err(e) = source.stat(&path) {
            if e.kind() == io::ErrorKind::NotFound {
                return Err(WalkerError::RootNotFound { root: root.clone() });
            }
            return Err(WalkerError::DirectoryRead {
                path: path.to_path(),
                source: e,
            });
        }
    }

    Ok(BatchRun {
        id: Uuid::new_v4(),
        request: WalkRequest { roots, mask },
        phase: Phase::Idle,
        estimate: None,
        state: RunState::default(),
        created_at: SystemTime::now(),
        start_time: None,
        end_time: None,
    })
}

/// First pass: walks the request's tree, counts the files matched by the
/// mask and sums their sizes. Mutates no filesystem state.
///
/// # Errors
/// Returns `WrongPhase` if the run is not idle and `DirectoryRead` if
/// any directory in the tree cannot be enumerated; a failed estimate
/// records nothing on the run.
pub fn estimate_run(
    run: &mut BatchRun,
    source: &dyn DirSource,
) -> Result<Estimate, WalkerError> {
    if run.phase != Phase::Idle {
        return Err(WalkerError::WrongPhase {
            expected: Phase::Idle,
            actual: run.phase,
        });
    }

    run.phase = Phase::Estimating;
    let result = estimate_roots(&run.request, source);
    run.phase = Phase::Idle;

    let estimate = result?;
    run.estimate = Some(estimate);
    Ok(estimate)
}

fn estimate_roots(
    request: &WalkRequest,
    source: &dyn DirSource,
) -> Result<Estimate, WalkerError> {
    let mut estimate = Estimate {
        item_count: 0,
        total_bytes: 0,
    };
    for root in &request.roots {
        let path = SubPath::root().child(root);
        let (kind, size) = source.stat(&path).map_err(|e| WalkerError::DirectoryRead {
            path: path.to_path(),
            source: e,
        })?;
        match kind {
            ItemKind::File => {
                if request.mask.matches(root) {
                    estimate.item_count += 1;
                    estimate.total_bytes += size;
                }
            }
            ItemKind::Directory => estimate_dir(&path, request, source, &mut estimate)?,
        }
    }
    Ok(estimate)
}

fn estimate_dir(
    dir: &SubPath,
    request: &WalkRequest,
    source: &dyn DirSource,
    estimate: &mut Estimate,
) -> Result<(), WalkerError> {
    let subdirs = source
        .list_subdirectories(dir)
        .map_err(|e| WalkerError::DirectoryRead {
            path: dir.to_path(),
            source: e,
        })?;
    for name in subdirs {
        estimate_dir(&dir.child(&name), request, source, estimate)?;
    }

    let files = source.list_files(dir).map_err(|e| WalkerError::DirectoryRead {
        path: dir.to_path(),
        source: e,
    })?;
    for entry in files {
        if request.mask.matches(&entry.name) {
            estimate.item_count += 1;
            estimate.total_bytes += entry.size_bytes;
        }
    }
    Ok(())
}

/// Second pass: revisits the estimated tree and applies `op` to every
/// matched file.
///
/// Per-item failures (operation failed, directory unreadable) are
/// counted, written to `log` and never abort the run. Conflicts go
/// through `hooks.on_decision` unless a YesToAll/SkipAll is already
/// sticky for this run. Cancellation (a Cancel decision, an operation
/// returning Cancelled, or `hooks.cancelled()`) unwinds the walk
/// promptly; the in-flight operation is never interrupted.
///
/// Both terminal phases (Done, Cancelled) yield a full summary.
///
/// # Errors
/// Returns `WrongPhase` when the run has not been estimated or has
/// already executed.
pub fn execute_run(
    run: &mut BatchRun,
    source: &dyn DirSource,
    op: &mut dyn Operation,
    hooks: &mut dyn WalkHooks,
    log: &mut dyn LogSink,
) -> Result<RunSummary, WalkerError> {
    if run.phase != Phase::Idle {
        return Err(WalkerError::WrongPhase {
            expected: Phase::Idle,
            actual: run.phase,
        });
    }
    let estimate = run.estimate.ok_or(WalkerError::WrongPhase {
        expected: Phase::Estimating,
        actual: run.phase,
    })?;

    run.phase = Phase::Executing;
    run.start_time = Some(SystemTime::now());
    run.state = RunState::default();
    run.state.bytes_total = estimate.total_bytes;

    log.write_line(&format!(
        "run {}: {} mask \"{}\", {} root(s), {} item(s) / {} byte(s) estimated",
        run.id,
        op.label(),
        run.request.mask.as_str(),
        run.request.roots.len(),
        estimate.item_count,
        estimate.total_bytes,
    ));

    {
        let mut pass = ExecPass {
            request: &run.request,
            source,
            op,
            hooks,
            log,
            state: &mut run.state,
        };
        pass.walk_roots();
    }

    run.end_time = Some(SystemTime::now());
    run.phase = if run.state.cancelled {
        Phase::Cancelled
    } else {
        Phase::Done
    };

    let summary = run.state.summary();
    log.write_line(&format!(
        "run {}: {} ({} processed, {} skipped, {} failed, {}/{} bytes)",
        run.id,
        run.phase,
        summary.items_processed,
        summary.items_skipped,
        summary.error_count,
        summary.bytes_processed,
        summary.bytes_total,
    ));
    Ok(summary)
}

/// How a conflict was resolved for one item.
enum Resolution {
    Proceed,
    Skip,
    Cancel,
}

/// State of one execution pass; owns the mutable borrows for the
/// duration of the walk.
struct ExecPass<'a> {
    request: &'a WalkRequest,
    source: &'a dyn DirSource,
    op: &'a mut dyn Operation,
    hooks: &'a mut dyn WalkHooks,
    log: &'a mut dyn LogSink,
    state: &'a mut RunState,
}

impl<'a> ExecPass<'a> {
    fn walk_roots(&mut self) {
        let roots = self.request.roots.clone();
        for root in roots {
            if self.poll_cancelled() {
                return;
            }
            let path = SubPath::root().child(&root);
            match self.source.stat(&path) {
                Ok((ItemKind::File, size)) => {
                    if self.request.mask.matches(&root) {
                        let item = Item {
                            name: root.clone(),
                            parent: SubPath::root(),
                            size_bytes: size,
                            kind: ItemKind::File,
                        };
                        self.process_file(&item);
                    }
                }
                Ok((ItemKind::Directory, _)) => self.walk_dir(&path),
                Err(e) => self.record_read_error(&path, &e),
            }
            if self.state.cancelled {
                return;
            }
        }
    }

    /// Subdirectories depth-first before files, native order.
    fn walk_dir(&mut self, dir: &SubPath) {
        if self.poll_cancelled() {
            return;
        }

        let subdirs = match self.source.list_subdirectories(dir) {
            Ok(names) => names,
            Err(e) => {
                self.record_read_error(dir, &e);
                return;
            }
        };
        for name in subdirs {
            self.walk_dir(&dir.child(&name));
            if self.state.cancelled {
                return;
            }
        }

        let files = match self.source.list_files(dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.record_read_error(dir, &e);
                return;
            }
        };
        for entry in files {
            if self.request.mask.matches(&entry.name) {
                let item = Item {
                    name: entry.name,
                    parent: dir.clone(),
                    size_bytes: entry.size_bytes,
                    kind: ItemKind::File,
                };
                self.process_file(&item);
            }
            if self.state.cancelled {
                return;
            }
        }
    }

    fn process_file(&mut self, item: &Item) {
        if self.op.has_conflict(item) {
            match self.resolve_conflict(item) {
                Resolution::Proceed => self.apply(item),
                Resolution::Skip => {
                    self.state.items_skipped += 1;
                    self.state.bytes_processed += item.size_bytes;
                    self.log.write_line(&format!(
                        "{}: skipped {}",
                        self.op.label(),
                        item.sub_path()
                    ));
                }
                Resolution::Cancel => {
                    self.state.cancelled = true;
                    return;
                }
            }
        } else {
            self.apply(item);
        }

        self.hooks
            .on_progress(self.state.bytes_processed, self.state.bytes_total);
        self.poll_cancelled();
    }

    fn resolve_conflict(&mut self, item: &Item) -> Resolution {
        match self.state.sticky {
            Some(StickyDecision::YesToAll) => Resolution::Proceed,
            Some(StickyDecision::SkipAll) => Resolution::Skip,
            None => match self.hooks.on_decision(item) {
                Decision::Yes => Resolution::Proceed,
                Decision::YesToAll => {
                    self.state.sticky = Some(StickyDecision::YesToAll);
                    Resolution::Proceed
                }
                Decision::Skip => Resolution::Skip,
                Decision::SkipAll => {
                    self.state.sticky = Some(StickyDecision::SkipAll);
                    Resolution::Skip
                }
                Decision::Cancel => Resolution::Cancel,
            },
        }
    }

    fn apply(&mut self, item: &Item) {
        match self.op.apply(item) {
            OperationResult::Success => {
                self.state.items_processed += 1;
                self.state.bytes_processed += item.size_bytes;
            }
            OperationResult::Skipped => {
                self.state.items_skipped += 1;
                self.state.bytes_processed += item.size_bytes;
            }
            OperationResult::Failed(reason) => {
                self.state.error_count += 1;
                self.state.bytes_processed += item.size_bytes;
                self.log.write_line(&format!(
                    "{}: failed {}: {}",
                    self.op.label(),
                    item.sub_path(),
                    reason
                ));
            }
            OperationResult::Cancelled => {
                self.state.cancelled = true;
            }
        }
    }

    /// Per-item failures never abort the run; directory-read errors are
    /// only fatal during the estimate pass.
    fn record_read_error(&mut self, path: &SubPath, err: &io::Error) {
        self.state.error_count += 1;
        self.log.write_line(&format!(
            "{}: failed to read directory {}: {}",
            self.op.label(),
            path,
            err
        ));
    }

    fn poll_cancelled(&mut self) -> bool {
        if self.hooks.cancelled() {
            self.state.cancelled = true;
        }
        self.state.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalDirSource;
    use crate::logsink::{MemoryLog, NullLog};
    use crate::hooks::NullHooks;
    use std::collections::VecDeque;
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    fn write_file(path: &Path, contents: &[u8]) {
        let mut file = fs::File::create(path).expect("Failed to create file");
        file.write_all(contents).expect("Failed to write file");
    }

    /// Builds the tree root/{a.jpg(3), sub/{b.jpg(5), c.txt(7)}} and
    /// returns (tempdir, source).
    fn spec_tree() -> (tempfile::TempDir, LocalDirSource) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        write_file(&temp_dir.path().join("a.jpg"), b"abc");
        fs::create_dir(temp_dir.path().join("sub")).expect("Failed to create subdir");
        write_file(&temp_dir.path().join("sub").join("b.jpg"), b"12345");
        write_file(&temp_dir.path().join("sub").join("c.txt"), b"1234567");
        let source = LocalDirSource::new(temp_dir.path());
        (temp_dir, source)
    }

    /// Operation that records every applied item.
    struct RecordingOp {
        applied: Vec<String>,
        fail_all: bool,
        conflict_all: bool,
    }

    impl RecordingOp {
        fn new() -> Self {
            RecordingOp {
                applied: Vec::new(),
                fail_all: false,
                conflict_all: false,
            }
        }
    }

    impl Operation for RecordingOp {
        fn label(&self) -> &str {
            "record"
        }

        fn has_conflict(&self, _item: &Item) -> bool {
            self.conflict_all
        }

        fn apply(&mut self, item: &Item) -> OperationResult {
            self.applied.push(item.sub_path().to_string());
            if self.fail_all {
                OperationResult::Failed("forced failure".to_string())
            } else {
                OperationResult::Success
            }
        }
    }

    /// Hooks driven by a scripted list of decisions; records prompts and
    /// progress, and can raise the external cancel flag after N items.
    struct ScriptedHooks {
        decisions: VecDeque<Decision>,
        prompts: Vec<String>,
        progress: Vec<u64>,
        cancel_after_items: Option<usize>,
        cancel_flag: bool,
    }

    impl ScriptedHooks {
        fn new(decisions: Vec<Decision>) -> Self {
            ScriptedHooks {
                decisions: decisions.into(),
                prompts: Vec::new(),
                progress: Vec::new(),
                cancel_after_items: None,
                cancel_flag: false,
            }
        }
    }

    impl WalkHooks for ScriptedHooks {
        fn on_progress(&mut self, bytes_processed: u64, _bytes_total: u64) {
            self.progress.push(bytes_processed);
            if let Some(limit) = self.cancel_after_items {
                if self.progress.len() >= limit {
                    self.cancel_flag = true;
                }
            }
        }

        fn on_decision(&mut self, item: &Item) -> Decision {
            self.prompts.push(item.sub_path().to_string());
            self.decisions.pop_front().unwrap_or(Decision::Yes)
        }

        fn cancelled(&self) -> bool {
            self.cancel_flag
        }
    }

    fn estimated_run(source: &LocalDirSource, roots: Vec<&str>, mask: &str) -> BatchRun {
        let roots = roots.into_iter().map(String::from).collect();
        let mut run = create_run(source, roots, mask).expect("Failed to create run");
        estimate_run(&mut run, source).expect("Failed to estimate run");
        run
    }

    #[test]
    fn test_create_run_rejects_invalid_mask() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = LocalDirSource::new(temp_dir.path());
        let result = create_run(&source, Vec::new(), "*.jpg|*.png");
        assert!(matches!(result, Err(WalkerError::InvalidMask { .. })));
    }

    #[test]
    fn test_create_run_rejects_missing_root() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = LocalDirSource::new(temp_dir.path());
        let result = create_run(&source, vec!["nope".to_string()], "*");
        match result {
            Err(WalkerError::RootNotFound { root }) => assert_eq!(root, "nope"),
            other => panic!("expected RootNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_estimate_counts_matched_files_only() {
        let (_tmp, source) = spec_tree();
        let mut run = create_run(&source, vec!["a.jpg".into(), "sub".into()], "*.jpg")
            .expect("Failed to create run");
        let estimate = estimate_run(&mut run, &source).expect("Failed to estimate");
        assert_eq!(estimate.item_count, 2);
        assert_eq!(estimate.total_bytes, 8); // a.jpg(3) + sub/b.jpg(5)
        assert_eq!(run.phase, Phase::Idle);
    }

    #[test]
    fn test_estimate_no_match_is_zero() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "*.zip");
        let estimate = run.estimate.expect("estimate missing");
        assert_eq!(estimate.item_count, 0);
        assert_eq!(estimate.total_bytes, 0);

        let mut op = RecordingOp::new();
        let summary = execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut NullLog)
            .expect("Failed to execute");
        assert_eq!(summary.items_processed, 0);
        assert_eq!(summary.error_count, 0);
        assert!(op.applied.is_empty());
    }

    #[test]
    fn test_execute_processes_exactly_matched_set() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "*.jpg");
        let mut op = RecordingOp::new();
        let summary = execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut NullLog)
            .expect("Failed to execute");

        assert_eq!(op.applied, vec!["a.jpg".to_string(), "sub/b.jpg".to_string()]);
        assert_eq!(summary.items_processed, 2);
        assert_eq!(summary.items_skipped, 0);
        assert_eq!(summary.error_count, 0); // c.txt is not an error, just unmatched
        assert_eq!(summary.bytes_processed, 8);
        assert_eq!(summary.bytes_total, 8);
        assert!(!summary.cancelled);
        assert_eq!(run.phase, Phase::Done);
    }

    #[test]
    fn test_two_pass_byte_totals_agree() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("a/b/c")).expect("Failed to create dirs");
        write_file(&temp_dir.path().join("x.dat"), b"12");
        write_file(&temp_dir.path().join("a/y.dat"), b"345");
        write_file(&temp_dir.path().join("a/b/z.dat"), b"6789");
        write_file(&temp_dir.path().join("a/b/c/w.dat"), b"abcde");
        write_file(&temp_dir.path().join("a/other.bin"), b"zzzzzzzz");
        let source = LocalDirSource::new(temp_dir.path());

        let mut run = estimated_run(&source, vec!["x.dat", "a"], "*.dat");
        let estimate = run.estimate.expect("estimate missing");

        let mut op = RecordingOp::new();
        let summary = execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut NullLog)
            .expect("Failed to execute");

        assert_eq!(estimate.item_count, op.applied.len() as u64);
        assert_eq!(estimate.total_bytes, summary.bytes_processed);
        assert_eq!(summary.bytes_total, estimate.total_bytes);
    }

    #[test]
    fn test_subdirectories_visited_before_files() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("top")).expect("Failed to create dir");
        fs::create_dir(temp_dir.path().join("top/deep")).expect("Failed to create dir");
        write_file(&temp_dir.path().join("top/shallow.txt"), b"s");
        write_file(&temp_dir.path().join("top/deep/inner.txt"), b"i");
        let source = LocalDirSource::new(temp_dir.path());

        let mut run = estimated_run(&source, vec!["top"], "*.txt");
        let mut op = RecordingOp::new();
        execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut NullLog)
            .expect("Failed to execute");

        assert_eq!(
            op.applied,
            vec!["top/deep/inner.txt".to_string(), "top/shallow.txt".to_string()]
        );
    }

    #[test]
    fn test_failing_operation_counts_errors_and_continues() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "*.jpg");
        let mut op = RecordingOp::new();
        op.fail_all = true;
        let mut log = MemoryLog::new();
        let summary = execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut log)
            .expect("Failed to execute");

        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.items_processed, 0);
        assert!(!summary.cancelled);
        assert_eq!(summary.bytes_processed, summary.bytes_total);
        assert!(
            log.lines().iter().any(|l| l.contains("forced failure")),
            "failure should be logged: {:?}",
            log.lines()
        );
    }

    #[test]
    fn test_cancel_decision_stops_short() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "*.jpg");
        let mut op = RecordingOp::new();
        op.conflict_all = true;
        let mut hooks = ScriptedHooks::new(vec![Decision::Cancel]);
        let summary = execute_run(&mut run, &source, &mut op, &mut hooks, &mut NullLog)
            .expect("Failed to execute");

        assert!(summary.cancelled);
        assert_eq!(run.phase, Phase::Cancelled);
        assert_eq!(summary.items_processed, 0);
        assert!(op.applied.is_empty());
        assert_eq!(hooks.prompts.len(), 1);
    }

    #[test]
    fn test_yes_to_all_suppresses_later_prompts() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "*.jpg");
        let mut op = RecordingOp::new();
        op.conflict_all = true;
        let mut hooks = ScriptedHooks::new(vec![Decision::YesToAll]);
        let summary = execute_run(&mut run, &source, &mut op, &mut hooks, &mut NullLog)
            .expect("Failed to execute");

        assert_eq!(hooks.prompts.len(), 1);
        assert_eq!(summary.items_processed, 2);
        assert_eq!(summary.items_skipped, 0);
        assert!(!summary.cancelled);
    }

    #[test]
    fn test_skip_all_skips_later_conflicts_silently() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "*.jpg");
        let mut op = RecordingOp::new();
        op.conflict_all = true;
        let mut hooks = ScriptedHooks::new(vec![Decision::SkipAll]);
        let summary = execute_run(&mut run, &source, &mut op, &mut hooks, &mut NullLog)
            .expect("Failed to execute");

        assert_eq!(hooks.prompts.len(), 1);
        assert_eq!(summary.items_processed, 0);
        assert_eq!(summary.items_skipped, 2);
        assert!(op.applied.is_empty());
        // skipped items still advance the byte counter
        assert_eq!(summary.bytes_processed, summary.bytes_total);
    }

    #[test]
    fn test_single_skip_only_affects_one_item() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "*.jpg");
        let mut op = RecordingOp::new();
        op.conflict_all = true;
        let mut hooks = ScriptedHooks::new(vec![Decision::Skip, Decision::Yes]);
        let summary = execute_run(&mut run, &source, &mut op, &mut hooks, &mut NullLog)
            .expect("Failed to execute");

        assert_eq!(hooks.prompts.len(), 2);
        assert_eq!(summary.items_skipped, 1);
        assert_eq!(summary.items_processed, 1);
    }

    #[test]
    fn test_external_cancellation_is_polled_between_items() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "*.jpg");
        let mut op = RecordingOp::new();
        let mut hooks = ScriptedHooks::new(Vec::new());
        hooks.cancel_after_items = Some(1);
        let summary = execute_run(&mut run, &source, &mut op, &mut hooks, &mut NullLog)
            .expect("Failed to execute");

        assert!(summary.cancelled);
        assert_eq!(run.phase, Phase::Cancelled);
        assert_eq!(op.applied.len(), 1); // strictly fewer than the 2 matched
    }

    #[test]
    fn test_progress_is_monotonic_and_reaches_total() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "*.jpg");
        let mut op = RecordingOp::new();
        let mut hooks = ScriptedHooks::new(Vec::new());
        let summary = execute_run(&mut run, &source, &mut op, &mut hooks, &mut NullLog)
            .expect("Failed to execute");

        assert!(hooks.progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(hooks.progress.last().copied(), Some(summary.bytes_total));
    }

    #[test]
    fn test_inverted_mask_selects_complement() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["a.jpg", "sub"], "|*.jpg");
        let mut op = RecordingOp::new();
        let summary = execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut NullLog)
            .expect("Failed to execute");

        assert_eq!(op.applied, vec!["sub/c.txt".to_string()]);
        assert_eq!(summary.items_processed, 1);
    }

    #[test]
    fn test_execute_requires_estimate() {
        let (_tmp, source) = spec_tree();
        let mut run = create_run(&source, vec!["sub".to_string()], "*")
            .expect("Failed to create run");
        let mut op = RecordingOp::new();
        let result = execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut NullLog);
        assert!(matches!(result, Err(WalkerError::WrongPhase { .. })));
    }

    #[test]
    fn test_run_cannot_execute_twice() {
        let (_tmp, source) = spec_tree();
        let mut run = estimated_run(&source, vec!["sub"], "*");
        let mut op = RecordingOp::new();
        execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut NullLog)
            .expect("First execution should succeed");
        let result = execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut NullLog);
        assert!(result.is_err(), "Second execution should fail");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_aborts_estimate() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).expect("Failed to create dir");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))
            .expect("Failed to chmod");
        if fs::read_dir(&locked).is_ok() {
            // running as root; mode bits are not enforced
            return;
        }

        let source = LocalDirSource::new(temp_dir.path());
        let mut run = create_run(&source, vec!["locked".to_string()], "*")
            .expect("Failed to create run");
        let result = estimate_run(&mut run, &source);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
            .expect("Failed to restore permissions");

        assert!(matches!(result, Err(WalkerError::DirectoryRead { .. })));
        assert_eq!(run.phase, Phase::Idle);
        assert!(run.estimate.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_during_execute_is_counted() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("top")).expect("Failed to create dir");
        let locked = temp_dir.path().join("top/locked");
        fs::create_dir(&locked).expect("Failed to create dir");
        write_file(&temp_dir.path().join("top/ok.txt"), b"ok");

        let source = LocalDirSource::new(temp_dir.path());
        let mut run = estimated_run(&source, vec!["top"], "*.txt");

        // lock the (empty) subdirectory after the estimate pass
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))
            .expect("Failed to chmod");
        if fs::read_dir(&locked).is_ok() {
            // running as root; mode bits are not enforced
            return;
        }

        let mut op = RecordingOp::new();
        let mut log = MemoryLog::new();
        let summary = execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut log)
            .expect("Execution should not abort");

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
            .expect("Failed to restore permissions");

        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.items_processed, 1); // top/ok.txt still processed
        assert!(!summary.cancelled);
        assert!(log.lines().iter().any(|l| l.contains("failed to read directory")));
    }
}
