//! Console progress and conflict prompts.
//!
//! Implements the engine's WalkHooks for a terminal: an indicatif byte
//! bar sized from the estimate pass, and an interactive stdin prompt for
//! conflicts when the policy is Ask.

use std::io::{self, BufRead, Write};

use engine::{Decision, Item, WalkHooks};
use indicatif::{ProgressBar, ProgressStyle};

/// How conflicts are resolved without (or before) prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Always process conflicting items
    Yes,
    /// Always skip conflicting items
    Skip,
    /// Prompt on stdin per conflict
    Ask,
}

pub struct ConsoleHooks {
    bar: Option<ProgressBar>,
    policy: ConflictPolicy,
}

impl ConsoleHooks {
    pub fn new(total_bytes: u64, policy: ConflictPolicy, quiet: bool) -> Self {
        let bar = if quiet {
            None
        } else {
            Some(create_progress_bar(total_bytes))
        };
        ConsoleHooks { bar, policy }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl WalkHooks for ConsoleHooks {
    fn on_progress(&mut self, bytes_processed: u64, _bytes_total: u64) {
        if let Some(bar) = &self.bar {
            bar.set_position(bytes_processed);
        }
    }

    fn on_decision(&mut self, item: &Item) -> Decision {
        match self.policy {
            ConflictPolicy::Yes => Decision::Yes,
            ConflictPolicy::Skip => Decision::Skip,
            ConflictPolicy::Ask => match &self.bar {
                Some(bar) => bar.suspend(|| prompt_decision(item)),
                None => prompt_decision(item),
            },
        }
    }
}

fn create_progress_bar(total_bytes: u64) -> ProgressBar {
    let bar = ProgressBar::new(total_bytes);
    bar.set_style(
        ProgressStyle::with_template(
            "{percent:3}% [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    bar
}

fn prompt_decision(item: &Item) -> Decision {
    let stdin = io::stdin();
    loop {
        eprint!(
            "{}: output exists. [y]es / [a]ll / [s]kip / s[k]ip all / [c]ancel: ",
            item.sub_path()
        );
        let _ = io::stderr().flush();

        let mut line = String::new();
        // EOF on stdin cancels rather than looping forever
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            return Decision::Cancel;
        }
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Decision::Yes,
            "a" | "all" => return Decision::YesToAll,
            "s" | "skip" => return Decision::Skip,
            "k" | "skipall" => return Decision::SkipAll,
            "c" | "cancel" => return Decision::Cancel,
            _ => continue,
        }
    }
}
