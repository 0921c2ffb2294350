use crate::engine::UnbindOutcome;
use crate::error::Error;
use std::path::Path;

/// Trait for reporting what the unbinder does.
///
/// The CLI implements it with coloured console lines; tests use
/// [`SilentReporter`]. All methods have default no-op implementations.
pub trait ProgressReporter {
    fn on_start(&self, _root: &Path) {}
    fn on_scan_complete(&self, _solutions: usize, _projects: usize, _artifacts: usize) {}
    fn on_nothing_to_do(&self) {}
    fn on_solution_start(&self, _path: &Path) {}
    fn on_project_start(&self, _path: &Path) {}
    fn on_file_deleted(&self, _path: &Path) {}
    fn on_directory_deleted(&self, _path: &Path) {}
    /// A single file or directory could not be processed; the run continues.
    fn on_failure(&self, _path: &Path, _err: &Error) {}
    /// A directory could not be listed during the pruning pass.
    fn on_traversal_error(&self, _path: &Path, _err: &Error) {}
    fn on_complete(&self, _outcome: &UnbindOutcome) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
