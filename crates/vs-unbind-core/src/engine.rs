use crate::artifacts;
use crate::config::AppConfig;
use crate::error::Error;
use crate::platform::{Elevator, NoElevation};
use crate::progress::ProgressReporter;
use crate::project;
use crate::scanner::{self, prune::DirectoryVisitor};
use crate::solution;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub struct UnbindEngine {
    config: AppConfig,
    elevator: Box<dyn Elevator>,
}

/// What one run did. Failures are counted, never turned into an exit code.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnbindOutcome {
    pub solutions_modified: usize,
    pub projects_modified: usize,
    pub files_deleted: usize,
    pub directories_deleted: usize,
    pub failures: usize,
    pub elevation_requested: bool,
    /// False when there was nothing to do and the tree was left alone.
    pub processed: bool,
}

impl UnbindEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            elevator: Box::new(NoElevation),
        }
    }

    pub fn with_elevator(mut self, elevator: Box<dyn Elevator>) -> Self {
        self.elevator = elevator;
        self
    }

    /// Validates `root` without touching it.
    pub fn validate_root(root: &Path) -> Result<PathBuf, Error> {
        if root.as_os_str().is_empty() {
            return Err(Error::EmptyFolder);
        }
        if !root.is_dir() {
            return Err(Error::FolderNotFound(root.to_path_buf()));
        }
        Ok(root.to_path_buf())
    }

    /// Run the unbind pipeline:
    /// 1. Classify every file below `root`
    /// 2. Rewrite solutions, then projects, then delete artifact files
    /// 3. Delete `$tf` / `.git` directories, skipping `.vs`
    pub fn run(&self, root: &Path, reporter: &dyn ProgressReporter) -> Result<UnbindOutcome, Error> {
        let root = Self::validate_root(root)?;
        reporter.on_start(&root);

        // Phase 1: Classify
        info!("Scanning {}", root.display());
        let files = scanner::collect_classified_files(&root);
        reporter.on_scan_complete(
            files.solutions.len(),
            files.projects.len(),
            files.artifacts.len(),
        );

        let mut outcome = UnbindOutcome::default();
        if files.is_empty() {
            info!("No files to modify or delete");
            reporter.on_nothing_to_do();
            return Ok(outcome);
        }
        outcome.processed = true;

        // Phase 2: Files, in fixed order
        outcome.solutions_modified = process_files(&files.solutions, reporter, |path| {
            reporter.on_solution_start(path);
            solution::modify_solution_file(path)
        });
        outcome.projects_modified = process_files(&files.projects, reporter, |path| {
            reporter.on_project_start(path);
            project::sanitize_project_file(path, self.config.indent_width)
        });
        outcome.files_deleted = process_files(&files.artifacts, reporter, |path| {
            artifacts::delete_artifact(path)?;
            reporter.on_file_deleted(path);
            Ok(())
        });
        outcome.failures = files.total()
            - outcome.solutions_modified
            - outcome.projects_modified
            - outcome.files_deleted;

        // Phase 3: Artifact directories
        info!("Pruning artifact directories below {}", root.display());
        let mut pruner = Pruner {
            engine: self,
            reporter,
            outcome: &mut outcome,
        };
        scanner::prune_artifact_directories(&root, &mut pruner);

        reporter.on_complete(&outcome);
        debug!("Run finished: {:?}", outcome);
        Ok(outcome)
    }
}

/// Applies `process` to every path, isolating failures. Returns the number
/// of paths that succeeded.
fn process_files<F>(paths: &[PathBuf], reporter: &dyn ProgressReporter, mut process: F) -> usize
where
    F: FnMut(&Path) -> Result<(), Error>,
{
    let mut succeeded = 0;
    for path in paths {
        match process(path) {
            Ok(()) => succeeded += 1,
            Err(err) => {
                error!("Unable to process {}: {}", path.display(), err);
                reporter.on_failure(path, &err);
            }
        }
    }
    succeeded
}

struct Pruner<'a> {
    engine: &'a UnbindEngine,
    reporter: &'a dyn ProgressReporter,
    outcome: &'a mut UnbindOutcome,
}

impl Pruner<'_> {
    /// At most one relaunch per run; the current run carries on regardless.
    fn request_elevation(&mut self) {
        if !self.engine.config.elevate_on_access_denied || self.outcome.elevation_requested {
            return;
        }
        self.outcome.elevation_requested = true;
        match self.engine.elevator.relaunch_elevated() {
            Ok(()) => info!("Relaunched with elevated rights"),
            Err(err) => warn!("Could not relaunch with elevated rights: {}", err),
        }
    }

    /// Only an access denial asks for elevation; any other error is just counted.
    fn on_delete_failed(&mut self, path: &Path, err: Error) {
        if err.is_permission_denied() {
            self.request_elevation();
        }
        self.outcome.failures += 1;
        error!("Unable to delete {}: {}", path.display(), err);
        self.reporter.on_failure(path, &err);
    }
}

impl DirectoryVisitor for Pruner<'_> {
    fn on_artifact_directory(&mut self, path: &Path) {
        match artifacts::delete_artifact_directory(path) {
            Ok(()) => {
                self.outcome.directories_deleted += 1;
                self.reporter.on_directory_deleted(path);
            }
            Err(err) => self.on_delete_failed(path, err),
        }
    }

    fn on_traversal_error(&mut self, path: &Path, err: Error) {
        error!("Error reading directory {}: {}", path.display(), err);
        self.reporter.on_traversal_error(path, &err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use std::cell::Cell;
    use std::fs;
    use std::io;
    use std::rc::Rc;
    use tempfile::tempdir;

    struct CountingElevator(Rc<Cell<usize>>);

    impl Elevator for CountingElevator {
        fn relaunch_elevated(&self) -> Result<(), Error> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_validate_root() {
        assert!(matches!(
            UnbindEngine::validate_root(Path::new("")),
            Err(Error::EmptyFolder)
        ));
        let tmp = tempdir().unwrap();
        assert!(matches!(
            UnbindEngine::validate_root(&tmp.path().join("nope")),
            Err(Error::FolderNotFound(_))
        ));
        assert!(UnbindEngine::validate_root(tmp.path()).is_ok());
    }

    #[test]
    fn test_elevation_requested_at_most_once() {
        let calls = Rc::new(Cell::new(0));
        let engine = UnbindEngine::new(AppConfig::default())
            .with_elevator(Box::new(CountingElevator(calls.clone())));
        let mut outcome = UnbindOutcome::default();
        let mut pruner = Pruner {
            engine: &engine,
            reporter: &SilentReporter,
            outcome: &mut outcome,
        };

        pruner.request_elevation();
        pruner.request_elevation();
        assert_eq!(calls.get(), 1);
        assert!(outcome.elevation_requested);
    }

    #[test]
    fn test_elevation_disabled_by_config() {
        let calls = Rc::new(Cell::new(0));
        let config = AppConfig {
            elevate_on_access_denied: false,
            ..AppConfig::default()
        };
        let engine =
            UnbindEngine::new(config).with_elevator(Box::new(CountingElevator(calls.clone())));
        let mut outcome = UnbindOutcome::default();
        let mut pruner = Pruner {
            engine: &engine,
            reporter: &SilentReporter,
            outcome: &mut outcome,
        };

        pruner.request_elevation();
        assert_eq!(calls.get(), 0);
        assert!(!outcome.elevation_requested);
    }

    #[test]
    fn test_only_access_denied_deletions_request_elevation() {
        let calls = Rc::new(Cell::new(0));
        let engine = UnbindEngine::new(AppConfig::default())
            .with_elevator(Box::new(CountingElevator(calls.clone())));
        let mut outcome = UnbindOutcome::default();
        let mut pruner = Pruner {
            engine: &engine,
            reporter: &SilentReporter,
            outcome: &mut outcome,
        };

        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        pruner.on_delete_failed(Path::new("a/.git"), Error::Io(missing));
        assert_eq!(calls.get(), 0);

        for name in ["b/.git", "c/$tf"] {
            let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
            pruner.on_delete_failed(Path::new(name), Error::Io(denied));
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(outcome.failures, 3);
        assert!(outcome.elevation_requested);
    }

    #[test]
    fn test_per_file_failures_are_isolated() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("A.csproj"), "<Project><Broken></Project>").unwrap();
        fs::write(root.join("B.csproj"), "<Project><SccAuxPath>x</SccAuxPath></Project>").unwrap();

        let outcome = UnbindEngine::new(AppConfig::default())
            .run(root, &SilentReporter)
            .unwrap();

        assert_eq!(outcome.projects_modified, 1);
        assert_eq!(outcome.failures, 1);
        assert_eq!(
            fs::read_to_string(root.join("A.csproj")).unwrap(),
            "<Project><Broken></Project>"
        );
        assert!(!fs::read_to_string(root.join("B.csproj")).unwrap().contains("Scc"));
    }
}
