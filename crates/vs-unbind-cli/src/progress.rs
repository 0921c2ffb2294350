use colored::*;
use std::path::Path;
use vs_unbind_core::{Error, ProgressReporter, UnbindOutcome};

/// Prints one line per event. Colour is applied per line, so no console
/// state needs restoring.
pub struct CliReporter;

impl ProgressReporter for CliReporter {
    fn on_start(&self, _root: &Path) {
        println!("Starting ...");
    }

    fn on_scan_complete(&self, solutions: usize, projects: usize, artifacts: usize) {
        println!(
            "{}",
            format!(
                "Found {} solution(s), {} project(s), {} source control file(s)",
                solutions, projects, artifacts
            )
            .dimmed()
        );
    }

    fn on_nothing_to_do(&self) {
        println!("No files to modify or delete. Exiting.");
    }

    fn on_solution_start(&self, path: &Path) {
        println!("Modifying Solution: {}", path.display());
    }

    fn on_project_start(&self, path: &Path) {
        println!("Modifying Project : {}", path.display());
    }

    fn on_file_deleted(&self, path: &Path) {
        println!("{}", format!("File      : {} deleted.", path.display()).green());
    }

    fn on_directory_deleted(&self, path: &Path) {
        println!("{}", format!("Directory : {} deleted.", path.display()).green());
    }

    fn on_failure(&self, path: &Path, err: &Error) {
        println!(
            "{}",
            format!("Unable to process {}: {}", path.display(), err).red()
        );
    }

    fn on_traversal_error(&self, path: &Path, err: &Error) {
        println!("{}", format!("{}: {}", path.display(), err).red());
    }

    fn on_complete(&self, outcome: &UnbindOutcome) {
        if outcome.elevation_requested {
            println!(
                "{}",
                "Some directories needed administrator rights; an elevated copy was started."
                    .yellow()
            );
        }
        println!("{}", "Done ...".green());
    }
}
