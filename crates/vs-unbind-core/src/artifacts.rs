use crate::error::Error;
use crate::platform;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Directory names left behind by TFS (`$tf`) and git (`.git`).
pub const ARTIFACT_DIRECTORIES: [&str; 2] = ["$tf", ".git"];

/// Directory names whose subtrees the pruning pass never enters.
pub const SKIPPED_DIRECTORIES: [&str; 1] = [".vs"];

fn name_is_one_of(path: &Path, names: &[&str]) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| names.iter().any(|n| name.eq_ignore_ascii_case(n)))
}

pub fn is_artifact_directory(path: &Path) -> bool {
    name_is_one_of(path, &ARTIFACT_DIRECTORIES)
}

pub fn is_skipped_directory(path: &Path) -> bool {
    name_is_one_of(path, &SKIPPED_DIRECTORIES)
}

/// Clears the read-only attribute and deletes a single artifact file.
pub fn delete_artifact(path: &Path) -> Result<(), Error> {
    platform::make_writable(path)?;
    fs::remove_file(path)?;
    Ok(())
}

/// Deletes an artifact directory and everything below it. Read-only entries
/// (git pack files, TFS local workspace data) are made writable first.
pub fn delete_artifact_directory(path: &Path) -> Result<(), Error> {
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Cannot visit entry below {}: {}", path.display(), err);
                continue;
            }
        };
        if entry.path_is_symlink() {
            continue;
        }
        if let Err(err) = platform::make_writable(entry.path()) {
            debug!("Cannot make {} writable: {}", entry.path().display(), err);
        }
    }

    fs::remove_dir_all(path)?;
    Ok(())
}
