use crate::artifacts;
use crate::error::Error;
use std::fs;
use std::path::Path;

/// Receives the pruning pass's findings. The engine implements this to
/// delete, report and decide on elevation.
pub trait DirectoryVisitor {
    /// Called for every `$tf` / `.git` directory below the root.
    fn on_artifact_directory(&mut self, path: &Path);

    /// Called when a directory cannot be listed; traversal continues with siblings.
    fn on_traversal_error(&mut self, path: &Path, err: Error);
}

/// Recursive descent from `root`. `.vs` subtrees are skipped; artifact
/// directories are handed to the visitor and not descended into. The root
/// itself is never handed over.
pub fn prune_artifact_directories(root: &Path, visitor: &mut dyn DirectoryVisitor) {
    if artifacts::is_skipped_directory(root) {
        return;
    }
    visit_dirs(root, visitor);
}

fn visit_dirs(dir: &Path, visitor: &mut dyn DirectoryVisitor) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            visitor.on_traversal_error(dir, err.into());
            return;
        }
    };

    let mut sub_dirs = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => {
                // file_type() does not follow symlinks
                if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    sub_dirs.push(entry.path());
                }
            }
            Err(err) => visitor.on_traversal_error(dir, err.into()),
        }
    }
    sub_dirs.sort();

    for sub_dir in sub_dirs {
        if artifacts::is_skipped_directory(&sub_dir) {
            continue;
        }
        if artifacts::is_artifact_directory(&sub_dir) {
            visitor.on_artifact_directory(&sub_dir);
            continue;
        }
        visit_dirs(&sub_dir, visitor);
    }
}
