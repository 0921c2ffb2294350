use crate::classify::{ClassifiedFiles, FileRecord};
use std::path::Path;
use tracing::{debug, error};
use walkdir::WalkDir;

/// Walks every file below `root` (symlinks are not followed) and buckets the
/// ones the unbinder cares about. Unreadable entries are logged and skipped.
pub fn collect_classified_files(root: &Path) -> ClassifiedFiles {
    let mut files = ClassifiedFiles::default();
    let mut scanned = 0usize;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                error!("Error reading entry below {}: {}", root.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        scanned += 1;
        files.push(FileRecord::new(entry.into_path()));
    }

    debug!(
        "Scanned {} files: {} solutions, {} projects, {} artifacts",
        scanned,
        files.solutions.len(),
        files.projects.len(),
        files.artifacts.len()
    );

    files
}
