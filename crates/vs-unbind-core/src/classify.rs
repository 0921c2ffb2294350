use std::path::{Path, PathBuf};

/// What the unbinder does with a file found during the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    ProjectFile,
    SolutionFile,
    SccArtifact,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub classification: Classification,
}

impl FileRecord {
    pub fn new(path: PathBuf) -> Self {
        let classification = classify(&path);
        Self {
            path,
            classification,
        }
    }
}

/// Classifies a path by its suffix. Matching is case-insensitive and looks at
/// the whole path string, not just the extension.
pub fn classify(path: &Path) -> Classification {
    let normalized = path.to_string_lossy().to_lowercase();

    if normalized.contains('.') && normalized.ends_with("proj") && !normalized.ends_with("vdproj")
    {
        Classification::ProjectFile
    } else if normalized.ends_with(".sln") {
        Classification::SolutionFile
    } else if normalized.ends_with(".vssscc") || normalized.ends_with(".vspscc") {
        Classification::SccArtifact
    } else {
        Classification::Ignored
    }
}

/// Files from one scan, bucketed by what will be done to them.
#[derive(Debug, Default, Clone)]
pub struct ClassifiedFiles {
    pub solutions: Vec<PathBuf>,
    pub projects: Vec<PathBuf>,
    pub artifacts: Vec<PathBuf>,
}

impl ClassifiedFiles {
    pub fn push(&mut self, record: FileRecord) {
        match record.classification {
            Classification::SolutionFile => self.solutions.push(record.path),
            Classification::ProjectFile => self.projects.push(record.path),
            Classification::SccArtifact => self.artifacts.push(record.path),
            Classification::Ignored => {}
        }
    }

    pub fn total(&self) -> usize {
        self.solutions.len() + self.projects.len() + self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
