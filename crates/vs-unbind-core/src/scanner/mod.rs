pub mod prune;
pub mod walk;

pub use prune::prune_artifact_directories;
pub use walk::collect_classified_files;
