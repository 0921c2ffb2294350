pub mod artifacts;
pub mod classify;
pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod platform;
pub mod progress;
pub mod project;
pub mod scanner;
pub mod solution;

pub use classify::{classify, Classification, ClassifiedFiles, FileRecord};
pub use config::AppConfig;
pub use engine::{UnbindEngine, UnbindOutcome};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
