use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Malformed project file: {0}")]
    MalformedProject(String),

    #[error("Internal Error: {} is not a solution file", .0.display())]
    NotASolution(PathBuf),

    #[error("Internal Error: {} is not a project file", .0.display())]
    NotAProject(PathBuf),

    #[error("empty folder name")]
    EmptyFolder,

    #[error("Folder does not exist: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Content is not valid {0}")]
    UndecodableText(&'static str),

    #[error("Relaunching with elevated rights is not supported on this platform")]
    ElevationUnsupported,
}

impl Error {
    /// True when the underlying failure is an OS access denial.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::Io(err) if err.kind() == std::io::ErrorKind::PermissionDenied)
    }
}
