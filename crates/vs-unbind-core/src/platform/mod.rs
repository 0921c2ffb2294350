#[cfg(target_os = "windows")]
pub mod windows;

use crate::error::Error;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Snapshot of the attributes a file had before it was made writable.
#[derive(Debug, Clone)]
pub struct FileAttributes {
    #[cfg(target_os = "windows")]
    raw: u32,
    #[cfg(not(target_os = "windows"))]
    permissions: fs::Permissions,
}

#[cfg(target_os = "windows")]
pub fn read_attributes(path: &Path) -> io::Result<FileAttributes> {
    Ok(FileAttributes {
        raw: windows::get_file_attributes(path)?,
    })
}

#[cfg(not(target_os = "windows"))]
pub fn read_attributes(path: &Path) -> io::Result<FileAttributes> {
    Ok(FileAttributes {
        permissions: fs::symlink_metadata(path)?.permissions(),
    })
}

#[cfg(target_os = "windows")]
pub fn restore_attributes(path: &Path, attributes: &FileAttributes) -> io::Result<()> {
    windows::set_file_attributes(path, attributes.raw)
}

#[cfg(not(target_os = "windows"))]
pub fn restore_attributes(path: &Path, attributes: &FileAttributes) -> io::Result<()> {
    fs::set_permissions(path, attributes.permissions.clone())
}

/// Clears read-only (and on Windows also hidden/system) so the file can be
/// rewritten or deleted.
#[cfg(target_os = "windows")]
pub fn make_writable(path: &Path) -> io::Result<()> {
    windows::set_file_attributes(path, windows::FILE_ATTRIBUTE_NORMAL)
}

#[cfg(unix)]
pub fn make_writable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::symlink_metadata(path)?.permissions();
    let mode = permissions.mode();
    if mode & 0o200 == 0 {
        permissions.set_mode(mode | 0o200);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

/// Holds a file writable for the guard's lifetime and puts the original
/// attributes back when dropped, whether or not the mutation succeeded.
#[derive(Debug)]
pub struct WritableGuard {
    path: PathBuf,
    original: FileAttributes,
}

impl WritableGuard {
    pub fn acquire(path: &Path) -> io::Result<Self> {
        let original = read_attributes(path)?;
        make_writable(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            original,
        })
    }
}

impl Drop for WritableGuard {
    fn drop(&mut self) {
        if let Err(err) = restore_attributes(&self.path, &self.original) {
            warn!(
                "Could not restore attributes of {}: {}",
                self.path.display(),
                err
            );
        }
    }
}

/// Relaunches the tool with elevated rights after an access denial.
pub trait Elevator {
    fn relaunch_elevated(&self) -> Result<(), Error>;
}

/// Never elevates. Used when elevation is disabled and in tests.
pub struct NoElevation;

impl Elevator for NoElevation {
    fn relaunch_elevated(&self) -> Result<(), Error> {
        Err(Error::ElevationUnsupported)
    }
}

/// Starts a new, independent copy of the given program with elevated rights.
#[derive(Debug, Clone)]
pub struct SystemElevator {
    program: PathBuf,
    args: Vec<OsString>,
}

impl SystemElevator {
    pub fn new(program: PathBuf, args: Vec<OsString>) -> Self {
        Self { program, args }
    }

    /// Relaunch the running executable against `root`. The elevated copy
    /// never asks for elevation itself.
    pub fn for_current_exe(root: &Path) -> io::Result<Self> {
        let program = std::env::current_exe()?;
        Ok(Self::new(
            program,
            vec![OsString::from(NO_ELEVATE_FLAG), root.as_os_str().to_os_string()],
        ))
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// Command-line flag that turns elevation off in the relaunched copy.
pub const NO_ELEVATE_FLAG: &str = "--no-elevate";

/// Wraps `arg` in double quotes so that the Windows argument parser hands it
/// back unchanged. Backslashes only need doubling when they precede a quote.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn quote_windows_arg(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0;
    for c in arg.chars() {
        if c == '\\' {
            backslashes += 1;
            continue;
        }
        let escapes = if c == '"' { backslashes * 2 + 1 } else { backslashes };
        quoted.extend(std::iter::repeat('\\').take(escapes));
        quoted.push(c);
        backslashes = 0;
    }
    quoted.extend(std::iter::repeat('\\').take(backslashes * 2));
    quoted.push('"');
    quoted
}

impl Elevator for SystemElevator {
    #[cfg(target_os = "windows")]
    fn relaunch_elevated(&self) -> Result<(), Error> {
        debug!("Relaunching {} as administrator", self.program.display());
        windows::run_as_administrator(&self.program, &self.args)
    }

    #[cfg(not(target_os = "windows"))]
    fn relaunch_elevated(&self) -> Result<(), Error> {
        debug!(
            "Cannot relaunch {} with {} argument(s) elevated on this platform",
            self.program.display(),
            self.args.len()
        );
        Err(Error::ElevationUnsupported)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn set_read_only(path: &Path) {
        let mut permissions = fs::metadata(path).unwrap().permissions();
        permissions.set_mode(0o444);
        fs::set_permissions(path, permissions).unwrap();
    }

    fn mode(path: &Path) -> u32 {
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    fn test_guard_restores_read_only_after_write() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("App.sln");
        fs::write(&file, "before").unwrap();
        set_read_only(&file);

        {
            let _guard = WritableGuard::acquire(&file).unwrap();
            assert_eq!(mode(&file) & 0o200, 0o200);
            fs::write(&file, "after").unwrap();
        }

        assert_eq!(fs::read_to_string(&file).unwrap(), "after");
        assert_eq!(mode(&file), 0o444);
    }

    #[test]
    fn test_guard_restores_on_error_path() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("App.csproj");
        fs::write(&file, "<Project/>").unwrap();
        set_read_only(&file);

        let result: Result<(), io::Error> = (|| {
            let _guard = WritableGuard::acquire(&file)?;
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        })();

        assert!(result.is_err());
        assert_eq!(mode(&file), 0o444);
    }

    #[test]
    fn test_make_writable_keeps_other_bits() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("a.vssscc");
        fs::write(&file, "").unwrap();
        set_read_only(&file);

        make_writable(&file).unwrap();
        assert_eq!(mode(&file), 0o644);
    }

    #[test]
    fn test_relaunch_disables_further_elevation() {
        let elevator = SystemElevator::for_current_exe(Path::new("/work/App")).unwrap();
        assert_eq!(
            elevator.args(),
            &[OsString::from("--no-elevate"), OsString::from("/work/App")]
        );
    }

    #[test]
    fn test_quote_windows_arg() {
        assert_eq!(quote_windows_arg(r"C:\Work"), r#""C:\Work""#);
        assert_eq!(quote_windows_arg(r"C:\Work\"), r#""C:\Work\\""#);
        assert_eq!(quote_windows_arg(r"C:\My Work\\"), r#""C:\My Work\\\\""#);
        assert_eq!(quote_windows_arg(r#"a\"b"#), r#""a\\\"b""#);
        assert_eq!(quote_windows_arg(""), r#""""#);
    }

    #[test]
    fn test_no_elevation_is_unsupported() {
        assert!(matches!(
            NoElevation.relaunch_elevated(),
            Err(Error::ElevationUnsupported)
        ));
    }
}
