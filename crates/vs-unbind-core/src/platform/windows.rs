use super::quote_windows_arg;
use crate::error::Error;
use std::ffi::OsString;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::process::{Command, Stdio};
use winapi::um::fileapi::{GetFileAttributesW, SetFileAttributesW, INVALID_FILE_ATTRIBUTES};

pub use winapi::um::winnt::FILE_ATTRIBUTE_NORMAL;

fn to_wide(path: &Path) -> Vec<u16> {
    path.as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

pub fn get_file_attributes(path: &Path) -> io::Result<u32> {
    let path_wide = to_wide(path);
    let attributes = unsafe { GetFileAttributesW(path_wide.as_ptr()) };
    if attributes == INVALID_FILE_ATTRIBUTES {
        return Err(io::Error::last_os_error());
    }
    Ok(attributes)
}

pub fn set_file_attributes(path: &Path, attributes: u32) -> io::Result<()> {
    let path_wide = to_wide(path);
    if unsafe { SetFileAttributesW(path_wide.as_ptr(), attributes) } == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn quote_ps(value: &std::ffi::OsStr) -> String {
    format!("'{}'", value.to_string_lossy().replace('\'', "''"))
}

/// Spawns `program` through the UAC prompt and returns without waiting for it.
pub fn run_as_administrator(program: &Path, args: &[OsString]) -> Result<(), Error> {
    let mut script = format!(
        "Start-Process -FilePath {} -Verb RunAs",
        quote_ps(program.as_os_str())
    );
    if !args.is_empty() {
        let list: Vec<String> = args
            .iter()
            .map(|arg| quote_ps(&OsString::from(quote_windows_arg(&arg.to_string_lossy()))))
            .collect();
        script.push_str(&format!(" -ArgumentList {}", list.join(",")));
    }

    Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-Command", &script])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}
