use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::{Result, TredError};

/// `path + suffix`, used for sealed output and shred scratch files.
pub fn sealed_name(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

#[cfg(unix)]
fn strip_name_suffix(name: &OsStr, suffix: &str) -> Option<OsString> {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes()
        .strip_suffix(suffix.as_bytes())
        .map(|stem| OsStr::from_bytes(stem).to_os_string())
}

#[cfg(not(unix))]
fn strip_name_suffix(name: &OsStr, suffix: &str) -> Option<OsString> {
    name.to_str()?.strip_suffix(suffix).map(OsString::from)
}

/// Inverse of [`sealed_name`]: the suffix must end the file name.
/// Works on the raw name, so anything `sealed_name` produced opens again.
pub fn opened_name(path: &Path, suffix: &str) -> Result<PathBuf> {
    let fail = |reason: &str| TredError::Naming {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    if suffix.is_empty() {
        return Err(fail("suffix is empty"));
    }
    let name = path.file_name().ok_or_else(|| fail("no file name"))?;
    match strip_name_suffix(name, suffix) {
        Some(stem) if stem.is_empty() => Err(fail("nothing left after removing the suffix")),
        Some(stem) => Ok(path.with_file_name(stem)),
        None => Err(fail(&format!("file name does not end with '{suffix}'"))),
    }
}
