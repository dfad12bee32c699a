//! Filesystem utilities.
//!
//! Files are written through a temporary file in the destination directory
//! and renamed into place, so readers never observe a half-written file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::compose::ComposeError;

/// Mode of generated scripts.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Mode of generated data files.
pub const DATA_MODE: u32 = 0o644;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<(), ComposeError> {
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| ComposeError::io(path, e))?;
    }
    Ok(())
}

/// Read a file if it exists.
pub fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, ComposeError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ComposeError::io(path, e)),
    }
}

/// Write a data file atomically.
pub fn write_file(path: &Path, contents: &[u8]) -> Result<(), ComposeError> {
    let tmp = write_temp(path, contents, write_all)?;
    set_mode(tmp.as_file(), DATA_MODE).map_err(|e| ComposeError::io(path, e))?;
    persist(tmp, path)
}

/// Write a script atomically, then mark it executable.
///
/// The mode change is the last step: if anything before it fails, the
/// script is either absent or not executable.
pub fn install_executable(path: &Path, contents: &[u8]) -> Result<(), ComposeError> {
    install_executable_with(path, contents, write_all)
}

/// [`install_executable`] with a custom body writer.
pub(crate) fn install_executable_with<F>(
    path: &Path,
    contents: &[u8],
    write: F,
) -> Result<(), ComposeError>
where
    F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    let tmp = write_temp(path, contents, write)?;
    persist(tmp, path)?;

    let file = File::open(path).map_err(|e| ComposeError::io(path, e))?;
    set_mode(&file, EXECUTABLE_MODE).map_err(|e| ComposeError::io(path, e))?;
    Ok(())
}

/// Whether `path` is a file with an executable bit set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn write_all(file: &mut File, contents: &[u8]) -> io::Result<()> {
    file.write_all(contents)
}

fn write_temp<F>(path: &Path, contents: &[u8], write: F) -> Result<NamedTempFile, ComposeError>
where
    F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ComposeError::io(dir, e))?;
    write(tmp.as_file_mut(), contents).map_err(|e| ComposeError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| ComposeError::io(path, e))?;
    Ok(tmp)
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<(), ComposeError> {
    tmp.persist(path)
        .map(|_| ())
        .map_err(|e| ComposeError::io(path, e.error))
}

#[cfg(unix)]
fn set_mode(file: &File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &File, _mode: u32) -> io::Result<()> {
    Ok(())
}
