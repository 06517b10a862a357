use std::path::{Component, Path};

use crate::error::SandboxError;

/// Checks that `path` stays beneath the root it will be resolved against.
///
/// Only normal components and `.` are accepted. `.` on its own names the root
/// itself.
///
/// # Examples
///
/// ```
/// use platform::check_beneath;
/// use std::path::Path;
///
/// assert!(check_beneath(Path::new("dir/file")).is_ok());
/// assert!(check_beneath(Path::new(".")).is_ok());
/// assert!(check_beneath(Path::new("../etc/passwd")).is_err());
/// assert!(check_beneath(Path::new("/etc/passwd")).is_err());
/// ```
pub fn check_beneath(path: &Path) -> Result<(), SandboxError> {
    if path.as_os_str().is_empty() {
        return Err(SandboxError::OutsideRoot(path.to_path_buf()));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => {
                return Err(SandboxError::OutsideRoot(path.to_path_buf()));
            }
        }
    }
    Ok(())
}
