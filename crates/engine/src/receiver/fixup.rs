//! Directory metadata restoration after all transfers.

use logging::trace_recv;
use platform::SandboxedRoot;
use protocol::FileList;

use crate::error::ReceiverError;
use crate::options::ReceiverOptions;

/// Reapplies times and permissions to every listed directory.
///
/// The list is sorted, so walking it backwards visits each directory after
/// everything beneath it. Modification times are restored when preserving
/// times; permissions are restored when preserving them or when the
/// directory was created during this session. Returns the number of
/// directories processed.
pub(super) fn fix_directories(
    root: &SandboxedRoot,
    list: &FileList,
    new_dirs: &[bool],
    options: &ReceiverOptions,
) -> Result<usize, ReceiverError> {
    if !options.fixes_directories() {
        return Ok(0);
    }

    let mut fixed = 0;
    for (index, entry) in list.iter().enumerate().rev() {
        if !entry.is_dir() {
            continue;
        }
        let path = entry.path();
        let fixup = |source| ReceiverError::Fixup {
            path: path.to_path_buf(),
            source,
        };
        if options.preserve_times {
            root.set_times(path, entry.mtime()).map_err(fixup)?;
        }
        if new_dirs[index] || options.preserve_perms {
            root.chmod(path, entry.permissions()).map_err(fixup)?;
        }
        trace_recv!("{}: directory metadata restored", path.display());
        fixed += 1;
    }
    Ok(fixed)
}
