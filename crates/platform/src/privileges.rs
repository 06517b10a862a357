use crate::error::SandboxError;

/// First sandbox stage: forbid gaining privileges through `execve`.
///
/// Sets `PR_SET_NO_NEW_PRIVS` on Linux and does nothing elsewhere. The flag
/// cannot be cleared once set.
pub fn drop_privileges() -> Result<(), SandboxError> {
    #[cfg(target_os = "linux")]
    {
        rustix::thread::set_no_new_privs(true)
            .map_err(|errno| SandboxError::Privileges(errno.into()))?;
        tracing::debug!(target: "rsync::receiver", "no_new_privs set");
    }
    Ok(())
}
