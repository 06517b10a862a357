//! Remote source operand parsing.
//!
//! Accepted forms:
//!
//! - `rsync://[user@]host[:port]/module[/path]`
//! - `[user@]host::module[/path]`
//! - `[user@]host:path`
//!
//! Anything else is local, and this client only pulls from remote senders.

use super::ClientError;

/// Port an rsync daemon listens on unless told otherwise.
pub const RSYNCD_PORT: u16 = 873;

/// Where the files come from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemoteSource {
    /// A sender started through a remote shell.
    Shell {
        /// Host argument for the remote shell, `user@` included.
        host: String,
        /// Path on the remote host.
        path: String,
    },
    /// A module served by an rsync daemon.
    Daemon {
        /// Host name or address, without `user@`.
        host: String,
        /// TCP port.
        port: u16,
        /// Module name.
        module: String,
        /// Path inside the module, possibly empty.
        path: String,
    },
}

impl RemoteSource {
    /// The path argument passed to the remote `--server --sender`.
    #[must_use]
    pub fn server_path(&self) -> String {
        match self {
            Self::Shell { path, .. } => path.clone(),
            Self::Daemon { module, path, .. } if path.is_empty() => module.clone(),
            Self::Daemon { module, path, .. } => format!("{module}/{path}"),
        }
    }
}

/// Returns `true` if `text` names a remote location.
#[must_use]
pub fn operand_is_remote(text: &str) -> bool {
    if text.starts_with("rsync://") || text.contains("::") {
        return true;
    }
    text.find(':')
        .is_some_and(|colon| !text[..colon].contains('/'))
}

/// Parses a remote source operand.
///
/// `port` overrides the daemon port of `host::module` operands; a port in an
/// `rsync://` URL takes precedence.
///
/// # Errors
///
/// [`ClientError::Syntax`] if the operand is local or malformed.
pub fn parse_remote_source(text: &str, port: Option<u16>) -> Result<RemoteSource, ClientError> {
    let default_port = port.unwrap_or(RSYNCD_PORT);

    if let Some(rest) = text.strip_prefix("rsync://") {
        let (authority, module_path) = rest.split_once('/').unwrap_or((rest, ""));
        let authority = strip_user(authority);
        let (host, port) = match authority.strip_prefix('[') {
            Some(bracketed) => {
                let (host, tail) = bracketed
                    .split_once(']')
                    .ok_or_else(|| syntax(format!("unterminated address in {text}")))?;
                (host, tail.strip_prefix(':'))
            }
            None => match authority.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            },
        };
        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| syntax(format!("invalid port in {text}")))?,
            None => default_port,
        };
        return daemon(text, host, port, module_path);
    }

    if let Some((host, module_path)) = text.split_once("::") {
        return daemon(text, strip_user(host), default_port, module_path);
    }

    if operand_is_remote(text) {
        if let Some((host, path)) = text.split_once(':') {
            if host.is_empty() {
                return Err(syntax(format!("missing host in {text}")));
            }
            return Ok(RemoteSource::Shell {
                host: host.to_owned(),
                path: if path.is_empty() { ".".to_owned() } else { path.to_owned() },
            });
        }
    }

    Err(syntax(format!(
        "{text}: local sources are not supported, the source must be remote"
    )))
}

fn daemon(text: &str, host: &str, port: u16, module_path: &str) -> Result<RemoteSource, ClientError> {
    if host.is_empty() {
        return Err(syntax(format!("missing host in {text}")));
    }
    let (module, path) = module_path.split_once('/').unwrap_or((module_path, ""));
    if module.is_empty() {
        return Err(syntax(format!("missing module name in {text}")));
    }
    Ok(RemoteSource::Daemon {
        host: host.to_owned(),
        port,
        module: module.to_owned(),
        path: path.to_owned(),
    })
}

fn strip_user(authority: &str) -> &str {
    authority.rsplit_once('@').map_or(authority, |(_, host)| host)
}

fn syntax(message: String) -> ClientError {
    ClientError::Syntax(message)
}
