//! Arguments for the remote `--server --sender`.
//!
//! # Upstream Reference
//!
//! - `options.c:server_options()` - compact flag string layout

use crate::options::ReceiverOptions;

/// Builds the argument vector that follows the remote program name.
///
/// The layout is `--server --sender -<flags> [--delete] . <path>`; the `.` is
/// the placeholder upstream expects before the source path.
#[must_use]
pub fn server_args(options: &ReceiverOptions, verbosity: u8, path: &str) -> Vec<String> {
    let mut args = vec!["--server".to_owned(), "--sender".to_owned()];
    let flags = flag_string(options, verbosity);
    if flags.len() > 1 {
        args.push(flags);
    }
    if options.deletes() {
        args.push("--delete".to_owned());
    }
    args.push(".".to_owned());
    args.push(path.to_owned());
    args
}

fn flag_string(options: &ReceiverOptions, verbosity: u8) -> String {
    let mut flags = String::from("-");
    for _ in 0..verbosity {
        flags.push('v');
    }
    if options.preserve_links {
        flags.push('l');
    }
    if options.preserve_times {
        flags.push('t');
    }
    if options.preserve_perms {
        flags.push('p');
    }
    if options.recursive {
        flags.push('r');
    }
    if options.dry_run {
        flags.push('n');
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_like_flags_follow_upstream_order() {
        let options = ReceiverOptions {
            recursive: true,
            delete: true,
            preserve_times: true,
            preserve_perms: true,
            preserve_links: true,
            dry_run: true,
            ..ReceiverOptions::default()
        };
        assert_eq!(
            server_args(&options, 2, "src/"),
            ["--server", "--sender", "-vvltprn", "--delete", ".", "src/"]
        );
    }

    #[test]
    fn no_flags_omits_the_flag_word() {
        assert_eq!(
            server_args(&ReceiverOptions::default(), 0, "file"),
            ["--server", "--sender", ".", "file"]
        );
    }

    #[test]
    fn delete_without_recursion_is_not_sent() {
        let options = ReceiverOptions {
            delete: true,
            ..ReceiverOptions::default()
        };
        assert!(!server_args(&options, 0, "x").contains(&"--delete".to_owned()));
    }
}
