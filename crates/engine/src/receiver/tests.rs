use super::*;
use crate::error::ErrorKind;
use crate::options::ReceiverOptions;
use filetime::FileTime;
use serial_test::serial;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use test_support::{SenderScript, scratch_dir, socket_pair, write_file};

const SEED: i32 = 0x1234;

fn client_options() -> ReceiverOptions {
    ReceiverOptions {
        recursive: true,
        preserve_times: true,
        preserve_perms: true,
        ..ReceiverOptions::default()
    }
}

fn client_session(options: ReceiverOptions) -> Session {
    Session::new(options, SEED).with_multiplexed_input()
}

fn mtime(path: &Path) -> i64 {
    FileTime::from_last_modification_time(&fs::symlink_metadata(path).unwrap()).unix_seconds()
}

fn mode(path: &Path) -> u32 {
    fs::metadata(path).unwrap().mode() & 0o7777
}

/// Runs one session against `script` and returns both sides' results.
fn exchange(
    session: &Session,
    script: SenderScript,
    dest: &Path,
) -> (
    Result<ReceiverReport, ReceiverError>,
    std::io::Result<test_support::SenderLog>,
) {
    let (ours, theirs) = socket_pair();
    let sender = script.spawn(theirs);
    let result = run_receiver(session, &ours, &ours, dest);
    drop(ours);
    (result, sender.join())
}

#[test]
#[serial(umask)]
fn single_file_is_transferred() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("nested/dest");
    let script = SenderScript::to_client(SEED).file("a.txt", 0o644, 1000, b"hello world");

    let (result, log) = exchange(&client_session(client_options()), script, &dest);
    let report = result.expect("session");
    let log = log.expect("sender");

    assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"hello world");
    assert_eq!(mode(&dest.join("a.txt")), 0o644);
    assert_eq!(mtime(&dest.join("a.txt")), 1000);

    assert_eq!(log.preamble, Some(0));
    assert_eq!(log.requested, [0]);
    assert_eq!(log.phase_end, Some(-1));
    assert_eq!(log.goodbye, Some(-1));

    assert_eq!(report.files_requested(), 1);
    assert_eq!(report.files_received(), 1);
    assert_eq!(report.directories_fixed(), 0);
    assert_eq!(report.phase(), Phase::Phase2Done);
    assert_eq!(report.stats().map(|stats| stats.total_size), Some(11));
    assert_eq!(
        report.milestones(),
        [
            Milestone::ListReceived,
            Milestone::Sandboxed,
            Milestone::TransferDone,
            Milestone::DirectoriesFixed,
            Milestone::PhaseAcknowledged,
            Milestone::StatsReceived,
            Milestone::Goodbye,
        ]
    );
}

#[test]
#[serial(umask)]
fn new_directory_is_fixed_after_its_contents() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let script = SenderScript::to_client(SEED)
        .directory(".", 0o755, 500)
        .directory("sub", 0o750, 2000)
        .file("sub/a.txt", 0o640, 3000, b"payload");

    let (result, log) = exchange(&client_session(client_options()), script, &dest);
    let report = result.expect("session");
    log.expect("sender");

    assert_eq!(fs::read(dest.join("sub/a.txt")).unwrap(), b"payload");
    // Creating a.txt touched sub; its time is only right if the fixup ran last.
    assert_eq!(mtime(&dest.join("sub")), 2000);
    assert_eq!(mode(&dest.join("sub")), 0o750);
    assert_eq!(mtime(&dest), 500);
    assert_eq!(report.directories_fixed(), 2);
    assert!(report.reached_before(Milestone::TransferDone, Milestone::DirectoriesFixed));
}

#[test]
#[serial(umask)]
fn fixups_match_directory_count() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let script = || {
        SenderScript::to_client(SEED)
            .directory(".", 0o755, 1)
            .directory("a", 0o755, 1)
            .directory("a/b", 0o700, 1)
            .directory("c", 0o755, 1)
            .file("a/b/f", 0o600, 1, b"f")
    };

    let (result, _) = exchange(&client_session(client_options()), script(), &dest);
    assert_eq!(result.expect("session").directories_fixed(), 4);

    let flat = ReceiverOptions {
        recursive: false,
        ..client_options()
    };
    let (result, _) = std::thread::spawn({
        let dest = dest.clone();
        move || exchange(&client_session(flat), script(), &dest)
    })
    .join()
    .unwrap();
    assert_eq!(result.expect("session").directories_fixed(), 0);
}

#[test]
#[serial(umask)]
fn times_only_restores_modes_of_created_directories() {
    use std::os::unix::fs::PermissionsExt;

    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    fs::create_dir_all(dest.join("old")).unwrap();
    fs::set_permissions(dest.join("old"), fs::Permissions::from_mode(0o711)).unwrap();
    let script = SenderScript::to_client(SEED)
        .directory("fresh", 0o700, 4000)
        .directory("old", 0o750, 5000);
    let options = ReceiverOptions {
        preserve_perms: false,
        ..client_options()
    };

    let (result, log) = exchange(&client_session(options), script, &dest);
    let report = result.expect("session");
    log.expect("sender");

    assert_eq!(report.directories_fixed(), 2);
    assert_eq!(mode(&dest.join("fresh")), 0o700);
    assert_eq!(mode(&dest.join("old")), 0o711);
    assert_eq!(mtime(&dest.join("fresh")), 4000);
    assert_eq!(mtime(&dest.join("old")), 5000);
}

#[test]
#[serial(umask)]
fn hangup_mid_loop_fails_without_fixup() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let script = SenderScript::to_client(SEED)
        .directory("sub", 0o755, 5)
        .file("sub/a", 0o644, 1, b"abc")
        .hang_up_after_list();

    let (result, _) = exchange(&client_session(client_options()), script, &dest);
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport, "{err}");
    let sub = dest.join("sub");
    if sub.exists() {
        assert_ne!(mtime(&sub), 5);
    }
    assert!(!dest.join("sub/a").exists());
}

#[test]
#[serial(umask)]
fn nonzero_list_status_fails_before_touching_disk() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let script = SenderScript::to_client(SEED).file("a", 0o644, 1, b"a").status(23);

    let (result, _) = exchange(&client_session(client_options()), script, &dest);
    match result {
        Err(ReceiverError::ListStatus(23)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!dest.exists());
}

#[test]
#[serial(umask)]
fn empty_list_succeeds_without_sandbox() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");

    let (result, log) = exchange(
        &client_session(client_options()),
        SenderScript::to_client(SEED),
        &dest,
    );
    let report = result.expect("session");
    log.expect("sender");
    assert_eq!(report.milestones(), [Milestone::ListReceived]);
    assert!(!report.reached(Milestone::Sandboxed));
    assert!(!dest.exists());
}

#[test]
#[serial(umask)]
fn deletion_happens_before_sandboxing() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    write_file(&dest, "keep", b"old");
    write_file(&dest, "stale", b"x");
    write_file(&dest, "gone/deep/file", b"x");

    let options = ReceiverOptions {
        delete: true,
        ..client_options()
    };
    let script = SenderScript::to_client(SEED)
        .directory(".", 0o755, 1)
        .file("keep", 0o644, 1, b"new");

    let (result, log) = exchange(&client_session(options), script, &dest);
    let report = result.expect("session");
    log.expect("sender");

    assert!(report.reached_before(Milestone::LocalListCollected, Milestone::DeletionDone));
    assert!(report.reached_before(Milestone::DeletionDone, Milestone::Sandboxed));
    assert_eq!(report.entries_deleted(), 4);
    assert!(!dest.join("stale").exists());
    assert!(!dest.join("gone").exists());
    assert_eq!(fs::read(dest.join("keep")).unwrap(), b"new");
}

#[test]
#[serial(umask)]
fn basis_blocks_are_reused() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let original: Vec<u8> = (0..5000u32).map(|i| (i * 31 % 253) as u8).collect();
    let mut updated = original.clone();
    updated[4800..].fill(0xAA);
    updated.extend_from_slice(b"tail");
    write_file(&dest, "data.bin", &original);

    let script = SenderScript::to_client(SEED).file("data.bin", 0o644, 77, &updated);
    let (result, log) = exchange(&client_session(client_options()), script, &dest);
    result.expect("session");
    let log = log.expect("sender");

    assert_eq!(fs::read(dest.join("data.bin")).unwrap(), updated);
    assert_eq!(log.block_sums_received, 8);
    assert_eq!(log.matched_blocks, 6);
}

#[test]
#[serial(umask)]
fn up_to_date_files_are_not_requested() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    write_file(&dest, "same", b"12345");
    filetime::set_file_mtime(dest.join("same"), FileTime::from_unix_time(4242, 0)).unwrap();

    let script = SenderScript::to_client(SEED).file("same", 0o644, 4242, b"12345");
    let (result, log) = exchange(&client_session(client_options()), script, &dest);
    let report = result.expect("session");
    assert!(log.expect("sender").requested.is_empty());
    assert_eq!(report.files_received(), 0);
}

#[test]
#[serial(umask)]
fn dry_run_changes_nothing() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let options = ReceiverOptions {
        dry_run: true,
        delete: true,
        ..client_options()
    };
    let script = SenderScript::to_client(SEED)
        .directory(".", 0o755, 1)
        .directory("sub", 0o755, 1)
        .file("sub/a", 0o644, 1, b"abc")
        .dry_run();

    let (result, log) = exchange(&client_session(options), script, &dest);
    let report = result.expect("session");
    assert_eq!(log.expect("sender").requested, [2]);
    assert_eq!(report.files_received(), 1);
    assert_eq!(report.directories_fixed(), 0);
    assert!(report.reached(Milestone::DeletionDone));
    assert!(!dest.exists());
}

#[test]
#[serial(umask)]
fn auxiliary_messages_are_drained() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let script = SenderScript::to_client(SEED)
        .file("one", 0o644, 1, b"1")
        .file("two", 0o644, 1, b"22")
        .chatter();

    let (result, log) = exchange(&client_session(client_options()), script, &dest);
    result.expect("session");
    assert_eq!(log.expect("sender").requested, [0, 1]);
    assert_eq!(fs::read(dest.join("two")).unwrap(), b"22");
}

#[test]
#[serial(umask)]
fn wrong_phase_ack_is_a_protocol_error() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let script = SenderScript::to_client(SEED).file("a", 0o644, 1, b"a").phase_ack(7);

    let (result, _) = exchange(&client_session(client_options()), script, &dest);
    let err = result.unwrap_err();
    assert!(matches!(err, ReceiverError::PhaseAck(7)), "{err}");
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[test]
#[serial(umask)]
fn server_role_skips_preamble_and_stats() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let options = ReceiverOptions {
        role: Role::Server,
        ..client_options()
    };
    let session = Session::new(options, SEED).with_multiplexed_output();
    let script = SenderScript::to_server(SEED).file("a", 0o600, 9, b"server");

    let (result, log) = exchange(&session, script, &dest);
    let report = result.expect("session");
    let log = log.expect("sender");
    assert_eq!(log.preamble, None);
    assert_eq!(log.goodbye, Some(-1));
    assert!(report.stats().is_none());
    assert!(!report.reached(Milestone::StatsReceived));
    assert_eq!(fs::read(dest.join("a")).unwrap(), b"server");
}

#[test]
#[serial(umask)]
fn symlinks_are_created_with_preserve_links() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let options = ReceiverOptions {
        preserve_links: true,
        ..client_options()
    };
    let script = SenderScript::to_client(SEED)
        .preserve_links()
        .file("target", 0o644, 1, b"t")
        .symlink("link", "target", 1);

    let (result, _) = exchange(&client_session(options), script, &dest);
    result.expect("session");
    assert_eq!(fs::read_link(dest.join("link")).unwrap(), PathBuf::from("target"));
}

#[test]
#[serial(umask)]
fn previous_umask_drives_default_modes_and_is_restored() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("dest");
    let options = ReceiverOptions {
        preserve_perms: false,
        ..client_options()
    };
    let script = SenderScript::to_client(SEED).file("f", 0o600, 1, b"f");

    let outer = UmaskGuard::set(0o027);
    let (result, _) = exchange(&client_session(options), script, &dest);
    result.expect("session");
    assert_eq!(mode(&dest.join("f")), 0o640);

    let check = UmaskGuard::set(0o022);
    assert_eq!(check.previous(), 0o027);
    drop(check);
    drop(outer);
}
