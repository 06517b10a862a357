//! Pulling a module from a scripted daemon with the `rxsync` binary.

use std::fs;
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::process::Command;
use std::thread::{self, JoinHandle};

use filetime::FileTime;
use protocol::{read_daemon_line, write_int};
use test_support::{SenderLog, SenderScript, scratch_dir, write_file};

const SEED: i32 = 0x5eed;

struct Daemon {
    port: u16,
    handle: JoinHandle<(Vec<String>, SenderLog)>,
}

/// Accepts one connection, greets it and hands the socket to `script`.
fn daemon(motd: &'static str, script: SenderScript) -> Daemon {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        let args = greet(&mut socket, motd);
        let reader = socket.try_clone().unwrap();
        let log = script.spawn_over(reader, socket).join().expect("sender");
        (args, log)
    });
    Daemon { port, handle }
}

fn greet(socket: &mut TcpStream, motd: &str) -> Vec<String> {
    assert_eq!(read_daemon_line(socket).unwrap(), "@RSYNCD: 27");
    socket.write_all(b"@RSYNCD: 27\n").unwrap();
    assert_eq!(read_daemon_line(socket).unwrap(), "files");
    socket.write_all(motd.as_bytes()).unwrap();
    socket.write_all(b"@RSYNCD: OK\n").unwrap();

    let mut args = Vec::new();
    loop {
        let line = read_daemon_line(socket).unwrap();
        if line.is_empty() {
            break;
        }
        args.push(line);
    }
    write_int(socket, SEED).unwrap();
    args
}

#[test]
fn module_is_pulled_into_destination() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("mirror");
    let script = SenderScript::to_client(SEED)
        .directory(".", 0o755, 100)
        .directory("sub", 0o755, 200)
        .file("sub/data.bin", 0o644, 300, &[42u8; 10_000])
        .file("notes.txt", 0o600, 400, b"notes\n");
    let daemon = daemon("Welcome to the test daemon\n", script);

    let output = Command::new(env!("CARGO_BIN_EXE_rxsync"))
        .args(["-rtp", "-v"])
        .arg(format!("rsync://127.0.0.1:{}/files/tree", daemon.port))
        .arg(&dest)
        .output()
        .unwrap();
    let (args, log) = daemon.handle.join().unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(args, ["--server", "--sender", "-vtpr", ".", "files/tree"]);
    assert_eq!(log.preamble, Some(0));
    assert_eq!(log.requested.len(), 2);
    assert_eq!(log.goodbye, Some(-1));

    assert_eq!(fs::read(dest.join("sub/data.bin")).unwrap(), vec![42u8; 10_000]);
    assert_eq!(fs::read(dest.join("notes.txt")).unwrap(), b"notes\n");
    let sub = fs::metadata(dest.join("sub")).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&sub).unix_seconds(), 200);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("received 2 of 4 entries"), "{stdout}");
}

#[test]
fn unchanged_basis_is_reused() {
    let scratch = scratch_dir();
    let dest = scratch.path().join("mirror");
    let mut contents = vec![0u8; 64 * 1024];
    for (i, byte) in contents.iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    write_file(&dest, "big.bin", &contents[..60 * 1024]);
    contents[100] ^= 0xff;

    let script = SenderScript::to_client(SEED).file("big.bin", 0o644, 5_000, &contents);
    let daemon = daemon("", script);

    let status = Command::new(env!("CARGO_BIN_EXE_rxsync"))
        .args(["-t", "--port", &daemon.port.to_string()])
        .arg("127.0.0.1::files/big.bin")
        .arg(&dest)
        .status()
        .unwrap();
    let (_, log) = daemon.handle.join().unwrap();

    assert!(status.success());
    assert!(log.block_sums_received > 0);
    assert!(log.matched_blocks > 0);
    assert!(log.literal_bytes < contents.len());
    assert_eq!(fs::read(dest.join("big.bin")).unwrap(), contents);
}
