//! A scripted sending peer.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use checksums::{BlockLayout, BlockSum};
use protocol::{
    Demultiplexer, FileEntry, FileListWriter, MessageCode, MplexWriter, TransferStats, read_int,
    write_int,
};

use crate::delta::write_delta;

/// Returns a connected pair: the receiver's end first, the sender's second.
pub fn socket_pair() -> (UnixStream, UnixStream) {
    UnixStream::pair().expect("socket pair")
}

/// What the sender does and expects during one session.
#[derive(Clone, Debug)]
pub struct SenderScript {
    entries: Vec<FileEntry>,
    contents: HashMap<PathBuf, Vec<u8>>,
    seed: i32,
    status: i32,
    phase_ack: i32,
    preserve_links: bool,
    dry_run: bool,
    chatter: bool,
    hang_up_after_list: bool,
    peer_is_server: bool,
    stats: TransferStats,
}

impl SenderScript {
    /// A sender talking to a top-level receiver.
    ///
    /// It expects the receiver's preamble, multiplexes its own output and
    /// sends statistics after the phase handshake.
    pub fn to_client(seed: i32) -> Self {
        Self {
            entries: Vec::new(),
            contents: HashMap::new(),
            seed,
            status: 0,
            phase_ack: -1,
            preserve_links: false,
            dry_run: false,
            chatter: false,
            hang_up_after_list: false,
            peer_is_server: false,
            stats: TransferStats::new(100, 2000, 0),
        }
    }

    /// A client-side sender feeding a `--server` receiver.
    ///
    /// It sends an empty exclusion list, writes plain output, reads the
    /// receiver's multiplexed output and sends no statistics.
    pub fn to_server(seed: i32) -> Self {
        Self {
            peer_is_server: true,
            ..Self::to_client(seed)
        }
    }

    /// Adds a regular file.
    pub fn file(mut self, path: &str, mode: u32, mtime: i64, data: &[u8]) -> Self {
        let entry = FileEntry::file(path, mode, mtime, data.len() as u64).expect("valid path");
        self.contents.insert(PathBuf::from(path), data.to_vec());
        self.stats.total_size += data.len() as u64;
        self.entries.push(entry);
        self
    }

    /// Adds a directory.
    pub fn directory(mut self, path: &str, mode: u32, mtime: i64) -> Self {
        self.entries
            .push(FileEntry::directory(path, mode, mtime).expect("valid path"));
        self
    }

    /// Adds a symbolic link.
    pub fn symlink(mut self, path: &str, target: &str, mtime: i64) -> Self {
        self.entries
            .push(FileEntry::symlink(path, target, mtime).expect("valid path"));
        self
    }

    /// Status int sent after the file list.
    pub fn status(mut self, status: i32) -> Self {
        self.status = status;
        self
    }

    /// Value returned for the receiver's phase-end sentinel.
    pub fn phase_ack(mut self, ack: i32) -> Self {
        self.phase_ack = ack;
        self
    }

    /// Sends symlink targets in the file list.
    pub fn preserve_links(mut self) -> Self {
        self.preserve_links = true;
        self
    }

    /// Expects bare indices and replies without data.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Interleaves an info message before every reply (multiplexed output only).
    pub fn chatter(mut self) -> Self {
        self.chatter = true;
        self
    }

    /// Closes the connection right after the list status.
    pub fn hang_up_after_list(mut self) -> Self {
        self.hang_up_after_list = true;
        self
    }

    /// Runs the script on a background thread over a socket.
    pub fn spawn(self, stream: UnixStream) -> MockSender {
        let reader = stream.try_clone().expect("clone socket");
        self.spawn_over(reader, stream)
    }

    /// Runs the script over a separate reader and writer, such as the pipes
    /// of a child process.
    ///
    /// Both ends are closed when the script returns.
    pub fn spawn_over<R, W>(self, reader: R, writer: W) -> MockSender
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("mock-sender".into())
            .spawn(move || self.run(reader, writer))
            .expect("spawn mock sender");
        MockSender { handle }
    }

    fn run<R: Read, W: Write>(self, reader: R, writer: W) -> io::Result<SenderLog> {
        let mut log = SenderLog::default();
        let mut input = if self.peer_is_server {
            Demultiplexer::multiplexed(reader)
        } else {
            Demultiplexer::new(reader)
        };
        input.set_message_handler(|_, _| {});
        let mut output = if self.peer_is_server {
            MplexWriter::new(writer)
        } else {
            MplexWriter::multiplexed(writer)
        };

        if self.peer_is_server {
            write_int(&mut output, 0)?;
        } else {
            log.preamble = Some(read_int(&mut input)?);
        }

        self.send_list(&mut output)?;
        if self.hang_up_after_list || self.status != 0 {
            return Ok(log);
        }
        if self.entries.is_empty() && !self.peer_is_server {
            // A top-level receiver stops after an empty list.
            return Ok(log);
        }

        // Requests until the uploader's sentinel, then end our phase.
        loop {
            let index = read_int(&mut input)?;
            if index == -1 {
                write_int(&mut output, -1)?;
                output.flush()?;
                break;
            }
            log.requested.push(index);
            self.reply(&mut input, &mut output, index, &mut log)?;
        }

        log.phase_end = Some(read_int(&mut input)?);
        write_int(&mut output, self.phase_ack)?;
        output.flush()?;
        if self.phase_ack != -1 {
            return Ok(log);
        }

        if !self.peer_is_server {
            self.stats.write_to(&mut output)?;
            output.flush()?;
        }
        log.goodbye = Some(read_int(&mut input)?);
        Ok(log)
    }

    fn send_list<W: Write>(&self, output: &mut MplexWriter<W>) -> io::Result<()> {
        if self.chatter {
            output.send_message(MessageCode::Info, b"welcome to the mock sender\n")?;
        }
        let mut writer = FileListWriter::new(self.preserve_links);
        for entry in &self.entries {
            writer.write_entry(output, entry)?;
        }
        writer.write_end(output)?;
        write_int(output, self.status)?;
        output.flush()
    }

    fn reply<R: Read, W: Write>(
        &self,
        input: &mut R,
        output: &mut MplexWriter<W>,
        index: i32,
        log: &mut SenderLog,
    ) -> io::Result<()> {
        let entry = self.sorted_entry(index)?;
        if self.chatter {
            output.send_message(MessageCode::Info, format!("sending {index}\n").as_bytes())?;
        }
        if self.dry_run {
            write_int(output, index)?;
            return output.flush();
        }

        let count = read_int(input)?;
        let block_len = read_int(input)?;
        let csum_len = read_int(input)?;
        let remainder = read_int(input)?;
        let mut sums = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let rolling = read_int(input)? as u32;
            let mut strong = [0u8; 16];
            input.read_exact(&mut strong[..csum_len as usize])?;
            sums.push(BlockSum { rolling, strong });
        }
        log.block_sums_received += sums.len();

        write_int(output, index)?;
        for field in [count, block_len, csum_len, remainder] {
            write_int(output, field)?;
        }
        let layout = BlockLayout::from_parts(block_len as u32, count as u32, remainder as u32);
        let source = self
            .contents
            .get(entry.path())
            .map_or(&[][..], Vec::as_slice);
        let summary = write_delta(output, source, layout, &sums, csum_len as usize, self.seed)?;
        log.matched_blocks += summary.matched_blocks;
        log.literal_bytes += summary.literal_bytes;
        output.flush()
    }

    /// Entry at `index` in the order the receiver sees the list.
    fn sorted_entry(&self, index: i32) -> io::Result<FileEntry> {
        let list = protocol::FileList::from_entries(self.entries.clone());
        usize::try_from(index)
            .ok()
            .and_then(|index| list.get(index).cloned())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, format!("bad index {index}"))
            })
    }
}

/// What the mock sender observed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SenderLog {
    /// The receiver's preamble int, when one was expected.
    pub preamble: Option<i32>,
    /// File indices the receiver asked for, in order.
    pub requested: Vec<i32>,
    /// Block checksums received across all requests.
    pub block_sums_received: usize,
    /// Blocks the receiver could reuse.
    pub matched_blocks: usize,
    /// Literal bytes sent.
    pub literal_bytes: usize,
    /// The receiver's phase-end int.
    pub phase_end: Option<i32>,
    /// The receiver's goodbye int.
    pub goodbye: Option<i32>,
}

/// Handle to a running [`SenderScript`].
#[derive(Debug)]
pub struct MockSender {
    handle: JoinHandle<io::Result<SenderLog>>,
}

impl MockSender {
    /// Waits for the script to finish.
    pub fn join(self) -> io::Result<SenderLog> {
        self.handle.join().expect("mock sender panicked")
    }
}
