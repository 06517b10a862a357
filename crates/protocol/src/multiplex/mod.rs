//! Multiplexed stream support.
//!
//! Once a session enables multiplexing, every byte travels inside an envelope
//! frame. Data frames carry the protocol stream itself; all other codes are
//! out-of-band diagnostics from the peer.

mod io;
mod reader;
mod writer;

pub use io::{read_header, send_msg};
pub use reader::{Demultiplexer, MessageHandler, log_remote_message};
pub use writer::MplexWriter;
