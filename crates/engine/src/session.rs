//! Negotiated session context.

use protocol::PROTOCOL_VERSION;

use crate::options::ReceiverOptions;

/// Everything the receiver needs to know about an established session.
///
/// Built once after the transport handshake and passed by reference to
/// every step of the receiver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Session {
    /// User-selected behaviour.
    pub options: ReceiverOptions,
    /// Checksum seed chosen by the sending side.
    pub seed: i32,
    /// Protocol version announced by the peer.
    pub remote_protocol: i32,
    /// Inbound data arrives in multiplexed frames.
    pub multiplexed_input: bool,
    /// Outbound data is wrapped in multiplexed frames.
    pub multiplexed_output: bool,
}

impl Session {
    /// A session whose streams are both plain.
    #[must_use]
    pub const fn new(options: ReceiverOptions, seed: i32) -> Self {
        Self {
            options,
            seed,
            remote_protocol: PROTOCOL_VERSION,
            multiplexed_input: false,
            multiplexed_output: false,
        }
    }

    /// Marks the inbound stream as multiplexed.
    #[must_use]
    pub const fn with_multiplexed_input(mut self) -> Self {
        self.multiplexed_input = true;
        self
    }

    /// Marks the outbound stream as multiplexed.
    #[must_use]
    pub const fn with_multiplexed_output(mut self) -> Self {
        self.multiplexed_output = true;
        self
    }

    /// Records the peer's protocol version.
    #[must_use]
    pub const fn with_remote_protocol(mut self, version: i32) -> Self {
        self.remote_protocol = version;
        self
    }
}
