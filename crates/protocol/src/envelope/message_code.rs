use std::fmt;

/// Tags used for multiplexed messages flowing over the protocol stream.
///
/// The numeric values mirror upstream's `enum msgcode`. Protocol 27 peers only
/// emit the first eight codes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum MessageCode {
    #[doc(alias = "MSG_DATA")]
    /// Application payload.
    Data = 0,
    #[doc(alias = "MSG_ERROR_XFER")]
    /// Transfer error reported by the peer (`FERROR_XFER`).
    ErrorXfer = 1,
    #[doc(alias = "MSG_INFO")]
    /// Informational log message (`FINFO`).
    Info = 2,
    #[doc(alias = "MSG_ERROR")]
    /// Error message (`FERROR`).
    Error = 3,
    #[doc(alias = "MSG_WARNING")]
    /// Warning message (`FWARNING`).
    Warning = 4,
    #[doc(alias = "MSG_ERROR_SOCKET")]
    /// Socket-level error (`FERROR_SOCKET`).
    ErrorSocket = 5,
    #[doc(alias = "MSG_LOG")]
    /// Daemon log-file message (`FLOG`).
    Log = 6,
    #[doc(alias = "MSG_CLIENT")]
    /// Client-only message (`FCLIENT`).
    Client = 7,
}

impl MessageCode {
    /// Returns the numeric representation expected on the wire.
    #[must_use]
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Attempts to construct a [`MessageCode`] from its on-the-wire value.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Data),
            1 => Some(Self::ErrorXfer),
            2 => Some(Self::Info),
            3 => Some(Self::Error),
            4 => Some(Self::Warning),
            5 => Some(Self::ErrorSocket),
            6 => Some(Self::Log),
            7 => Some(Self::Client),
            _ => None,
        }
    }

    /// Returns `true` for codes that carry diagnostics rather than data.
    #[must_use]
    pub const fn is_auxiliary(self) -> bool {
        !matches!(self, Self::Data)
    }

    /// Returns `true` for the error-class codes.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::ErrorXfer | Self::Error | Self::ErrorSocket)
    }

    /// Upstream mnemonic for the code.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Data => "MSG_DATA",
            Self::ErrorXfer => "MSG_ERROR_XFER",
            Self::Info => "MSG_INFO",
            Self::Error => "MSG_ERROR",
            Self::Warning => "MSG_WARNING",
            Self::ErrorSocket => "MSG_ERROR_SOCKET",
            Self::Log => "MSG_LOG",
            Self::Client => "MSG_CLIENT",
        }
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
