//! Network identifiers and the rejection codes carried by error responses.

use core::fmt;

/// Magic placed in the response header when the second word is a [`RejectionCode`].
///
/// No network may use this value as its identifier; otherwise an accepted
/// response would be indistinguishable from a rejection.
pub const HS_ERROR_MAGIC: u32 = 0x0000_0000;

/// 4-byte identifier of the network family a peer belongs to.
///
/// Peers compare the magic of an incoming request against their own before
/// looking at anything else, which rejects foreign traffic early.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NetworkMagic(u32);

impl NetworkMagic {
    /// Identifier of the main network.
    pub const MAIN: Self = Self(0x4741_6841);
    /// Identifier of the public test network.
    pub const TEST: Self = Self(0x2E41_5429);

    /// Wraps an arbitrary identifier, e.g. for a private network.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the value written on the wire.
    #[must_use]
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Reports whether the identifier collides with [`HS_ERROR_MAGIC`].
    #[must_use]
    pub const fn is_error_sentinel(self) -> bool {
        self.0 == HS_ERROR_MAGIC
    }
}

impl From<u32> for NetworkMagic {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<NetworkMagic> for u32 {
    fn from(magic: NetworkMagic) -> Self {
        magic.0
    }
}

impl fmt::Display for NetworkMagic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Reason a responder gave for refusing a handshake request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RejectionCode {
    /// The request could not be understood (bad magic or truncated header).
    WrongRequest,
    /// None of the offered versions is supported by the responder.
    NoMatchedVersion,
    /// A code this implementation does not know.
    Unknown(u32),
}

impl RejectionCode {
    const WRONG_REQUEST: u32 = 0x01;
    const NO_MATCHED_VERSION: u32 = 0x02;

    /// Interprets the second word of an error response.
    #[must_use]
    pub const fn from_u32(code: u32) -> Self {
        match code {
            Self::WRONG_REQUEST => Self::WrongRequest,
            Self::NO_MATCHED_VERSION => Self::NoMatchedVersion,
            other => Self::Unknown(other),
        }
    }

    /// Returns the value written on the wire.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::WrongRequest => Self::WRONG_REQUEST,
            Self::NoMatchedVersion => Self::NO_MATCHED_VERSION,
            Self::Unknown(code) => code,
        }
    }
}

impl fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongRequest => f.write_str("wrong handshake request"),
            Self::NoMatchedVersion => f.write_str("no matched version"),
            Self::Unknown(code) => write!(f, "unknown rejection code {code:#x}"),
        }
    }
}
