use std::io::{self, Read, Write};

use super::{RESPONSE_LEN, fill_exact, word_at};
use crate::error::HeaderError;
use crate::magic::{HS_ERROR_MAGIC, NetworkMagic, RejectionCode};
use crate::version::ProtocolVersion;

/// Raw 8-byte response: a magic word followed by a version or an error code.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HandshakeResponseHeader {
    magic: u32,
    value: u32,
}

/// Tagged reading of a [`HandshakeResponseHeader`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseStatus {
    /// The responder picked `version`. The magic still has to be checked
    /// against the local network by the caller.
    Accepted {
        /// Magic the responder answered with.
        magic: NetworkMagic,
        /// Version the responder selected.
        version: ProtocolVersion,
    },
    /// The responder refused the request.
    Rejected(RejectionCode),
}

impl HandshakeResponseHeader {
    /// Creates a response from the raw words.
    #[must_use]
    pub const fn new(magic: u32, value: u32) -> Self {
        Self { magic, value }
    }

    /// Success response announcing `version` on network `magic`.
    #[must_use]
    pub const fn accepted(magic: NetworkMagic, version: ProtocolVersion) -> Self {
        Self::new(magic.as_u32(), version.as_u32())
    }

    /// Error response carrying `code`.
    #[must_use]
    pub const fn rejected(code: RejectionCode) -> Self {
        Self::new(HS_ERROR_MAGIC, code.as_u32())
    }

    /// First word as sent.
    #[must_use]
    pub const fn magic(&self) -> u32 {
        self.magic
    }

    /// Second word as sent: a version or an error code depending on the magic.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Interprets the overloaded magic word.
    #[must_use]
    pub const fn status(&self) -> ResponseStatus {
        if self.magic == HS_ERROR_MAGIC {
            ResponseStatus::Rejected(RejectionCode::from_u32(self.value))
        } else {
            ResponseStatus::Accepted {
                magic: NetworkMagic::new(self.magic),
                version: ProtocolVersion::new(self.value),
            }
        }
    }

    /// Encodes the header; always [`RESPONSE_LEN`] bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; RESPONSE_LEN] {
        let mut buf = [0u8; RESPONSE_LEN];
        buf[..4].copy_from_slice(&self.magic.to_be_bytes());
        buf[4..].copy_from_slice(&self.value.to_be_bytes());
        buf
    }

    /// Writes the encoded header to `writer` without flushing.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.encode())
    }

    /// Decodes the first [`RESPONSE_LEN`] bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < RESPONSE_LEN {
            return Err(HeaderError::Truncated {
                expected: RESPONSE_LEN as u64,
                actual: bytes.len() as u64,
            });
        }
        Ok(Self::new(word_at(bytes, 0), word_at(bytes, 4)))
    }

    /// Reads exactly [`RESPONSE_LEN`] bytes from `reader`.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, HeaderError> {
        let mut buf = [0u8; RESPONSE_LEN];
        fill_exact(reader, &mut buf, 0, RESPONSE_LEN as u64)?;
        Self::decode(&buf)
    }
}

impl From<ResponseStatus> for HandshakeResponseHeader {
    fn from(status: ResponseStatus) -> Self {
        match status {
            ResponseStatus::Accepted { magic, version } => Self::accepted(magic, version),
            ResponseStatus::Rejected(code) => Self::rejected(code),
        }
    }
}
