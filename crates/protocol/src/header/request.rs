use std::io::{self, Read, Write};

use super::{REQUEST_PREFIX_LEN, VERSION_LEN, fill_exact, word_at};
use crate::error::HeaderError;
use crate::magic::NetworkMagic;
use crate::version::ProtocolVersion;

/// Versions decoded per read call while streaming a request.
const VERSIONS_PER_CHUNK: usize = 64;

/// Upper bound on the up-front reservation for the version list.
///
/// The count field is peer controlled, so the list grows with the bytes that
/// actually arrive instead of trusting it for allocation.
const MAX_PREALLOCATED_VERSIONS: usize = 256;

/// Request sent by the initiator: its network magic and every version it can speak.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandshakeRequestHeader {
    magic: NetworkMagic,
    versions: Vec<ProtocolVersion>,
}

impl HandshakeRequestHeader {
    /// Creates a request offering `versions` in the given order.
    #[must_use]
    pub fn new(magic: NetworkMagic, versions: Vec<ProtocolVersion>) -> Self {
        Self { magic, versions }
    }

    /// Magic claimed by the sender.
    #[must_use]
    pub const fn magic(&self) -> NetworkMagic {
        self.magic
    }

    /// Offered versions in wire order.
    #[must_use]
    pub fn versions(&self) -> &[ProtocolVersion] {
        &self.versions
    }

    /// Consumes the header and returns the offered versions.
    #[must_use]
    pub fn into_versions(self) -> Vec<ProtocolVersion> {
        self.versions
    }

    /// Size of the encoded header: `8 + 4 * versions`.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        REQUEST_PREFIX_LEN + VERSION_LEN * self.versions.len()
    }

    /// Encodes the header into a fresh buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        debug_assert!(u32::try_from(self.versions.len()).is_ok());

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&self.magic.as_u32().to_be_bytes());
        buf.extend_from_slice(&(self.versions.len() as u32).to_be_bytes());
        for version in &self.versions {
            buf.extend_from_slice(&version.as_u32().to_be_bytes());
        }
        buf
    }

    /// Writes the encoded header to `writer` without flushing.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.encode())
    }

    /// Decodes a header from the start of `bytes`.
    ///
    /// Returns the header together with the number of bytes it occupied;
    /// anything after that is left for the caller.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), HeaderError> {
        if bytes.len() < REQUEST_PREFIX_LEN {
            return Err(HeaderError::Truncated {
                expected: REQUEST_PREFIX_LEN as u64,
                actual: bytes.len() as u64,
            });
        }

        let magic = NetworkMagic::new(word_at(bytes, 0));
        let count = word_at(bytes, 4);
        let expected = declared_len(count);
        if (bytes.len() as u64) < expected {
            return Err(HeaderError::Truncated {
                expected,
                actual: bytes.len() as u64,
            });
        }

        // `expected` fits in the slice length, so it fits in usize.
        let consumed = expected as usize;
        let versions = bytes[REQUEST_PREFIX_LEN..consumed]
            .chunks_exact(VERSION_LEN)
            .map(|chunk| ProtocolVersion::new(word_at(chunk, 0)))
            .collect();

        Ok((Self { magic, versions }, consumed))
    }

    /// Reads exactly one header from `reader`.
    ///
    /// On success the reader is positioned immediately after the last version.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, HeaderError> {
        let mut prefix = [0u8; REQUEST_PREFIX_LEN];
        fill_exact(reader, &mut prefix, 0, REQUEST_PREFIX_LEN as u64)?;

        let magic = NetworkMagic::new(word_at(&prefix, 0));
        let count = word_at(&prefix, 4);
        let expected = declared_len(count);

        let mut remaining = count as usize;
        let mut versions = Vec::with_capacity(remaining.min(MAX_PREALLOCATED_VERSIONS));
        let mut consumed = REQUEST_PREFIX_LEN as u64;
        let mut chunk = [0u8; VERSION_LEN * VERSIONS_PER_CHUNK];

        while remaining > 0 {
            let take = remaining.min(VERSIONS_PER_CHUNK);
            let bytes = &mut chunk[..take * VERSION_LEN];
            fill_exact(reader, bytes, consumed, expected)?;
            versions.extend(
                bytes
                    .chunks_exact(VERSION_LEN)
                    .map(|word| ProtocolVersion::new(word_at(word, 0))),
            );
            consumed += bytes.len() as u64;
            remaining -= take;
        }

        Ok(Self { magic, versions })
    }
}

fn declared_len(count: u32) -> u64 {
    REQUEST_PREFIX_LEN as u64 + VERSION_LEN as u64 * u64::from(count)
}
