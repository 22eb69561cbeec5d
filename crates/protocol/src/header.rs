//! Fixed binary headers exchanged before version-specific negotiation.
//!
//! The request carries the initiator's full list of offered versions; the
//! response is a constant [`RESPONSE_LEN`] bytes whose first word doubles as
//! either the network magic or [`crate::HS_ERROR_MAGIC`]. Decoding lifts that
//! overloaded pair into [`ResponseStatus`] so callers never branch on raw words.

use std::io::{self, Read};

use crate::error::HeaderError;

mod request;
mod response;

pub use request::HandshakeRequestHeader;
pub use response::{HandshakeResponseHeader, ResponseStatus};

/// Width of every field on the wire.
pub const VERSION_LEN: usize = 4;

/// Bytes preceding the version list in a request: magic plus count.
pub const REQUEST_PREFIX_LEN: usize = 8;

/// Exact size of a response header.
pub const RESPONSE_LEN: usize = 8;

#[inline]
fn word_at(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; VERSION_LEN];
    word.copy_from_slice(&bytes[offset..offset + VERSION_LEN]);
    u32::from_be_bytes(word)
}

/// Fills `buf` from `reader`, reporting a short read as [`HeaderError::Truncated`].
///
/// `consumed` is the number of header bytes already read before `buf` and
/// `expected` the total the header declared; both only feed the diagnostic.
fn fill_exact<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    consumed: u64,
    expected: u64,
) -> Result<(), HeaderError> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(HeaderError::Truncated {
                    expected,
                    actual: consumed + filled as u64,
                });
            }
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(HeaderError::Truncated {
                    expected,
                    actual: consumed + filled as u64,
                });
            }
            Err(err) => return Err(HeaderError::Io(err)),
        }
    }
    Ok(())
}
