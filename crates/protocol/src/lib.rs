#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Wire-level building blocks for the p2p version handshake.
//!
//! The crate owns the two fixed binary header shapes exchanged before any
//! application traffic flows, the [`ProtocolVersion`] and [`NetworkMagic`]
//! identifiers they carry, and the deterministic [`select_best`] routine that
//! picks the version both peers speak. Nothing here performs I/O policy:
//! cancellation, deadlines and error responses live in the `handshake` crate.
//!
//! # Wire format
//!
//! Every field is a 4-byte big-endian word.
//!
//! - Request: `magic | count | version[0] | ... | version[count - 1]`
//! - Response: `magic_or_error_magic | version_or_error_code`, always
//!   [`RESPONSE_LEN`] bytes.
//!
//! # Examples
//!
//! Encode a request and read it back from the same bytes.
//!
//! ```
//! use protocol::{HandshakeRequestHeader, NetworkMagic, ProtocolVersion};
//!
//! let request = HandshakeRequestHeader::new(
//!     NetworkMagic::MAIN,
//!     vec![ProtocolVersion::V031, ProtocolVersion::V030],
//! );
//! let bytes = request.encode();
//! assert_eq!(bytes.len(), 16);
//!
//! let (decoded, consumed) = HandshakeRequestHeader::decode(&bytes).expect("complete header");
//! assert_eq!(decoded, request);
//! assert_eq!(consumed, bytes.len());
//! ```
//!
//! Pick the best version both sides support.
//!
//! ```
//! use protocol::{ProtocolVersion, SupportedVersions, select_best};
//!
//! let local = SupportedVersions::new([ProtocolVersion::V031, ProtocolVersion::V030]);
//! let offered = [ProtocolVersion::V033, ProtocolVersion::V030, ProtocolVersion::V031];
//! assert_eq!(select_best(&local, &offered), ProtocolVersion::V031);
//! assert_eq!(select_best(&local, &[]), ProtocolVersion::UNKNOWN);
//! ```

mod error;
mod header;
mod magic;
mod version;

pub use error::HeaderError;
pub use header::{
    HandshakeRequestHeader, HandshakeResponseHeader, REQUEST_PREFIX_LEN, RESPONSE_LEN,
    ResponseStatus, VERSION_LEN,
};
pub use magic::{HS_ERROR_MAGIC, NetworkMagic, RejectionCode};
pub use version::{ProtocolVersion, SupportedVersions, select_best};
