#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `handshake` runs the wire handshake that every p2p connection goes through
//! before application traffic flows. Two peers agree on the newest protocol
//! version they both speak, then a version-specific handshaker finishes the
//! negotiation and yields a framed message channel.
//!
//! # Design
//!
//! - [`InboundWireHandshaker`] drives the responder: read the request, check
//!   the network magic, select a version, answer, delegate.
//! - [`OutboundWireHandshaker`] drives the initiator: offer every supported
//!   version, read the answer, delegate.
//! - Both compose a private header reader/writer built on the `protocol`
//!   crate's codec; neither shares state with the other.
//! - [`VersionedHandshakerFactory`] is the open seam for version-specific
//!   negotiation. [`VersionRegistry`] is the table-backed implementation.
//!
//! Every blocking step takes a [`HandshakeContext`]. The context is polled
//! before each transport call, so transports should be configured with a short
//! timeout ([`tcp::configure_poll_interval`]) for the deadline to take effect
//! promptly.
//!
//! # Invariants
//!
//! - The responder writes at most one response header per attempt, and always
//!   before the versioned handshaker runs.
//! - Transport failures and cancellation while reading the request are never
//!   answered.
//! - A [`HandshakeResult`] is only returned when every step succeeded.
//! - The connection is never closed here; callers discard it on error.
//!
//! # Examples
//!
//! Run both sides over in-memory buffers with a registry whose handshakers
//! finish immediately.
//!
//! ```
//! use std::io::{self, Cursor};
//!
//! use handshake::{
//!     BoxError, BoxedHandshaker, HandshakeConfig, HandshakeContext, InboundWireHandshaker,
//!     MessageReadWriter, OutboundWireHandshaker, VersionRegistry, VersionedHandshaker,
//! };
//! use protocol::ProtocolVersion;
//!
//! struct Loopback(Vec<Vec<u8>>);
//!
//! impl MessageReadWriter for Loopback {
//!     fn read_message(&mut self) -> io::Result<Vec<u8>> {
//!         self.0.pop().ok_or_else(|| io::ErrorKind::UnexpectedEof.into())
//!     }
//!     fn write_message(&mut self, message: &[u8]) -> io::Result<()> {
//!         self.0.push(message.to_vec());
//!         Ok(())
//!     }
//! }
//!
//! struct Ready(ProtocolVersion);
//!
//! impl VersionedHandshaker for Ready {
//!     type Status = ProtocolVersion;
//!     fn version(&self) -> ProtocolVersion {
//!         self.0
//!     }
//!     fn complete_inbound(&mut self, _: &HandshakeContext) -> Result<ProtocolVersion, BoxError> {
//!         Ok(self.0)
//!     }
//!     fn complete_outbound(&mut self, _: &HandshakeContext) -> Result<ProtocolVersion, BoxError> {
//!         Ok(self.0)
//!     }
//!     fn into_message_channel(self: Box<Self>) -> Box<dyn MessageReadWriter> {
//!         Box::new(Loopback(Vec::new()))
//!     }
//! }
//!
//! fn registry<R, W>() -> VersionRegistry<R, W, ProtocolVersion> {
//!     VersionRegistry::new().with(ProtocolVersion::V031, |_, _, _| {
//!         Ok(Box::new(Ready(ProtocolVersion::V031)) as BoxedHandshaker<ProtocolVersion>)
//!     })
//! }
//!
//! // Advertise exactly the versions the registry can complete.
//! let versions = registry::<io::Empty, io::Sink>().supported_versions();
//! let config = HandshakeConfig::new().supported_versions(versions);
//!
//! // The initiator's request, answered by a responder built from the same registry.
//! let mut request = Vec::new();
//! let _ = OutboundWireHandshaker::new(config.clone(), registry())
//!     .expect("valid config")
//!     .handle_outbound_peer(&config.context(), Cursor::new(Vec::new()), &mut request);
//!
//! let mut response = Vec::new();
//! let inbound = InboundWireHandshaker::new(config.clone(), registry())
//!     .expect("valid config")
//!     .handle_inbound_peer(&config.context(), Cursor::new(request), &mut response)
//!     .expect("responder accepts");
//! assert_eq!(*inbound.status(), ProtocolVersion::V031);
//!
//! let outbound = OutboundWireHandshaker::new(config.clone(), registry())
//!     .expect("valid config")
//!     .handle_outbound_peer(&config.context(), Cursor::new(response), io::sink())
//!     .expect("initiator completes");
//! assert_eq!(outbound.version(), ProtocolVersion::V031);
//! ```
//!
//! # See also
//!
//! - The `protocol` crate for the header codec and [`protocol::select_best`].

#[macro_use]
mod trace;

mod base;
mod config;
mod context;
mod error;
mod inbound;
mod outbound;
mod stream;
pub mod tcp;
mod versioned;

#[cfg(test)]
mod test_support;

pub use config::{
    ConfigError, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_POLL_INTERVAL_MS, HandshakeConfig,
    PeerIdentity,
};
pub use context::{CancellationToken, Cancelled, HandshakeContext};
pub use error::{BoxError, HandshakeError, MalformedKind};
pub use inbound::InboundWireHandshaker;
pub use outbound::OutboundWireHandshaker;
pub use stream::{ContextReader, ContextWriter, cancellation_of};
pub use versioned::{
    BoxedHandshaker, HandshakeResult, MessageReadWriter, UnregisteredVersion, VersionRegistry,
    VersionedHandshaker, VersionedHandshakerFactory,
};
