//! Initiator side of the wire handshake.

use std::io::{Read, Write};

use protocol::{HandshakeRequestHeader, ResponseStatus};

use crate::base::{BaseWireHandshaker, Direction};
use crate::config::{ConfigError, HandshakeConfig};
use crate::context::HandshakeContext;
use crate::error::{HandshakeError, MalformedKind};
use crate::versioned::{HandshakeResult, VersionedHandshakerFactory};

/// Drives the initiator side of a handshake.
///
/// The initiator offers every supported version, newest first, and lets the
/// responder choose. Any rejection the responder sends is surfaced as a typed
/// error and never retried.
#[derive(Debug)]
pub struct OutboundWireHandshaker<F> {
    config: HandshakeConfig,
    factory: F,
}

impl<F> OutboundWireHandshaker<F> {
    /// Creates an initiator for `config` delegating to `factory`.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] reported by [`HandshakeConfig::validate`].
    pub fn new(config: HandshakeConfig, factory: F) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, factory })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &HandshakeConfig {
        &self.config
    }

    /// Returns the factory.
    #[must_use]
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Runs one initiator handshake over `reader`/`writer`.
    ///
    /// # Errors
    ///
    /// - [`HandshakeError::WrongRequestRejected`],
    ///   [`HandshakeError::NoMatchedVersionRejected`] or
    ///   [`HandshakeError::UnknownRejectionCode`] when the responder refused.
    /// - [`HandshakeError::MalformedHeader`] when the response was cut short
    ///   or carried a foreign magic.
    /// - [`HandshakeError::Io`] or [`HandshakeError::Cancelled`] when any
    ///   read or write fails or the context fires.
    /// - [`HandshakeError::VersionedHandshakeFailed`] when the factory or
    ///   the versioned handshaker fails.
    pub fn handle_outbound_peer<R, W>(
        &self,
        ctx: &HandshakeContext,
        mut reader: R,
        mut writer: W,
    ) -> Result<HandshakeResult<F::Status>, HandshakeError>
    where
        R: Read,
        W: Write,
        F: VersionedHandshakerFactory<R, W>,
    {
        let base = BaseWireHandshaker::new(ctx);
        let expected = self.config.network_magic;

        let request =
            HandshakeRequestHeader::new(expected, self.config.supported_versions.to_vec());
        base.write_request(&mut writer, &request)?;

        let response = base.read_response(&mut reader)?;
        let version = match response.status() {
            ResponseStatus::Rejected(code) => {
                debug_hs!("remote peer rejected handshake: {}", code);
                return Err(code.into());
            }
            ResponseStatus::Accepted { magic, version } if magic == expected => version,
            ResponseStatus::Accepted { magic, .. } => {
                warn_hs!("handshake response carried magic {}, expected {}", magic, expected);
                return Err(HandshakeError::MalformedHeader(
                    MalformedKind::UnexpectedMagic {
                        expected,
                        received: magic.as_u32(),
                    },
                ));
            }
        };
        debug_hs!("remote peer selected p2p {}", version);

        let handshaker = self
            .factory
            .versioned_handshaker(version, &self.config.identity, reader, writer)
            .map_err(|source| {
                warn_hs!("no versioned handshaker for p2p {}: {}", version, source);
                HandshakeError::versioned(version, source)
            })?;
        base.delegate(handshaker, Direction::Outbound)
    }
}
