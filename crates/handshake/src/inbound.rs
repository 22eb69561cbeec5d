//! Responder side of the wire handshake.
//!
//! The responder reads the initiator's request, checks the network magic,
//! picks the newest version both sides support and answers with a single
//! response header. Protocol-level refusals (foreign magic, no mutual
//! version, malformed request) are answered with an error response before the
//! error is returned; transport failures and cancellation during the read are
//! not answered at all. At most one response is written per attempt, always
//! before the versioned handshaker runs.

use std::io::{Read, Write};

use protocol::{HandshakeResponseHeader, RejectionCode, select_best};

use crate::base::{BaseWireHandshaker, Direction};
use crate::config::{ConfigError, HandshakeConfig};
use crate::context::HandshakeContext;
use crate::error::HandshakeError;
use crate::versioned::{HandshakeResult, VersionedHandshakerFactory};

/// Drives the responder side of a handshake.
#[derive(Debug)]
pub struct InboundWireHandshaker<F> {
    config: HandshakeConfig,
    factory: F,
}

impl<F> InboundWireHandshaker<F> {
    /// Creates a responder for `config` delegating to `factory`.
    ///
    /// Every version in `config.supported_versions` must be buildable by
    /// `factory`. The responder selects from the configured set alone, so a
    /// version the factory lacks is accepted on the wire and then fails with
    /// [`HandshakeError::VersionedHandshakeFailed`].
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] reported by [`HandshakeConfig::validate`].
    /// A network magic equal to the error sentinel would turn every
    /// acceptance into something the initiator decodes as a rejection.
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

    /// Runs one responder handshake over `reader`/`writer`.
    ///
    /// Both halves of the connection are moved into the versioned handshaker
    /// on success. On failure they are dropped without being shut down; the
    /// caller still owns the underlying connection.
    ///
    /// # Errors
    ///
    /// - [`HandshakeError::MalformedHeader`] when the request was cut short,
    ///   after a `WrongRequest` response was sent.
    /// - [`HandshakeError::WrongMagic`] after a `WrongRequest` response.
    /// - [`HandshakeError::NoMatchedVersion`] after a `NoMatchedVersion`
    ///   response.
    /// - [`HandshakeError::Io`] or [`HandshakeError::Cancelled`] when any
    ///   read or write fails or the context fires.
    /// - [`HandshakeError::VersionedHandshakeFailed`] when the factory or
    ///   the versioned handshaker fails.
    pub fn handle_inbound_peer<R, W>(
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

        let request = match base.read_request(&mut reader) {
            Ok(request) => request,
            Err(err @ HandshakeError::MalformedHeader(_)) => {
                warn_hs!("rejecting malformed handshake request: {}", err);
                base.write_response(
                    &mut writer,
                    &HandshakeResponseHeader::rejected(RejectionCode::WrongRequest),
                )?;
                return Err(err);
            }
            Err(err) => {
                debug_hs!("abandoning inbound handshake before request: {}", err);
                return Err(err);
            }
        };

        let expected = self.config.network_magic;
        if request.magic() != expected {
            warn_hs!(
                "rejecting handshake request with magic {}, expected {}",
                request.magic(),
                expected
            );
            base.write_response(
                &mut writer,
                &HandshakeResponseHeader::rejected(RejectionCode::WrongRequest),
            )?;
            return Err(HandshakeError::WrongMagic {
                expected,
                received: request.magic(),
            });
        }

        let supported = &self.config.supported_versions;
        let version = select_best(supported, request.versions());
        if version.is_unknown() {
            debug_hs!(
                "no mutual p2p version: offered {:?}, supported {:?}",
                request.versions(),
                supported.to_vec()
            );
            base.write_response(
                &mut writer,
                &HandshakeResponseHeader::rejected(RejectionCode::NoMatchedVersion),
            )?;
            return Err(HandshakeError::NoMatchedVersion {
                offered: request.into_versions(),
                supported: supported.to_vec(),
            });
        }

        base.write_response(&mut writer, &HandshakeResponseHeader::accepted(expected, version))?;
        debug_hs!("selected p2p {} for inbound peer", version);

        let handshaker = self
            .factory
            .versioned_handshaker(version, &self.config.identity, reader, writer)
            .map_err(|source| {
                warn_hs!("no versioned handshaker for p2p {}: {}", version, source);
                HandshakeError::versioned(version, source)
            })?;
        base.delegate(handshaker, Direction::Inbound)
    }
}
