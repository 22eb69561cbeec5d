//! Seam between version negotiation and version-specific negotiation.
//!
//! Once both peers agree on a [`ProtocolVersion`], the directional handshakers
//! ask a [`VersionedHandshakerFactory`] for a [`VersionedHandshaker`] bound to
//! that version and hand it the connection. The set of versions is open:
//! [`VersionRegistry`] maps each version to a constructor registered at
//! startup, and any other type implementing the factory trait works too.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use protocol::{ProtocolVersion, SupportedVersions};
use thiserror::Error;

use crate::config::PeerIdentity;
use crate::context::HandshakeContext;
use crate::error::BoxError;

/// Framed channel carrying post-handshake application messages.
pub trait MessageReadWriter: Send {
    /// Reads the next complete message.
    fn read_message(&mut self) -> io::Result<Vec<u8>>;

    /// Writes one complete message.
    fn write_message(&mut self, message: &[u8]) -> io::Result<()>;
}

impl<T: MessageReadWriter + ?Sized> MessageReadWriter for Box<T> {
    fn read_message(&mut self) -> io::Result<Vec<u8>> {
        (**self).read_message()
    }

    fn write_message(&mut self, message: &[u8]) -> io::Result<()> {
        (**self).write_message(message)
    }
}

/// Completes negotiation for one protocol version on one connection.
pub trait VersionedHandshaker: Send {
    /// Peer status produced by a successful exchange.
    type Status;

    /// Version this handshaker speaks.
    fn version(&self) -> ProtocolVersion;

    /// Finishes the responder side after the success response was sent.
    fn complete_inbound(&mut self, ctx: &HandshakeContext) -> Result<Self::Status, BoxError>;

    /// Finishes the initiator side after the success response was read.
    fn complete_outbound(&mut self, ctx: &HandshakeContext) -> Result<Self::Status, BoxError>;

    /// Surrenders the framed channel for application traffic.
    fn into_message_channel(self: Box<Self>) -> Box<dyn MessageReadWriter>;
}

/// Type-erased versioned handshaker producing `S`.
pub type BoxedHandshaker<S> = Box<dyn VersionedHandshaker<Status = S>>;

/// Produces versioned handshakers for negotiated versions.
///
/// Shared by every concurrent attempt, so lookups must not mutate
/// attempt-specific state.
pub trait VersionedHandshakerFactory<R, W>: Send + Sync {
    /// Status type of the produced handshakers.
    type Status;

    /// Builds a handshaker for `version` that takes over `reader` and `writer`.
    fn versioned_handshaker(
        &self,
        version: ProtocolVersion,
        identity: &PeerIdentity,
        reader: R,
        writer: W,
    ) -> Result<BoxedHandshaker<Self::Status>, BoxError>;
}

impl<R, W, F> VersionedHandshakerFactory<R, W> for Arc<F>
where
    F: VersionedHandshakerFactory<R, W> + ?Sized,
{
    type Status = F::Status;

    fn versioned_handshaker(
        &self,
        version: ProtocolVersion,
        identity: &PeerIdentity,
        reader: R,
        writer: W,
    ) -> Result<BoxedHandshaker<Self::Status>, BoxError> {
        (**self).versioned_handshaker(version, identity, reader, writer)
    }
}

/// Lookup for a version nobody registered a constructor for.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("no handshaker registered for p2p version {0}")]
pub struct UnregisteredVersion(pub ProtocolVersion);

type Constructor<R, W, S> =
    Arc<dyn Fn(&PeerIdentity, R, W) -> Result<BoxedHandshaker<S>, BoxError> + Send + Sync>;

/// Factory backed by a table of per-version constructors.
///
/// Built once at startup and shared read-only, typically behind an [`Arc`].
pub struct VersionRegistry<R, W, S> {
    constructors: BTreeMap<ProtocolVersion, Constructor<R, W, S>>,
}

impl<R, W, S> Default for VersionRegistry<R, W, S> {
    fn default() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }
}

impl<R, W, S> VersionRegistry<R, W, S> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `constructor` for `version`, replacing any previous one.
    ///
    /// Returns `false` and registers nothing for [`ProtocolVersion::UNKNOWN`].
    pub fn register<C>(&mut self, version: ProtocolVersion, constructor: C) -> bool
    where
        C: Fn(&PeerIdentity, R, W) -> Result<BoxedHandshaker<S>, BoxError> + Send + Sync + 'static,
    {
        if version.is_unknown() {
            return false;
        }
        self.constructors.insert(version, Arc::new(constructor));
        true
    }

    /// Builder form of [`VersionRegistry::register`].
    #[must_use]
    pub fn with<C>(mut self, version: ProtocolVersion, constructor: C) -> Self
    where
        C: Fn(&PeerIdentity, R, W) -> Result<BoxedHandshaker<S>, BoxError> + Send + Sync + 'static,
    {
        self.register(version, constructor);
        self
    }

    /// Reports whether `version` has a constructor.
    #[must_use]
    pub fn contains(&self, version: ProtocolVersion) -> bool {
        self.constructors.contains_key(&version)
    }

    /// Versions with a constructor, suitable for
    /// [`crate::HandshakeConfig::supported_versions`].
    #[must_use]
    pub fn supported_versions(&self) -> SupportedVersions {
        self.constructors.keys().copied().collect()
    }
}

impl<R, W, S> fmt::Debug for VersionRegistry<R, W, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionRegistry")
            .field("versions", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<R, W, S> VersionedHandshakerFactory<R, W> for VersionRegistry<R, W, S> {
    type Status = S;

    fn versioned_handshaker(
        &self,
        version: ProtocolVersion,
        identity: &PeerIdentity,
        reader: R,
        writer: W,
    ) -> Result<BoxedHandshaker<S>, BoxError> {
        let constructor = self
            .constructors
            .get(&version)
            .ok_or(UnregisteredVersion(version))?;
        constructor(identity, reader, writer)
    }
}

/// Outcome of a completed handshake.
///
/// Only produced when every step succeeded; the caller owns it outright.
pub struct HandshakeResult<S> {
    version: ProtocolVersion,
    status: S,
    channel: Box<dyn MessageReadWriter>,
}

impl<S> HandshakeResult<S> {
    pub(crate) fn new(
        version: ProtocolVersion,
        status: S,
        channel: Box<dyn MessageReadWriter>,
    ) -> Self {
        Self {
            version,
            status,
            channel,
        }
    }

    /// Negotiated version.
    #[must_use]
    pub const fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Status reported by the versioned handshaker.
    #[must_use]
    pub const fn status(&self) -> &S {
        &self.status
    }

    /// Channel for application traffic.
    pub fn channel(&mut self) -> &mut dyn MessageReadWriter {
        self.channel.as_mut()
    }

    /// Splits into status and channel.
    #[must_use]
    pub fn into_parts(self) -> (S, Box<dyn MessageReadWriter>) {
        (self.status, self.channel)
    }
}

impl<S: fmt::Debug> fmt::Debug for HandshakeResult<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeResult")
            .field("version", &self.version)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubFactory, StubHandshaker};

    type Registry = VersionRegistry<(), (), String>;

    fn registry() -> Registry {
        Registry::new()
            .with(ProtocolVersion::V030, |_, (), ()| {
                Ok(Box::new(StubHandshaker::new(ProtocolVersion::V030)) as BoxedHandshaker<String>)
            })
            .with(ProtocolVersion::V031, |identity, (), ()| {
                let mut handshaker = StubHandshaker::new(ProtocolVersion::V031);
                handshaker.label = String::from_utf8_lossy(&identity.peer_id).into_owned();
                Ok(Box::new(handshaker) as BoxedHandshaker<String>)
            })
    }

    #[test]
    fn registry_dispatches_by_version() {
        let registry = registry();
        let identity = PeerIdentity::new(*b"node-a", *b"main");
        let mut handshaker = registry
            .versioned_handshaker(ProtocolVersion::V031, &identity, (), ())
            .expect("registered");
        assert_eq!(handshaker.version(), ProtocolVersion::V031);
        let status = handshaker
            .complete_inbound(&HandshakeContext::new())
            .expect("stub completes");
        assert_eq!(status, "node-a inbound 0.3.1");
    }

    #[test]
    fn unregistered_version_is_reported() {
        let err = registry()
            .versioned_handshaker(ProtocolVersion::V033, &PeerIdentity::default(), (), ())
            .err()
            .expect("V033 not registered");
        let unregistered = err
            .downcast_ref::<UnregisteredVersion>()
            .expect("typed lookup error");
        assert_eq!(unregistered.0, ProtocolVersion::V033);
    }

    #[test]
    fn unknown_sentinel_cannot_be_registered() {
        let mut registry = registry();
        assert!(!registry.register(ProtocolVersion::UNKNOWN, |_, (), ()| {
            Err("never".into())
        }));
        assert!(!registry.contains(ProtocolVersion::UNKNOWN));
        assert_eq!(
            registry.supported_versions().to_vec(),
            vec![ProtocolVersion::V031, ProtocolVersion::V030]
        );
    }

    #[test]
    fn shared_factory_forwards_lookups() {
        let factory = Arc::new(StubFactory::default());
        let handshaker = VersionedHandshakerFactory::<(), ()>::versioned_handshaker(
            &factory,
            ProtocolVersion::V032,
            &PeerIdentity::default(),
            (),
            (),
        )
        .expect("stub lookup");
        assert_eq!(handshaker.version(), ProtocolVersion::V032);
        assert_eq!(factory.queried(), vec![ProtocolVersion::V032]);
    }

    #[test]
    fn result_splits_into_parts() {
        let handshaker: BoxedHandshaker<String> =
            Box::new(StubHandshaker::new(ProtocolVersion::V030));
        let mut result = HandshakeResult::new(
            ProtocolVersion::V030,
            "ready".to_owned(),
            handshaker.into_message_channel(),
        );
        assert_eq!(result.version(), ProtocolVersion::V030);
        result.channel().write_message(b"ping").expect("stub channel");
        let (status, _channel) = result.into_parts();
        assert_eq!(status, "ready");
    }
}
