use std::time::Duration;

use protocol::{NetworkMagic, ProtocolVersion, SupportedVersions};
use thiserror::Error;

use crate::context::HandshakeContext;

/// Default budget for one complete handshake attempt in seconds.
pub const DEFAULT_HANDSHAKE_TIMEOUT: u64 = 20;

/// Default transport poll tick in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Local identity forwarded opaquely to the versioned handshaker.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerIdentity {
    /// Local peer identifier.
    pub peer_id: Vec<u8>,
    /// Identifier of the chain the node follows.
    pub chain_id: Vec<u8>,
}

impl PeerIdentity {
    /// Creates an identity from raw identifiers.
    pub fn new(peer_id: impl Into<Vec<u8>>, chain_id: impl Into<Vec<u8>>) -> Self {
        Self {
            peer_id: peer_id.into(),
            chain_id: chain_id.into(),
        }
    }
}

/// Rejected handshake configuration.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ConfigError {
    /// No version would ever be offered or accepted.
    #[error("supported version set is empty")]
    EmptyVersionSet,
    /// The unknown sentinel can never be negotiated.
    #[error("supported version set lists the unknown sentinel")]
    UnknownVersionListed,
    /// Success responses would be indistinguishable from rejections.
    #[error("network magic {0} collides with the handshake error sentinel")]
    MagicCollidesWithErrorSentinel(NetworkMagic),
}

/// Settings shared by every handshake attempt of a node.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HandshakeConfig {
    /// Magic expected in requests and sent in success responses.
    pub network_magic: NetworkMagic,
    /// Versions this node can complete.
    pub supported_versions: SupportedVersions,
    /// Identity handed to the versioned handshaker.
    pub identity: PeerIdentity,
    /// Budget for one attempt, including the versioned step.
    pub timeout: Duration,
    /// Socket read/write timeout used as the cancellation poll tick.
    pub poll_interval: Duration,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HandshakeConfig {
    /// Creates a mainnet configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            network_magic: NetworkMagic::MAIN,
            supported_versions: SupportedVersions::default(),
            identity: PeerIdentity::default(),
            timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Sets the network magic.
    #[must_use]
    pub fn network_magic(mut self, magic: NetworkMagic) -> Self {
        self.network_magic = magic;
        self
    }

    /// Sets the supported versions.
    #[must_use]
    pub fn supported_versions(mut self, versions: SupportedVersions) -> Self {
        self.supported_versions = versions;
        self
    }

    /// Sets the identity forwarded to versioned handshakers.
    #[must_use]
    pub fn identity(mut self, identity: PeerIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the transport poll tick. Zero is raised to one millisecond since
    /// sockets reject a zero timeout.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Builds a fresh context for one attempt.
    #[must_use]
    pub fn context(&self) -> HandshakeContext {
        HandshakeContext::with_timeout(self.timeout)
    }

    /// Checks the configuration can negotiate anything at all.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network_magic.is_error_sentinel() {
            return Err(ConfigError::MagicCollidesWithErrorSentinel(
                self.network_magic,
            ));
        }
        if self.supported_versions.is_empty() {
            return Err(ConfigError::EmptyVersionSet);
        }
        if self.supported_versions.contains(ProtocolVersion::UNKNOWN) {
            return Err(ConfigError::UnknownVersionListed);
        }
        Ok(())
    }
}
