use std::io;

use protocol::{HeaderError, NetworkMagic, ProtocolVersion, RejectionCode};
use thiserror::Error;

use crate::context::Cancelled;
use crate::stream::cancellation_of;

/// Boxed error returned by versioned handshakers and factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a header could not be accepted.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum MalformedKind {
    /// The stream ended before the declared bytes arrived.
    #[error("header truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes the header declared.
        expected: u64,
        /// Bytes that arrived.
        actual: u64,
    },
    /// A response carried neither the local network magic nor the error sentinel.
    #[error("response magic {received:#010x} is neither {expected} nor the error sentinel")]
    UnexpectedMagic {
        /// The local network magic.
        expected: NetworkMagic,
        /// The word the peer sent.
        received: u32,
    },
}

/// Terminal failure of a single handshake attempt.
///
/// Every variant means the connection should be discarded; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// A header was cut short or had an impossible shape.
    #[error("malformed handshake header: {0}")]
    MalformedHeader(MalformedKind),
    /// Inbound: the request carried a foreign network magic. A
    /// `WrongRequest` rejection was sent before this was returned.
    #[error("peer sent handshake magic {received}, expected {expected}")]
    WrongMagic {
        /// The local network magic.
        expected: NetworkMagic,
        /// The magic found in the request.
        received: NetworkMagic,
    },
    /// Inbound: no offered version is supported locally. A
    /// `NoMatchedVersion` rejection was sent before this was returned.
    #[error("no mutual p2p version; peer offered {offered:?}, we support {supported:?}")]
    NoMatchedVersion {
        /// Versions the peer offered, in wire order.
        offered: Vec<ProtocolVersion>,
        /// Versions supported locally, newest first.
        supported: Vec<ProtocolVersion>,
    },
    /// Outbound: the remote refused our request as malformed.
    #[error("remote peer rejected the handshake request as malformed")]
    WrongRequestRejected,
    /// Outbound: the remote supports none of the versions we offered.
    #[error("remote peer supports none of the offered p2p versions")]
    NoMatchedVersionRejected,
    /// Outbound: the remote refused with a code this build does not know.
    #[error("remote peer rejected the handshake with unknown code {0:#x}")]
    UnknownRejectionCode(u32),
    /// The transport failed.
    #[error("handshake transport failed: {0}")]
    Io(#[source] io::Error),
    /// The context fired before the step completed.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    /// The factory or the version-specific handshaker failed.
    #[error("p2p {version} handshake failed: {source}")]
    VersionedHandshakeFailed {
        /// Version that was negotiated.
        version: ProtocolVersion,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
}

impl HandshakeError {
    /// Reports whether the remote peer refused the handshake.
    #[must_use]
    pub const fn is_remote_rejection(&self) -> bool {
        matches!(
            self,
            Self::WrongRequestRejected
                | Self::NoMatchedVersionRejected
                | Self::UnknownRejectionCode(_)
        )
    }

    /// Reports whether the attempt was abandoned because the context fired.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Reports whether the local side refused the peer and told it so.
    #[must_use]
    pub const fn is_local_rejection(&self) -> bool {
        matches!(self, Self::WrongMagic { .. } | Self::NoMatchedVersion { .. })
    }

    pub(crate) fn versioned(version: ProtocolVersion, source: BoxError) -> Self {
        Self::VersionedHandshakeFailed { version, source }
    }
}

impl From<RejectionCode> for HandshakeError {
    fn from(code: RejectionCode) -> Self {
        match code {
            RejectionCode::WrongRequest => Self::WrongRequestRejected,
            RejectionCode::NoMatchedVersion => Self::NoMatchedVersionRejected,
            RejectionCode::Unknown(code) => Self::UnknownRejectionCode(code),
        }
    }
}

impl From<io::Error> for HandshakeError {
    fn from(err: io::Error) -> Self {
        match cancellation_of(&err) {
            Some(cancelled) => Self::Cancelled(cancelled),
            None => Self::Io(err),
        }
    }
}

impl From<HeaderError> for HandshakeError {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::Truncated { expected, actual } => {
                Self::MalformedHeader(MalformedKind::Truncated { expected, actual })
            }
            HeaderError::Io(inner) => Self::from(inner),
        }
    }
}

impl From<HandshakeError> for io::Error {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::Io(inner) => inner,
            HandshakeError::Cancelled(cancelled) => cancelled.into(),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_codes_map_to_typed_errors() {
        assert!(matches!(
            HandshakeError::from(RejectionCode::WrongRequest),
            HandshakeError::WrongRequestRejected
        ));
        assert!(matches!(
            HandshakeError::from(RejectionCode::NoMatchedVersion),
            HandshakeError::NoMatchedVersionRejected
        ));
        let unknown = HandshakeError::from(RejectionCode::Unknown(0x77));
        assert!(matches!(unknown, HandshakeError::UnknownRejectionCode(0x77)));
        assert!(unknown.is_remote_rejection());
        assert_eq!(
            unknown.to_string(),
            "remote peer rejected the handshake with unknown code 0x77"
        );
    }

    #[test]
    fn cancelled_io_errors_are_recognised() {
        let err = HandshakeError::from(io::Error::from(Cancelled::DeadlineExceeded));
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "handshake deadline exceeded");

        let err = HandshakeError::from(io::Error::new(io::ErrorKind::TimedOut, "socket"));
        assert!(matches!(err, HandshakeError::Io(_)));
    }

    #[test]
    fn header_errors_split_into_malformed_and_transport() {
        let err = HandshakeError::from(HeaderError::Truncated {
            expected: 8,
            actual: 7,
        });
        assert!(matches!(
            err,
            HandshakeError::MalformedHeader(MalformedKind::Truncated {
                expected: 8,
                actual: 7
            })
        ));

        let err = HandshakeError::from(HeaderError::Io(io::Error::from(Cancelled::ByToken)));
        assert!(err.is_cancelled());
    }

    #[test]
    fn converts_to_io_error_preserving_source() {
        let io_err: io::Error = HandshakeError::NoMatchedVersionRejected.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
        let source = io_err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<HandshakeError>())
            .expect("io::Error must carry HandshakeError source");
        assert!(matches!(source, HandshakeError::NoMatchedVersionRejected));

        let io_err: io::Error = HandshakeError::Cancelled(Cancelled::ByToken).into();
        assert_eq!(io_err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn versioned_failure_keeps_cause() {
        let err = HandshakeError::versioned(ProtocolVersion::V031, "status mismatch".into());
        assert_eq!(err.to_string(), "p2p 0.3.1 handshake failed: status mismatch");
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "status mismatch");
    }
}
