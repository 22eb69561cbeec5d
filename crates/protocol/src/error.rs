use std::io;

use thiserror::Error;

/// Errors produced while decoding a handshake header.
///
/// The codec never validates magic values or versions; it only reports that
/// the declared bytes could not be obtained.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The input ended before every declared byte of the header was available.
    #[error("handshake header truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Total number of bytes the header declared (prefix plus payload).
        expected: u64,
        /// Number of bytes that were actually available.
        actual: u64,
    },
    /// The underlying reader failed for a reason other than end of input.
    #[error("failed to read handshake header: {0}")]
    Io(#[source] io::Error),
}

impl HeaderError {
    /// Reports whether the header was cut short by the end of the input.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

impl From<HeaderError> for io::Error {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::Io(inner) => inner,
            truncated @ HeaderError::Truncated { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, truncated)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reports_expected_and_actual_lengths() {
        let err = HeaderError::Truncated {
            expected: 12,
            actual: 7,
        };
        assert_eq!(
            err.to_string(),
            "handshake header truncated: expected 12 bytes, got 7"
        );
        assert!(err.is_truncated());
    }

    #[test]
    fn converts_to_io_error_preserving_kind() {
        let err = HeaderError::Truncated {
            expected: 8,
            actual: 3,
        };
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);

        let source = HeaderError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(!source.is_truncated());
        let io_err: io::Error = source.into();
        assert_eq!(io_err.kind(), io::ErrorKind::ConnectionReset);
    }
}
