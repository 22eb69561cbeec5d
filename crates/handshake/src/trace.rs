//! Handshake tracing macros.
//!
//! Thin wrappers over the `tracing` macros that pin the `p2p::handshake`
//! target. Without the `tracing` feature they type-check their arguments and
//! emit nothing. Only plain format strings are accepted.

/// Emit a per-step handshake trace.
macro_rules! trace_hs {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::trace!(target: "p2p::handshake", $($arg)*);
        #[cfg(not(feature = "tracing"))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Emit a handshake outcome trace.
macro_rules! debug_hs {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::debug!(target: "p2p::handshake", $($arg)*);
        #[cfg(not(feature = "tracing"))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Emit a trace for a peer that violated the handshake.
macro_rules! warn_hs {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::warn!(target: "p2p::handshake", $($arg)*);
        #[cfg(not(feature = "tracing"))]
        let _ = ::core::format_args!($($arg)*);
    }};
}
