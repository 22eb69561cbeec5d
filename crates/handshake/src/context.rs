//! Cancellation and deadline signal threaded through every blocking step.
//!
//! A [`HandshakeContext`] is created per attempt and passed by reference to
//! header reads, header writes and the versioned sub-handshaker. Nothing here
//! interrupts a thread; blocking primitives poll [`HandshakeContext::check`]
//! before each call into the transport, so transports should be configured
//! with a short read/write timeout (see [`crate::tcp::configure_poll_interval`])
//! to bound the latency between the signal firing and the attempt aborting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Why a handshake step was abandoned.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum Cancelled {
    /// The caller fired the [`CancellationToken`].
    #[error("handshake cancelled by caller")]
    ByToken,
    /// The context deadline passed.
    #[error("handshake deadline exceeded")]
    DeadlineExceeded,
}

/// Shared flag used to abort one or more in-flight handshakes.
///
/// Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the token. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Reports whether [`CancellationToken::cancel`] was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Per-attempt cancellation token plus optional deadline.
#[derive(Clone, Debug, Default)]
pub struct HandshakeContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl HandshakeContext {
    /// Context without a deadline that only fires on explicit cancellation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Replaces the token, e.g. to tie the attempt to a node-wide shutdown flag.
    #[must_use]
    pub fn token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Returns the token observed by this context.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fires the context's token.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Time left before the deadline; `None` when there is no deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns an error once the token fired or the deadline passed.
    ///
    /// An explicit cancellation takes precedence over an expired deadline.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.token.is_cancelled() {
            return Err(Cancelled::ByToken);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Cancelled::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Reports whether [`HandshakeContext::check`] would fail.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }
}
