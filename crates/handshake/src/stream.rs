//! Reader and writer adapters that honour a [`HandshakeContext`].
//!
//! Every call into the wrapped transport is preceded by a context check. A
//! transport read or write that reports [`io::ErrorKind::WouldBlock`] or
//! [`io::ErrorKind::TimedOut`] is treated as a poll tick: the context is
//! checked again and the call retried, so a stalled peer is abandoned as soon
//! as the deadline passes instead of blocking the attempt forever.
//!
//! Cancellation surfaces as an [`io::Error`] of kind
//! [`io::ErrorKind::TimedOut`] carrying a [`Cancelled`] payload, which
//! [`crate::HandshakeError`] recognises and reports as
//! [`crate::HandshakeError::Cancelled`]. Versioned handshakers can wrap their
//! own streams in these adapters to get the same behaviour.

use std::io::{self, Read, Write};

use crate::context::{Cancelled, HandshakeContext};

impl From<Cancelled> for io::Error {
    fn from(cancelled: Cancelled) -> Self {
        io::Error::new(io::ErrorKind::TimedOut, cancelled)
    }
}

/// Extracts the cancellation reason carried by an adapter error, if any.
#[must_use]
pub fn cancellation_of(err: &io::Error) -> Option<Cancelled> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<Cancelled>())
        .copied()
}

fn is_poll_tick(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    ) && cancellation_of(err).is_none()
}

/// [`Read`] adapter that checks the context before every read.
#[derive(Debug)]
pub struct ContextReader<'a, R> {
    inner: R,
    ctx: &'a HandshakeContext,
}

impl<'a, R> ContextReader<'a, R> {
    /// Wraps `inner`.
    pub const fn new(inner: R, ctx: &'a HandshakeContext) -> Self {
        Self { inner, ctx }
    }

    /// Releases the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ContextReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            self.ctx.check()?;
            match self.inner.read(buf) {
                Err(err) if is_poll_tick(&err) => {}
                other => return other,
            }
        }
    }
}

/// [`Write`] adapter that checks the context before every write and flush.
#[derive(Debug)]
pub struct ContextWriter<'a, W> {
    inner: W,
    ctx: &'a HandshakeContext,
}

impl<'a, W> ContextWriter<'a, W> {
    /// Wraps `inner`.
    pub const fn new(inner: W, ctx: &'a HandshakeContext) -> Self {
        Self { inner, ctx }
    }

    /// Releases the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ContextWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            self.ctx.check()?;
            match self.inner.write(buf) {
                Err(err) if is_poll_tick(&err) => {}
                other => return other,
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        loop {
            self.ctx.check()?;
            match self.inner.flush() {
                Err(err) if is_poll_tick(&err) => {}
                other => return other,
            }
        }
    }
}
