//! In-memory transports and stub handshakers shared by the unit tests.

use std::io::{self, Cursor, Read, Write};
use std::sync::Mutex;

use protocol::ProtocolVersion;

use crate::config::PeerIdentity;
use crate::context::{CancellationToken, HandshakeContext};
use crate::error::BoxError;
use crate::versioned::{
    BoxedHandshaker, MessageReadWriter, VersionedHandshaker, VersionedHandshakerFactory,
};

/// Channel that records written messages and replays them on read.
#[derive(Debug, Default)]
pub(crate) struct StubChannel {
    messages: Vec<Vec<u8>>,
}

impl MessageReadWriter for StubChannel {
    fn read_message(&mut self) -> io::Result<Vec<u8>> {
        if self.messages.is_empty() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no message"));
        }
        Ok(self.messages.remove(0))
    }

    fn write_message(&mut self, message: &[u8]) -> io::Result<()> {
        self.messages.push(message.to_vec());
        Ok(())
    }
}

/// Handshaker whose status names the direction and version it completed.
#[derive(Debug)]
pub(crate) struct StubHandshaker {
    pub(crate) version: ProtocolVersion,
    pub(crate) label: String,
    pub(crate) fail: bool,
}

impl StubHandshaker {
    pub(crate) fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            label: String::new(),
            fail: false,
        }
    }

    fn complete(&self, ctx: &HandshakeContext, direction: &str) -> Result<String, BoxError> {
        ctx.check()?;
        if self.fail {
            return Err(format!("{direction} status exchange refused").into());
        }
        if self.label.is_empty() {
            Ok(format!("{direction} {}", self.version))
        } else {
            Ok(format!("{} {direction} {}", self.label, self.version))
        }
    }
}

impl VersionedHandshaker for StubHandshaker {
    type Status = String;

    fn version(&self) -> ProtocolVersion {
        self.version
    }

    fn complete_inbound(&mut self, ctx: &HandshakeContext) -> Result<String, BoxError> {
        self.complete(ctx, "inbound")
    }

    fn complete_outbound(&mut self, ctx: &HandshakeContext) -> Result<String, BoxError> {
        self.complete(ctx, "outbound")
    }

    fn into_message_channel(self: Box<Self>) -> Box<dyn MessageReadWriter> {
        Box::new(StubChannel::default())
    }
}

/// Factory that records every lookup and can be told to fail.
#[derive(Debug, Default)]
pub(crate) struct StubFactory {
    pub(crate) fail_lookup: bool,
    pub(crate) fail_complete: bool,
    pub(crate) queried: Mutex<Vec<ProtocolVersion>>,
}

impl StubFactory {
    pub(crate) fn queried(&self) -> Vec<ProtocolVersion> {
        self.queried.lock().expect("stub factory lock").clone()
    }
}

impl<R, W> VersionedHandshakerFactory<R, W> for StubFactory {
    type Status = String;

    fn versioned_handshaker(
        &self,
        version: ProtocolVersion,
        _identity: &PeerIdentity,
        _reader: R,
        _writer: W,
    ) -> Result<BoxedHandshaker<String>, BoxError> {
        self.queried.lock().expect("stub factory lock").push(version);
        if self.fail_lookup {
            return Err(format!("no handshaker for {version}").into());
        }
        let mut handshaker = StubHandshaker::new(version);
        handshaker.fail = self.fail_complete;
        Ok(Box::new(handshaker))
    }
}

/// Reader that fires `token` once it has served `reads` successful reads.
#[derive(Debug)]
pub(crate) struct CancellingReader {
    inner: Cursor<Vec<u8>>,
    reads: usize,
    token: CancellationToken,
}

impl CancellingReader {
    pub(crate) fn new(data: Vec<u8>, reads: usize, token: CancellationToken) -> Self {
        Self {
            inner: Cursor::new(data),
            reads,
            token,
        }
    }
}

impl Read for CancellingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.reads == 0 {
            self.token.cancel();
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "stalled"));
        }
        self.reads -= 1;
        // One word at a time so the header needs several reads.
        let limit = buf.len().min(4);
        self.inner.read(&mut buf[..limit])
    }
}

/// Writer that accepts every byte and fires `token` on flush.
#[derive(Debug)]
pub(crate) struct CancellingWriter {
    pub(crate) written: Vec<u8>,
    token: CancellationToken,
}

impl CancellingWriter {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            written: Vec::new(),
            token,
        }
    }
}

impl Write for CancellingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.token.cancel();
        Ok(())
    }
}

/// Transport whose every operation fails with `ConnectionReset`.
#[derive(Debug, Default)]
pub(crate) struct Broken;

impl Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"))
    }
}

impl Write for Broken {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
