//! Header I/O shared by both directions.

use std::io::{Read, Write};

use protocol::{HandshakeRequestHeader, HandshakeResponseHeader};

use crate::context::HandshakeContext;
use crate::error::HandshakeError;
use crate::stream::{ContextReader, ContextWriter};
use crate::versioned::{BoxedHandshaker, HandshakeResult};

/// Which completion routine the versioned handshaker runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Direction {
    Inbound,
    Outbound,
}

/// Reads and writes the pre-negotiation headers under one context.
///
/// Every call either moves the whole header or fails; a partially read
/// header never reaches the caller.
#[derive(Debug)]
pub(crate) struct BaseWireHandshaker<'a> {
    ctx: &'a HandshakeContext,
}

impl<'a> BaseWireHandshaker<'a> {
    pub(crate) const fn new(ctx: &'a HandshakeContext) -> Self {
        Self { ctx }
    }

    pub(crate) fn write_request<W: Write>(
        &self,
        writer: &mut W,
        header: &HandshakeRequestHeader,
    ) -> Result<(), HandshakeError> {
        let mut writer = ContextWriter::new(writer, self.ctx);
        header.write_to(&mut writer)?;
        writer.flush()?;
        self.confirm_sent()?;
        trace_hs!(
            "sent handshake request: magic {}, {} versions",
            header.magic(),
            header.versions().len()
        );
        Ok(())
    }

    pub(crate) fn read_request<R: Read>(
        &self,
        reader: &mut R,
    ) -> Result<HandshakeRequestHeader, HandshakeError> {
        let mut reader = ContextReader::new(reader, self.ctx);
        let header = HandshakeRequestHeader::read_from(&mut reader)?;
        trace_hs!(
            "received handshake request: magic {}, versions {:?}",
            header.magic(),
            header.versions()
        );
        Ok(header)
    }

    pub(crate) fn write_response<W: Write>(
        &self,
        writer: &mut W,
        header: &HandshakeResponseHeader,
    ) -> Result<(), HandshakeError> {
        let mut writer = ContextWriter::new(writer, self.ctx);
        header.write_to(&mut writer)?;
        writer.flush()?;
        self.confirm_sent()?;
        trace_hs!("sent handshake response: {:?}", header.status());
        Ok(())
    }

    pub(crate) fn read_response<R: Read>(
        &self,
        reader: &mut R,
    ) -> Result<HandshakeResponseHeader, HandshakeError> {
        let mut reader = ContextReader::new(reader, self.ctx);
        let header = HandshakeResponseHeader::read_from(&mut reader)?;
        trace_hs!("received handshake response: {:?}", header.status());
        Ok(header)
    }

    /// Runs the versioned completion routine and collects its channel.
    pub(crate) fn delegate<S>(
        &self,
        mut handshaker: BoxedHandshaker<S>,
        direction: Direction,
    ) -> Result<HandshakeResult<S>, HandshakeError> {
        self.ctx.check()?;
        let version = handshaker.version();
        let outcome = match direction {
            Direction::Inbound => handshaker.complete_inbound(self.ctx),
            Direction::Outbound => handshaker.complete_outbound(self.ctx),
        };
        let status = outcome.map_err(|source| {
            warn_hs!("p2p {} {:?} handshake failed: {}", version, direction, source);
            HandshakeError::versioned(version, source)
        })?;
        debug_hs!("p2p {} {:?} handshake complete", version, direction);
        Ok(HandshakeResult::new(
            version,
            status,
            handshaker.into_message_channel(),
        ))
    }

    /// Bytes handed to the transport before the context fired are not
    /// treated as delivered.
    fn confirm_sent(&self) -> Result<(), HandshakeError> {
        self.ctx.check().map_err(HandshakeError::from)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use protocol::{NetworkMagic, ProtocolVersion, RejectionCode};

    use super::*;
    use crate::context::Cancelled;
    use crate::test_support::{CancellingWriter, StubHandshaker};

    #[test]
    fn request_sizes_follow_version_count() {
        let ctx = HandshakeContext::new();
        let base = BaseWireHandshaker::new(&ctx);
        for (versions, expected) in [
            (vec![], 8),
            (vec![ProtocolVersion::V030], 12),
            (
                vec![
                    ProtocolVersion::V033,
                    ProtocolVersion::V032,
                    ProtocolVersion::V031,
                    ProtocolVersion::V030,
                ],
                24,
            ),
        ] {
            let header = HandshakeRequestHeader::new(NetworkMagic::MAIN, versions);
            let mut sink = Vec::new();
            base.write_request(&mut sink, &header).expect("write");
            assert_eq!(sink.len(), expected);

            let decoded = base
                .read_request(&mut Cursor::new(sink))
                .expect("read back");
            assert_eq!(decoded, header);
        }
    }

    #[test]
    fn response_is_always_eight_bytes() {
        let ctx = HandshakeContext::new();
        let base = BaseWireHandshaker::new(&ctx);
        for header in [
            HandshakeResponseHeader::accepted(NetworkMagic::MAIN, ProtocolVersion::V031),
            HandshakeResponseHeader::rejected(RejectionCode::NoMatchedVersion),
        ] {
            let mut sink = Vec::new();
            base.write_response(&mut sink, &header).expect("write");
            assert_eq!(sink.len(), 8);
            let mut reader = Cursor::new(sink);
            assert_eq!(base.read_response(&mut reader).expect("read"), header);
            assert_eq!(reader.position(), 8);
        }
    }

    #[test]
    fn short_response_is_malformed() {
        let ctx = HandshakeContext::new();
        let base = BaseWireHandshaker::new(&ctx);
        let err = base
            .read_response(&mut Cursor::new(vec![0x47, 0x41, 0x68, 0x41, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, HandshakeError::MalformedHeader(_)));
    }

    #[test]
    fn cancel_during_flush_reports_cancelled_after_bytes_left() {
        let ctx = HandshakeContext::new();
        let base = BaseWireHandshaker::new(&ctx);
        let mut writer = CancellingWriter::new(ctx.cancellation_token().clone());
        let header = HandshakeResponseHeader::accepted(NetworkMagic::MAIN, ProtocolVersion::V030);
        let err = base.write_response(&mut writer, &header).unwrap_err();
        assert!(matches!(err, HandshakeError::Cancelled(Cancelled::ByToken)));
        assert_eq!(writer.written, header.encode());
    }

    #[test]
    fn delegate_skips_handshaker_once_cancelled() {
        let ctx = HandshakeContext::new();
        ctx.cancel();
        let base = BaseWireHandshaker::new(&ctx);
        let handshaker: BoxedHandshaker<String> =
            Box::new(StubHandshaker::new(ProtocolVersion::V031));
        let err = base.delegate(handshaker, Direction::Inbound).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn delegate_wraps_versioned_failure() {
        let ctx = HandshakeContext::new();
        let base = BaseWireHandshaker::new(&ctx);
        let mut stub = StubHandshaker::new(ProtocolVersion::V031);
        stub.fail = true;
        let err = base
            .delegate(Box::new(stub) as BoxedHandshaker<String>, Direction::Outbound)
            .unwrap_err();
        assert!(matches!(
            err,
            HandshakeError::VersionedHandshakeFailed {
                version: ProtocolVersion::V031,
                ..
            }
        ));
    }

    #[test]
    fn delegate_returns_status_and_channel() {
        let ctx = HandshakeContext::new();
        let base = BaseWireHandshaker::new(&ctx);
        let handshaker: BoxedHandshaker<String> =
            Box::new(StubHandshaker::new(ProtocolVersion::V030));
        let result = base.delegate(handshaker, Direction::Outbound).expect("delegation");
        assert_eq!(result.version(), ProtocolVersion::V030);
        assert_eq!(result.status(), "outbound 0.3.0");
    }
}
