//! Helpers for running handshakes over [`TcpStream`]s.

use std::io::{self, BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

/// Buffered halves of one TCP connection.
pub type TcpHalves = (BufReader<TcpStream>, BufWriter<TcpStream>);

/// Sets the socket read and write timeouts to `interval`.
///
/// Blocking socket calls then return at least once per `interval`, which lets
/// [`crate::ContextReader`] and [`crate::ContextWriter`] observe a fired
/// context. A zero interval is raised to one millisecond because the socket
/// API rejects it.
pub fn configure_poll_interval(stream: &TcpStream, interval: Duration) -> io::Result<()> {
    let interval = interval.max(Duration::from_millis(1));
    stream.set_read_timeout(Some(interval))?;
    stream.set_write_timeout(Some(interval))?;
    stream.set_nodelay(true)
}

/// Splits `stream` into a buffered reader and writer over the same socket.
pub fn split(stream: TcpStream) -> io::Result<TcpHalves> {
    let reader = BufReader::new(stream.try_clone()?);
    Ok((reader, BufWriter::new(stream)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    #[test]
    fn poll_interval_bounds_blocking_reads() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let client = TcpStream::connect(listener.local_addr().expect("addr")).expect("connect");
        let (server, _) = listener.accept().expect("accept");

        configure_poll_interval(&server, Duration::ZERO).expect("configure");
        // The kernel may round the timeout up to its tick.
        let timeout = server.read_timeout().expect("timeout");
        assert!(
            matches!(timeout, Some(d) if d >= Duration::from_millis(1)),
            "read timeout {timeout:?}"
        );

        let mut buf = [0u8; 1];
        let err = (&server).read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
        drop(client);
    }

    #[test]
    fn split_halves_share_the_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let client = TcpStream::connect(listener.local_addr().expect("addr")).expect("connect");
        let (server, _) = listener.accept().expect("accept");

        let (_reader, mut writer) = split(server).expect("split");
        writer.write_all(b"ping").expect("write");
        writer.flush().expect("flush");

        let mut buf = [0u8; 4];
        (&client).read_exact(&mut buf).expect("read");
        assert_eq!(&buf, b"ping");
    }
}
