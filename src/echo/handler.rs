//! Per-connection echo handler for the Tokio runtime.

use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Relay buffer size
const BUFFER_SIZE: usize = 64 * 1024;

/// Handle one accepted connection.
///
/// Takes ownership of the stream, so the socket is closed exactly once when
/// this returns. Relay errors end this connection only and are not
/// propagated.
pub async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, conn_id: u64) {
    let mut total = 0u64;

    match relay(&mut stream, &mut total).await {
        Ok(()) => {
            debug!(conn_id, peer = %peer, total, "Connection closed by client");
        }
        Err(e) => {
            debug!(conn_id, peer = %peer, total, error = %e, "Connection error");
        }
    }
}

/// Copy everything read from `stream` back into it until end-of-stream.
///
/// Each chunk is fully written before the next read, so bytes come back in
/// the order they arrived. `total` counts bytes fully echoed and stays
/// valid when the relay fails part way.
pub async fn relay<S>(stream: &mut S, total: &mut u64) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    loop {
        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            return Ok(());
        }

        stream.write_all(&buffer).await?;
        *total += n as u64;
        buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_relay_hello() {
        let mut stream = Builder::new().read(b"hello").write(b"hello").build();
        let mut total = 0;
        relay(&mut stream, &mut total).await.unwrap();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_relay_preserves_chunk_order() {
        let mut stream = Builder::new()
            .read(b"first ")
            .write(b"first ")
            .read(b"second ")
            .write(b"second ")
            .read(b"x")
            .write(b"x")
            .build();
        let mut total = 0;
        relay(&mut stream, &mut total).await.unwrap();
        assert_eq!(total, 14);
    }

    #[tokio::test]
    async fn test_relay_immediate_eof() {
        let mut stream = Builder::new().build();
        let mut total = 0;
        relay(&mut stream, &mut total).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_relay_read_error() {
        let mut stream = Builder::new()
            .read(b"ping")
            .write(b"ping")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();

        let mut total = 0;
        let err = relay(&mut stream, &mut total).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_relay_write_error() {
        let mut stream = Builder::new()
            .read(b"ping")
            .write(b"ping")
            .read(b"pong")
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
            .build();

        let mut total = 0;
        let err = relay(&mut stream, &mut total).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        // The chunk whose write failed is not counted.
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_relay_large_payload_over_duplex() {
        // Small pipe capacity forces many partial reads and writes.
        let (mut client, mut server) = tokio::io::duplex(1024);
        let echo = tokio::spawn(async move {
            let mut total = 0;
            relay(&mut server, &mut total).await.map(|()| total)
        });

        let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
        let (mut rd, mut wr) = tokio::io::split(&mut client);

        let send = async {
            for chunk in payload.chunks(4096) {
                wr.write_all(chunk).await.unwrap();
            }
            wr.shutdown().await.unwrap();
        };
        let mut received = Vec::with_capacity(payload.len());
        let recv = rd.read_to_end(&mut received);

        let (_, read) = tokio::join!(send, recv);
        assert_eq!(read.unwrap(), payload.len());
        assert_eq!(received, payload);
        assert_eq!(echo.await.unwrap().unwrap(), payload.len() as u64);
    }
}
