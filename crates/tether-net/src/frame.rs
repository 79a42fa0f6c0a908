//! Length-prefixed wire codec.
//!
//! One frame is a 4-byte big-endian unsigned length followed by exactly that
//! many bytes of UTF-8 JSON. No separators, no compression. The base protocol
//! enforces no maximum, so a cap (default 16 MiB) bounds memory against a
//! malicious or desynchronized peer; exceeding it fails the connection.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::{NetError, Result};

/// Default frame cap.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Write one frame: length prefix then payload.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8], max_frame: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > max_frame {
        return Err(NetError::FrameTooLarge {
            len: payload.len(),
            max: max_frame,
        });
    }
    let len = u32::try_from(payload.len()).map_err(|_| NetError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame body.
///
/// Blocks until the full prefix and body are read. A peer closing mid-frame
/// surfaces as an unexpected-EOF [`NetError::Io`].
pub async fn read_frame<R>(reader: &mut R, max_frame: usize) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_frame {
        return Err(NetError::FrameTooLarge {
            len,
            max: max_frame,
        });
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// A whole stream wrapped with frame boundaries.
///
/// Used identically by both ends of a connection. The connection managers
/// split their streams into halves and use [`read_frame`]/[`write_frame`]
/// directly; this wrapper serves unsplit streams and tests.
pub struct FramedChannel<S> {
    stream: S,
    max_frame: usize,
}

impl<S> FramedChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream with the default frame cap.
    pub fn new(stream: S) -> Self {
        Self::with_max_frame(stream, DEFAULT_MAX_FRAME_BYTES)
    }

    /// Wrap a stream with an explicit frame cap.
    pub fn with_max_frame(stream: S, max_frame: usize) -> Self {
        Self { stream, max_frame }
    }

    /// Send one raw payload.
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        write_frame(&mut self.stream, payload, self.max_frame).await
    }

    /// Send one JSON document.
    pub async fn send_json(&mut self, doc: &Value) -> Result<()> {
        let payload = serde_json::to_vec(doc)?;
        self.send(&payload).await
    }

    /// Receive one raw payload.
    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        read_frame(&mut self.stream, self.max_frame).await
    }

    /// Unwrap the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn round_trip_json() {
        let (client, server) = tokio::io::duplex(1024);
        let mut tx = FramedChannel::new(client);
        let mut rx = FramedChannel::new(server);

        let doc = json!({"name": "motion", "arguments": {"motion_tag": "wave_hand"}});
        tx.send_json(&doc).await.unwrap();

        let body = rx.receive().await.unwrap();
        let back: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(back, doc);
    }

    #[tokio::test]
    async fn round_trip_empty_payload() {
        let (client, server) = tokio::io::duplex(64);
        let mut tx = FramedChannel::new(client);
        let mut rx = FramedChannel::new(server);

        tx.send(b"").await.unwrap();
        assert_eq!(rx.receive().await.unwrap(), b"");
    }

    #[tokio::test]
    async fn frames_do_not_bleed() {
        let (client, server) = tokio::io::duplex(1024);
        let mut tx = FramedChannel::new(client);
        let mut rx = FramedChannel::new(server);

        tx.send(b"first").await.unwrap();
        tx.send(b"second").await.unwrap();
        assert_eq!(rx.receive().await.unwrap(), b"first");
        assert_eq!(rx.receive().await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn oversized_send_is_rejected() {
        let (client, _server) = tokio::io::duplex(64);
        let mut tx = FramedChannel::with_max_frame(client, 8);
        let err = tx.send(b"way too large").await.unwrap_err();
        assert_matches!(err, NetError::FrameTooLarge { len: 13, max: 8 });
    }

    #[tokio::test]
    async fn oversized_receive_is_rejected_before_allocation() {
        let (client, server) = tokio::io::duplex(64);
        let mut tx = FramedChannel::new(client);
        let mut rx = FramedChannel::with_max_frame(server, 4);

        tx.send(b"12345678").await.unwrap();
        let err = rx.receive().await.unwrap_err();
        assert_matches!(err, NetError::FrameTooLarge { len: 8, max: 4 });
    }

    #[tokio::test]
    async fn eof_mid_prefix_is_io_error() {
        let (client, server) = tokio::io::duplex(64);
        let mut rx = FramedChannel::new(server);

        // Write half a length prefix, then close.
        {
            let mut half = client;
            tokio::io::AsyncWriteExt::write_all(&mut half, &[0u8, 0]).await.unwrap();
        }
        assert_matches!(rx.receive().await.unwrap_err(), NetError::Io(_));
    }

    #[tokio::test]
    async fn eof_mid_body_is_io_error() {
        let (client, server) = tokio::io::duplex(64);
        let mut rx = FramedChannel::new(server);

        {
            let mut half = client;
            // Declare 10 bytes, deliver 3, close.
            tokio::io::AsyncWriteExt::write_all(&mut half, &10u32.to_be_bytes())
                .await
                .unwrap();
            tokio::io::AsyncWriteExt::write_all(&mut half, b"abc").await.unwrap();
        }
        assert_matches!(rx.receive().await.unwrap_err(), NetError::Io(_));
    }

    proptest! {
        #[test]
        fn round_trip_arbitrary_payloads(payload in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let received = rt.block_on(async {
                let (client, server) = tokio::io::duplex(8192);
                let mut tx = FramedChannel::new(client);
                let mut rx = FramedChannel::new(server);
                tx.send(&payload).await.unwrap();
                rx.receive().await.unwrap()
            });
            prop_assert_eq!(received, payload);
        }
    }
}
