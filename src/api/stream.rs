//! Streaming response bodies
//!
//! The render writers are synchronous `std::io::Write` consumers and run on
//! the blocking pool. [`ChannelWriter`] buffers their output into chunks and
//! hands each chunk to the async side over a bounded channel, which becomes
//! the HTTP body. A client that disconnects closes the channel, and the
//! next write fails with `BrokenPipe`, stopping the render early.

use axum::body::{Body, Bytes};
use std::io::{self, Write};
use tokio::sync::mpsc;

/// `io::Write` adapter feeding a response body
pub struct ChannelWriter {
    tx: mpsc::Sender<Bytes>,
    buf: Vec<u8>,
    chunk_size: usize,
}

impl ChannelWriter {
    fn new(tx: mpsc::Sender<Bytes>, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            tx,
            buf: Vec::with_capacity(chunk_size),
            chunk_size,
        }
    }

    /// Send buffered bytes, blocking while the channel is full
    ///
    /// Must not be called from inside an async task.
    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = Bytes::from(std::mem::replace(
            &mut self.buf,
            Vec::with_capacity(self.chunk_size),
        ));
        self.tx
            .blocking_send(chunk)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body was dropped"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.tx.is_closed() {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response body was dropped",
            ));
        }
        self.buf.extend_from_slice(data);
        if self.buf.len() >= self.chunk_size {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

impl Drop for ChannelWriter {
    fn drop(&mut self) {
        // Receiver may already be gone; nothing left to report to.
        let _ = self.send_buffered();
    }
}

/// Create a writer and the response body it feeds
///
/// `chunk_size` bytes are buffered before each send; at most `capacity`
/// chunks wait in the channel before the writer blocks.
pub fn streaming_body(chunk_size: usize, capacity: usize) -> (ChannelWriter, Body) {
    let (tx, rx) = mpsc::channel::<Bytes>(capacity.max(1));

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|chunk| (Ok::<Bytes, io::Error>(chunk), rx))
    });

    (ChannelWriter::new(tx, chunk_size), Body::from_stream(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_body_receives_all_writes() {
        let (mut writer, body) = streaming_body(4, 2);

        let task = tokio::task::spawn_blocking(move || {
            writer.write_all(b"[\n{\"a\": 1}")?;
            writer.write_all(b"]\n")?;
            writer.flush()
        });

        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"[\n{\"a\": 1}]\n");
    }

    #[tokio::test]
    async fn test_unflushed_tail_sent_on_drop() {
        let (mut writer, body) = streaming_body(1024, 1);

        tokio::task::spawn_blocking(move || {
            writer.write_all(b"tail").unwrap();
        })
        .await
        .unwrap();

        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"tail");
    }

    #[tokio::test]
    async fn test_write_fails_after_body_dropped() {
        let (mut writer, body) = streaming_body(1, 1);
        drop(body);

        let result = tokio::task::spawn_blocking(move || writer.write_all(b"x"))
            .await
            .unwrap();
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }
}
