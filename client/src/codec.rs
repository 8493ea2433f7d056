//! Line codec for the analysis-server wire protocol.
//!
//! The server speaks newline-delimited UTF-8 JSON: one message per line,
//! both directions. This module provides [`LineReader`] and [`LineWriter`]
//! for async reading and writing of those messages.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::Error;

/// Maximum accepted line length (8 MiB). Anything longer is rejected
/// rather than buffered without bound.
const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Reads one JSON message per line from the server's output stream.
pub struct LineReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line: Vec::new(),
        }
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` on end-of-stream. Blank lines are skipped.
    /// Returns [`Error::Decode`] for a line that is not valid JSON and
    /// [`Error::OversizedLine`] for a line over the frame limit; both
    /// leave the reader usable for the next line.
    pub async fn read_message(&mut self) -> Result<Option<Value>, Error> {
        loop {
            if !self.fill_line().await? {
                return Ok(None);
            }

            let trimmed = self.line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            return serde_json::from_slice(trimmed)
                .map(Some)
                .map_err(Error::Decode);
        }
    }

    /// Accumulate one line into the buffer, checking the limit before
    /// each chunk is kept so an oversized line is never held in memory.
    /// Returns `false` on a clean end of stream.
    async fn fill_line(&mut self) -> Result<bool, Error> {
        self.line.clear();
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                // Stream ended mid-line; hand back what we have.
                return Ok(!self.line.is_empty());
            }

            if let Some(pos) = available.iter().position(|&b| b == b'\n') {
                if self.line.len() + pos > MAX_LINE_BYTES {
                    let len = self.line.len() + pos;
                    self.line.clear();
                    self.reader.consume(pos + 1);
                    return Err(Error::OversizedLine { len });
                }
                self.line.extend_from_slice(&available[..pos]);
                self.reader.consume(pos + 1);
                return Ok(true);
            }

            let n = available.len();
            if self.line.len() + n > MAX_LINE_BYTES {
                let seen = self.line.len() + n;
                self.line.clear();
                self.reader.consume(n);
                let dropped = self.discard_to_newline().await?;
                return Err(Error::OversizedLine { len: seen + dropped });
            }
            self.line.extend_from_slice(available);
            self.reader.consume(n);
        }
    }

    /// Drop bytes until past the next newline so the stream stays
    /// aligned on message boundaries after an oversized line.
    async fn discard_to_newline(&mut self) -> Result<usize, Error> {
        let mut dropped = 0;
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(dropped);
            }
            if let Some(pos) = available.iter().position(|&b| b == b'\n') {
                self.reader.consume(pos + 1);
                return Ok(dropped + pos);
            }
            let n = available.len();
            dropped += n;
            self.reader.consume(n);
        }
    }

    #[cfg(test)]
    fn buffered_len(&self) -> usize {
        self.line.len()
    }
}

/// Writes one JSON message per line to the server's input stream.
///
/// Each message is serialized with its trailing newline into a single
/// buffer and written with one write call, then flushed, so concurrent
/// observers of the stream never see a partial message.
pub struct LineWriter<W> {
    writer: Option<W>,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    /// Serialize `msg` as one line and write it atomically.
    ///
    /// Fails with [`Error::TransportClosed`] once [`LineWriter::close`]
    /// has been called.
    pub async fn write_message(&mut self, msg: &Value) -> Result<(), Error> {
        let writer = self.writer.as_mut().ok_or(Error::TransportClosed)?;

        let mut buf = serde_json::to_vec(msg).map_err(Error::Decode)?;
        buf.push(b'\n');

        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Close the underlying stream. Subsequent writes fail with
    /// [`Error::TransportClosed`]. Idempotent.
    pub fn close(&mut self) {
        self.writer = None;
    }
}
