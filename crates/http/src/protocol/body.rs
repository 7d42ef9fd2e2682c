//! Lazy message bodies.
//!
//! A gateway rarely needs the payload it forwards; it needs to move it.
//! [`Body`] therefore starts life as a thin wrapper over the live input
//! stream and is decoded only on first access. Writing an unread body
//! decodes and re-encodes it one chunk at a time (write-through), recording
//! the chunks as they pass so that afterwards the body is a fixed,
//! replayable in-memory sequence. An unread body is one-shot: the stream
//! behind it can only be consumed once.

use std::fmt;

use crate::codec::body::PayloadEncoder;
use crate::protocol::{HttpError, ParseError, PayloadItem, SendError};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::debug;

/// Pull side of a decoded payload stream.
///
/// Implementations wrap whatever is feeding the body (a framed connection
/// read half, a test fixture) and yield [`PayloadItem`]s until `Eof`.
#[async_trait]
pub trait PayloadSource: Send + Sync {
    async fn next_item(&mut self) -> Result<PayloadItem, ParseError>;
}

/// An HTTP message body: an ordered chunk sequence, decoded lazily.
///
/// The `chunked` flag remembers the original wire framing so re-encoding
/// reproduces it; the body is materialized (`is_read`) once the source has
/// been drained by [`read`](Body::read), [`write_to`](Body::write_to),
/// [`raw`](Body::raw) or [`discard`](Body::discard).
pub struct Body {
    chunks: Vec<Bytes>,
    source: Option<Box<dyn PayloadSource>>,
    chunked: bool,
}

impl Body {
    /// A body with no content at all.
    pub fn empty() -> Self {
        Self { chunks: Vec::new(), source: None, chunked: false }
    }

    /// A materialized body holding the given content, flat framing.
    pub fn from_content<C: Into<Bytes>>(content: C) -> Self {
        let content = content.into();
        let chunks = if content.is_empty() { Vec::new() } else { vec![content] };
        Self { chunks, source: None, chunked: false }
    }

    /// An unread body over a live payload stream.
    pub fn streaming(source: Box<dyn PayloadSource>, chunked: bool) -> Self {
        Self { chunks: Vec::new(), source: Some(source), chunked }
    }

    /// False until the underlying stream has been fully consumed.
    pub fn is_read(&self) -> bool {
        self.source.is_none()
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn is_empty_content(&self) -> bool {
        self.source.is_none() && self.chunks.is_empty()
    }

    /// Materializes the body if needed and returns the complete decoded
    /// content. Idempotent once read.
    pub async fn read(&mut self) -> Result<Bytes, ParseError> {
        self.materialize().await?;
        Ok(self.assembled())
    }

    /// The complete decoded content, or `None` while unread.
    pub fn content(&self) -> Option<Bytes> {
        if self.source.is_some() {
            return None;
        }
        Some(self.assembled())
    }

    /// Writes the body to `out` in its wire framing.
    ///
    /// Unread bodies stream through: each decoded chunk is re-encoded and
    /// written before the next is pulled, and recorded along the way, so
    /// after this call the body is materialized and replayable. Already
    /// read bodies replay their recorded chunks byte-identically.
    pub async fn write_to<W>(&mut self, out: &mut W) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut encoder = self.wire_encoder();
        let mut buf = BytesMut::with_capacity(8 * 1024);

        match self.source.take() {
            None => {
                for chunk in &self.chunks {
                    encoder.encode(PayloadItem::Chunk(chunk.clone()), &mut buf)?;
                }
                encoder.encode(PayloadItem::Eof, &mut buf)?;
                if !buf.is_empty() {
                    out.write_all(&buf).await.map_err(SendError::io)?;
                }
            }
            Some(mut source) => loop {
                let item = source.next_item().await?;
                let is_eof = item.is_eof();
                if let PayloadItem::Chunk(chunk) = &item {
                    if !chunk.is_empty() {
                        self.chunks.push(chunk.clone());
                    }
                }
                encoder.encode(item, &mut buf)?;
                if !buf.is_empty() {
                    out.write_all(&buf).await.map_err(SendError::io)?;
                    buf.clear();
                }
                if is_eof {
                    break;
                }
            },
        }
        Ok(())
    }

    /// Reconstructs the exact on-wire byte representation of the body, for
    /// diagnostics such as logging or content hashing.
    pub async fn raw(&mut self) -> Result<Bytes, HttpError> {
        self.materialize().await?;

        let mut encoder = self.wire_encoder();
        let mut buf = BytesMut::new();
        for chunk in &self.chunks {
            encoder.encode(PayloadItem::Chunk(chunk.clone()), &mut buf)?;
        }
        encoder.encode(PayloadItem::Eof, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Reads and drops any unread remainder, so the connection behind this
    /// body can carry the next message. The content is forfeited.
    pub async fn discard(&mut self) -> Result<(), ParseError> {
        let Some(mut source) = self.source.take() else {
            return Ok(());
        };
        let mut dropped = 0usize;
        loop {
            match source.next_item().await? {
                PayloadItem::Chunk(chunk) => dropped += chunk.len(),
                PayloadItem::Eof => break,
            }
        }
        if dropped > 0 {
            debug!(dropped, "discarded unread body bytes");
        }
        Ok(())
    }

    /// An independent copy of a materialized body. Unread bodies wrap a
    /// one-shot stream and cannot be duplicated.
    pub fn try_clone(&self) -> Option<Body> {
        if self.source.is_some() {
            return None;
        }
        Some(Body { chunks: self.chunks.clone(), source: None, chunked: self.chunked })
    }

    async fn materialize(&mut self) -> Result<(), ParseError> {
        let Some(mut source) = self.source.take() else {
            return Ok(());
        };
        loop {
            match source.next_item().await? {
                PayloadItem::Chunk(chunk) => {
                    if !chunk.is_empty() {
                        self.chunks.push(chunk);
                    }
                }
                PayloadItem::Eof => break,
            }
        }
        Ok(())
    }

    fn wire_encoder(&self) -> PayloadEncoder {
        if self.chunked { PayloadEncoder::chunked() } else { PayloadEncoder::flat() }
    }

    fn assembled(&self) -> Bytes {
        match self.chunks.len() {
            0 => Bytes::new(),
            1 => self.chunks[0].clone(),
            _ => {
                let total = self.chunks.iter().map(Bytes::len).sum();
                let mut buf = BytesMut::with_capacity(total);
                for chunk in &self.chunks {
                    buf.extend_from_slice(chunk);
                }
                buf.freeze()
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("read", &self.is_read())
            .field("chunked", &self.chunked)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}
