//! Decoder for bodies delimited by connection close.
//!
//! HTTP/1.0 responses (and 1.1 responses that opted out of keep-alive) may
//! carry neither `Content-Length` nor chunking; the body simply runs until
//! the peer closes the connection. Everything that arrives is payload.

use crate::protocol::{ParseError, PayloadItem};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseDelimitedDecoder {
    eof_emitted: bool,
}

impl CloseDelimitedDecoder {
    pub fn new() -> Self {
        Self { eof_emitted: false }
    }
}

impl Default for CloseDelimitedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for CloseDelimitedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let bytes = src.split_to(src.len()).freeze();
        Ok(Some(PayloadItem::Chunk(bytes)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // the close is the delimiter, so end of stream is the regular end
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if self.eof_emitted => Ok(None),
            None => {
                self.eof_emitted = true;
                Ok(Some(PayloadItem::Eof))
            }
        }
    }
}
