//! Decoder for bodies delimited by a `Content-Length` header
//! ([RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2)).

use std::cmp;

use crate::protocol::{ParseError, PayloadItem};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Decodes exactly the declared number of payload bytes, emitting them as
/// they arrive, then a single [`PayloadItem::Eof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    remaining: u64,
    eof_emitted: bool,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length, eof_emitted: false }
    }
}

impl Decoder for LengthDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.remaining == 0 {
            if self.eof_emitted {
                return Ok(None);
            }
            self.eof_emitted = true;
            return Ok(Some(PayloadItem::Eof));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let len = cmp::min(self.remaining, src.len() as u64) as usize;
        let bytes = src.split_to(len).freeze();
        self.remaining -= bytes.len() as u64;
        Ok(Some(PayloadItem::Chunk(bytes)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if self.remaining == 0 => Ok(None),
            None => Err(ParseError::end_of_stream(format!(
                "stream ended with {} bytes of declared length unread",
                self.remaining
            ))),
        }
    }
}
