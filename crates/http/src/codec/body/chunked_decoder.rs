//! Decoder for HTTP chunked transfer encoding.
//!
//! Chunked bodies arrive as a series of size-prefixed data blocks
//! ([RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1)):
//! a hexadecimal size line, that many data bytes, a CRLF, repeated until a
//! zero-size chunk. Trailer fields after the zero chunk are consumed and
//! dropped. Chunk data is emitted as soon as it is available, so a single
//! large chunk may surface as several [`PayloadItem::Chunk`]s.

use crate::protocol::{ParseError, PayloadItem};
use bytes::{Buf, BytesMut};
use std::cmp;
use tokio_util::codec::Decoder;
use State::*;

/// A streaming decoder for chunked transfer encoding.
///
/// Emits [`PayloadItem::Chunk`] for decoded data, a single
/// [`PayloadItem::Eof`] once the terminating chunk and trailer section have
/// been consumed, and `None` afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: State,
    remaining: u64,
    seen_size_digit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Reading the hex chunk size
    Size,
    /// Skipping a chunk extension up to the CR
    Extension,
    /// Expecting the LF that ends the size line
    SizeLf,
    /// Reading chunk data
    Data,
    /// Expecting the CR after chunk data
    DataCr,
    /// Expecting the LF after chunk data
    DataLf,
    /// At the start of a trailer line, which may be the empty terminator
    TrailerOrEnd,
    /// Skipping a trailer field line up to the CR
    TrailerSkip,
    /// Expecting the LF that ends a trailer line
    TrailerLf,
    /// Expecting the final LF
    EndLf,
    /// The terminating chunk has been fully consumed
    Done,
}

/// Takes one byte from the buffer, or suspends the decode until more data
/// arrives.
macro_rules! next_byte {
    ($src:ident) => {{
        if !$src.has_remaining() {
            return Ok(None);
        }
        $src.get_u8()
    }};
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: Size, remaining: 0, seen_size_digit: false }
    }

    fn accumulate_size(&mut self, digit: u8) -> Result<(), ParseError> {
        self.remaining = self
            .remaining
            .checked_mul(16)
            .and_then(|size| size.checked_add(u64::from(digit)))
            .ok_or_else(|| ParseError::invalid_chunk("chunk size overflows u64"))?;
        self.seen_size_digit = true;
        Ok(())
    }

    fn check_size_present(&self) -> Result<(), ParseError> {
        if self.seen_size_digit {
            Ok(())
        } else {
            Err(ParseError::invalid_chunk("missing chunk size"))
        }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                Size => {
                    let byte = next_byte!(src);
                    if let Some(digit) = hex_digit(byte) {
                        self.accumulate_size(digit)?;
                    } else {
                        match byte {
                            b';' => {
                                self.check_size_present()?;
                                self.state = Extension;
                            }
                            b'\r' => {
                                self.check_size_present()?;
                                self.state = SizeLf;
                            }
                            _ => {
                                return Err(ParseError::invalid_chunk(format!(
                                    "unexpected byte 0x{byte:02x} in chunk size"
                                )));
                            }
                        }
                    }
                }

                Extension => match next_byte!(src) {
                    b'\r' => self.state = SizeLf,
                    b'\n' => return Err(ParseError::invalid_chunk("bare LF in chunk extension")),
                    _ => {}
                },

                SizeLf => match next_byte!(src) {
                    b'\n' => {
                        if self.remaining == 0 {
                            self.state = TrailerOrEnd;
                        } else {
                            self.state = Data;
                        }
                    }
                    _ => return Err(ParseError::invalid_chunk("missing LF after chunk size")),
                },

                Data => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let len = cmp::min(self.remaining, src.len() as u64) as usize;
                    let bytes = src.split_to(len).freeze();
                    self.remaining -= bytes.len() as u64;
                    if self.remaining == 0 {
                        self.state = DataCr;
                    }
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                DataCr => match next_byte!(src) {
                    b'\r' => self.state = DataLf,
                    _ => return Err(ParseError::invalid_chunk("missing CR after chunk data")),
                },

                DataLf => match next_byte!(src) {
                    b'\n' => {
                        self.state = Size;
                        self.seen_size_digit = false;
                    }
                    _ => return Err(ParseError::invalid_chunk("missing LF after chunk data")),
                },

                TrailerOrEnd => match next_byte!(src) {
                    b'\r' => self.state = EndLf,
                    b'\n' => return Err(ParseError::invalid_chunk("bare LF in trailer section")),
                    _ => self.state = TrailerSkip,
                },

                TrailerSkip => match next_byte!(src) {
                    b'\r' => self.state = TrailerLf,
                    b'\n' => return Err(ParseError::invalid_chunk("bare LF in trailer field")),
                    _ => {}
                },

                TrailerLf => match next_byte!(src) {
                    b'\n' => self.state = TrailerOrEnd,
                    _ => return Err(ParseError::invalid_chunk("missing LF after trailer field")),
                },

                EndLf => match next_byte!(src) {
                    b'\n' => {
                        self.state = Done;
                        return Ok(Some(PayloadItem::Eof));
                    }
                    _ => return Err(ParseError::invalid_chunk("missing final LF")),
                },

                Done => return Ok(None),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if self.state == Done => Ok(None),
            None => Err(ParseError::end_of_stream("connection closed inside chunked body")),
        }
    }
}
