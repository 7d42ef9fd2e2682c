//! Streaming request decoder.
//!
//! Decoding runs in two phases driven by one state field: while
//! `payload_decoder` is `None` the decoder is reading a head, afterwards it
//! forwards payload items until `Eof`, then flips back. Every message thus
//! becomes one `Frame::Head` followed by zero or more chunks and exactly
//! one `Eof`, including bodiless messages.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::codec::head::RequestHeadDecoder;
use crate::protocol::{BodyFraming, Frame, ParseError, PayloadItem, Request};

#[derive(Debug)]
pub struct RequestDecoder {
    head_decoder: RequestHeadDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { head_decoder: RequestHeadDecoder, payload_decoder: None }
    }
}

impl Decoder for RequestDecoder {
    type Item = Frame<(Request, BodyFraming)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let frame = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Frame::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    // this request's payload is done, back to head parsing
                    self.payload_decoder.take();
                    Some(Frame::Payload(item))
                }
                None => None,
            };
            return Ok(frame);
        }

        match self.head_decoder.decode(src)? {
            Some(request) => {
                let framing = request.body_framing()?;
                self.payload_decoder = Some(PayloadDecoder::for_framing(framing));
                Ok(Some(Frame::Head((request, framing))))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let frame = match payload_decoder.decode_eof(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Frame::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    self.payload_decoder.take();
                    Some(Frame::Payload(item))
                }
                None => None,
            };
            return Ok(frame);
        }

        if src.is_empty() {
            return Ok(None);
        }
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => Err(ParseError::end_of_stream("connection closed inside a request head")),
        }
    }
}
