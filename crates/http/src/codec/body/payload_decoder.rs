//! Unified decoder over the three body framing modes.
//!
//! A message head decides how its body is delimited (see
//! [`BodyFraming`](crate::protocol::BodyFraming)); this decoder dispatches
//! to the matching strategy so the two-phase message decoders only have to
//! carry one payload decoder type.

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::close_delimited_decoder::CloseDelimitedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{BodyFraming, ParseError, PayloadItem};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Length(LengthDecoder),
    Chunked(ChunkedDecoder),
    CloseDelimited(CloseDelimitedDecoder),
    NoBody,
}

impl PayloadDecoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    pub fn close_delimited() -> Self {
        Self { kind: Kind::CloseDelimited(CloseDelimitedDecoder::new()) }
    }

    /// Picks the decoder matching a head's framing decision.
    pub fn for_framing(framing: BodyFraming) -> Self {
        match framing {
            BodyFraming::Empty => Self::empty(),
            BodyFraming::Length(n) => Self::fix_length(n),
            BodyFraming::Chunked => Self::chunked(),
            BodyFraming::CloseDelimited => Self::close_delimited(),
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(decoder) => decoder.decode(src),
            Kind::Chunked(decoder) => decoder.decode(src),
            Kind::CloseDelimited(decoder) => decoder.decode(src),
            Kind::NoBody => Ok(Some(PayloadItem::Eof)),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(decoder) => decoder.decode_eof(src),
            Kind::Chunked(decoder) => decoder.decode_eof(src),
            Kind::CloseDelimited(decoder) => decoder.decode_eof(src),
            Kind::NoBody => Ok(None),
        }
    }
}
