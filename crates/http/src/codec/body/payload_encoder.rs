use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::flat_encoder::FlatEncoder;
use crate::protocol::{PayloadItem, SendError};
use bytes::BytesMut;

use tokio_util::codec::Encoder;

/// Unified encoder over the body wire formats: chunked framing, a flat byte
/// run, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Chunked(ChunkedEncoder),
    Flat(FlatEncoder),
    NoBody,
}

impl PayloadEncoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()) }
    }

    pub fn flat() -> Self {
        Self { kind: Kind::Flat(FlatEncoder::new()) }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_finished(&self) -> bool {
        match &self.kind {
            Kind::Chunked(encoder) => encoder.is_finished(),
            Kind::Flat(encoder) => encoder.is_finished(),
            Kind::NoBody => true,
        }
    }
}

impl Encoder<PayloadItem> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Chunked(encoder) => encoder.encode(item, dst),
            Kind::Flat(encoder) => encoder.encode(item, dst),
            Kind::NoBody => Ok(()),
        }
    }
}
