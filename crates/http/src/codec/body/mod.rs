//! Payload encoding and decoding for the body framing modes.
//!
//! Three ways a body can be delimited on the wire, three decoder/encoder
//! pairs beneath two unified entry points:
//!
//! - chunked transfer encoding (`ChunkedDecoder` / `ChunkedEncoder`)
//! - a declared `Content-Length` (`LengthDecoder` / `FlatEncoder`)
//! - delimited by connection close (`CloseDelimitedDecoder`, re-encoded
//!   flat)
//!
//! [`PayloadDecoder`] and [`PayloadEncoder`] dispatch between them so the
//! message-level codecs and the lazy body only carry one type each.

mod chunked_decoder;
mod chunked_encoder;
mod close_delimited_decoder;
mod flat_encoder;
mod length_decoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
