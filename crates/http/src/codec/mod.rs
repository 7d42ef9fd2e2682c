//! HTTP/1.x wire codec.
//!
//! Streaming codecs between raw bytes and the protocol data model, built on
//! [`tokio_util::codec`]. Both directions exist for both message kinds,
//! since a gateway is simultaneously a server (decode requests, encode
//! responses) and a client (encode requests, decode responses).
//!
//! # Architecture
//!
//! - Head parsing and serialization via the [`head`] module.
//! - Payload framing via the [`body`] module: chunked, fixed-length and
//!   close-delimited decoding; chunked and flat encoding.
//! - [`RequestDecoder`] and [`ResponseDecoder`] drive the two phases as a
//!   state machine, yielding a [`Frame`](crate::protocol::Frame) head
//!   followed by payload items ending in `Eof`.
//!
//! Encoding a full message is split on purpose: [`RequestEncoder`] and
//! [`ResponseEncoder`] serialize only the head, while the body writes
//! itself through [`Body::write_to`](crate::protocol::Body::write_to), so
//! unread bodies stream chunk by chunk instead of being buffered.

pub mod body;
pub mod head;

mod request_decoder;
mod response_decoder;

pub use head::{RequestEncoder, ResponseEncoder};
pub use request_decoder::RequestDecoder;
pub use response_decoder::ResponseDecoder;
