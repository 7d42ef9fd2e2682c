//! HTTP/1.x message model and wire codec for the portico gateway.
//!
//! This crate provides the protocol layer a forwarding gateway needs: a
//! faithful message model (ordered headers, lazy bodies) plus incremental
//! encoders and decoders for both directions of an HTTP/1.0 or HTTP/1.1
//! conversation, built on tokio and tokio-util's codec framework.
//!
//! # Features
//!
//! - Ordered, duplicate-preserving header model with case-insensitive lookup
//! - Lazy request/response bodies that stream through without full buffering
//! - Chunked transfer encoding, content-length and close-delimited framing
//! - Keep-alive and expect-continue handling
//! - Connection plumbing for both the accepting and the dialing side
//!
//! # Architecture
//!
//! The crate is organized into three modules:
//!
//! - [`protocol`]: message types ([`protocol::Request`], [`protocol::Response`],
//!   [`protocol::Header`], [`protocol::Body`]) and error types
//! - [`codec`]: `tokio_util::codec` based encoders/decoders for heads and
//!   payloads
//! - [`conn`]: framed connection wrappers used by a transport
//!   ([`conn::SourceConnection`] for accepted sockets,
//!   [`conn::TargetConnection`] for upstream dials)
//!
//! Bodies are one-shot while unread: they wrap the live input stream and are
//! decoded on first access, after which they become a replayable in-memory
//! chunk sequence. Writing an unread body re-encodes it chunk by chunk while
//! materializing it, so a gateway can move large payloads without holding
//! them fully in memory first.
//!
//! # Limitations
//!
//! - HTTP/1.x only, no TLS (terminate upstream or in front)
//! - Maximum head size: 8KB, maximum header fields: 128
//! - Chunk trailers are consumed but not surfaced

pub mod codec;
pub mod conn;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
