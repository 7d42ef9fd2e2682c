//! HTTP/1.x message model.
//!
//! This module provides the data types the rest of the gateway works with:
//! ordered headers, lazy bodies, requests and responses, and the error
//! taxonomy of the wire layer.
//!
//! # Architecture
//!
//! - **Header fields** ([`header`]): [`Header`] keeps fields as an ordered
//!   list with case-insensitive lookup, plus accessors for the fields the
//!   gateway interprets (`Content-Length`, `Transfer-Encoding`,
//!   `Connection`, `Host`, `X-Forwarded-For`).
//!
//! - **Bodies** ([`Body`]): an ordered chunk sequence decoded lazily from a
//!   [`PayloadSource`], write-through while unread so large payloads stream
//!   instead of buffering.
//!
//! - **Messages**: [`Request`] and [`Response`] share the [`Message`] trait
//!   (header/body access, keep-alive and body-emptiness judgement).
//!
//! - **Framing** ([`Frame`], [`BodyFraming`], [`PayloadItem`]): the shapes
//!   exchanged with the codec layer.
//!
//! - **Errors**: [`ParseError`] for the read side, [`SendError`] for the
//!   write side, [`HttpError`] over both.

mod body;
pub use body::Body;
pub use body::PayloadSource;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

mod frame;
pub use frame::BodyFraming;
pub use frame::Frame;
pub use frame::PayloadItem;

pub mod header;
pub use header::Header;

mod message;
pub use message::Message;
pub use message::Version;

mod request;
pub use request::Request;

mod response;
pub use response::Response;
pub use response::ResponseBuilder;
