//! Ordered HTTP header model.
//!
//! A gateway must forward header blocks as it received them: field order and
//! duplicates (for example several `Set-Cookie` lines) are preserved, and
//! lookups compare names case-insensitively. That rules out map-shaped
//! containers, so [`Header`] is an insertion-ordered vector of
//! [`HeaderField`] pairs with first-match accessors on top.

use bytes::{BufMut, BytesMut};

use crate::protocol::ParseError;

pub const CONNECTION: &str = "Connection";
pub const PROXY_CONNECTION: &str = "Proxy-Connection";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
pub const HOST: &str = "Host";
pub const EXPECT: &str = "Expect";
pub const X_FORWARDED_FOR: &str = "X-Forwarded-For";
pub const SERVER: &str = "Server";
pub const DATE: &str = "Date";

pub const CHUNKED: &str = "chunked";
pub const CLOSE: &str = "close";
pub const KEEP_ALIVE: &str = "keep-alive";
pub const CONTINUE_100: &str = "100-continue";

/// A single `name: value` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: String,
    value: String,
}

impl HeaderField {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Tests the field name, ignoring ASCII case.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// An ordered sequence of header fields.
///
/// Duplicate names are permitted and kept in insertion order. All name
/// comparisons ignore ASCII case. [`Header::set_value`] replaces the first
/// field with the given name (or appends), so the managed accessors below
/// never produce a second field for the name they maintain.
#[derive(Debug, Clone, Default)]
pub struct Header {
    fields: Vec<HeaderField>,
}

impl Header {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { fields: Vec::with_capacity(capacity) }
    }

    /// Appends a field, keeping any existing fields with the same name.
    pub fn add<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.fields.push(HeaderField::new(name, value));
    }

    /// Replaces the value of the first field with this name, or appends a
    /// new field when none exists. Later duplicates are left untouched.
    pub fn set_value<V: Into<String>>(&mut self, name: &str, value: V) {
        match self.fields.iter_mut().find(|f| f.has_name(name)) {
            Some(field) => field.value = value.into(),
            None => self.fields.push(HeaderField::new(name, value)),
        }
    }

    /// Returns the value of the first field with this name.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.has_name(name)).map(|f| f.value())
    }

    /// Iterates the values of every field with this name, in insertion order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.fields.iter().filter(move |f| f.has_name(name)).map(|f| f.value())
    }

    /// Removes every field with this name.
    pub fn remove_fields(&mut self, name: &str) {
        self.fields.retain(|f| !f.has_name(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.has_name(name))
    }

    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serializes all fields as `name: value\r\n` lines, without the blank
    /// line that terminates a head.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        for field in &self.fields {
            dst.reserve(field.name.len() + field.value.len() + 4);
            dst.put_slice(field.name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(field.value.as_bytes());
            dst.put_slice(b"\r\n");
        }
    }

    /// Parsed `Content-Length`, or `None` when absent or unparsable.
    /// Framing selection validates the raw value with
    /// [`parse_content_length`] and rejects messages with a bad length
    /// before one gets this far.
    pub fn content_length(&self) -> Option<u64> {
        self.first_value(CONTENT_LENGTH).and_then(|v| v.trim().parse().ok())
    }

    pub fn set_content_length(&mut self, len: u64) {
        self.set_value(CONTENT_LENGTH, len.to_string());
    }

    /// True when the final `Transfer-Encoding` token is `chunked`.
    pub fn is_chunked(&self) -> bool {
        self.first_value(TRANSFER_ENCODING)
            .and_then(|v| v.split(',').next_back())
            .is_some_and(|token| token.trim().eq_ignore_ascii_case(CHUNKED))
    }

    pub fn host(&self) -> Option<&str> {
        self.first_value(HOST)
    }

    pub fn set_host<V: Into<String>>(&mut self, host: V) {
        self.set_value(HOST, host);
    }

    pub fn x_forwarded_for(&self) -> Option<&str> {
        self.first_value(X_FORWARDED_FOR)
    }

    /// Appends a client address to `X-Forwarded-For`, comma-separated after
    /// any addresses recorded by proxies before us.
    pub fn append_x_forwarded_for(&mut self, addr: &str) {
        let value = match self.x_forwarded_for() {
            Some(existing) => format!("{existing}, {addr}"),
            None => addr.to_string(),
        };
        self.set_value(X_FORWARDED_FOR, value);
    }

    pub fn expects_100_continue(&self) -> bool {
        self.first_value(EXPECT)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(CONTINUE_100))
    }

    /// True when any `Connection` token is `close`.
    pub fn connection_close_requested(&self) -> bool {
        self.has_connection_token(CONNECTION, CLOSE)
    }

    /// True when any `Connection` token is `keep-alive`.
    pub fn keep_alive_requested(&self) -> bool {
        self.has_connection_token(CONNECTION, KEEP_ALIVE)
    }

    /// True when a proxy on the way asked us to close (`Proxy-Connection: close`).
    pub fn proxy_connection_close(&self) -> bool {
        self.has_connection_token(PROXY_CONNECTION, CLOSE)
    }

    fn has_connection_token(&self, name: &str, token: &str) -> bool {
        self.values(name)
            .flat_map(|v| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    }
}

/// Validates a raw `Content-Length` value.
///
/// Anything that is not a plain decimal number is rejected: a message whose
/// declared length cannot be trusted must not be framed as if the header
/// were absent, or its body bytes would be read as the next message.
pub fn parse_content_length(raw: &str) -> Result<u64, ParseError> {
    raw.trim().parse().map_err(|_| ParseError::invalid_content_length(raw))
}
