use std::fmt;

use crate::protocol::header::Header;
use crate::protocol::Body;

/// The HTTP protocol versions the gateway speaks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    /// Parses the version token of a start line, e.g. `HTTP/1.1`.
    pub fn from_token(token: &str) -> Option<Version> {
        match token {
            "HTTP/1.1" => Some(Version::Http11),
            "HTTP/1.0" => Some(Version::Http10),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }

    /// Whether connections default to persistent at this version.
    pub fn default_keep_alive(&self) -> bool {
        matches!(self, Version::Http11)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared surface of [`Request`](crate::protocol::Request) and
/// [`Response`](crate::protocol::Response).
///
/// Interceptors that treat both directions alike (logging, header rewrites)
/// work against this trait instead of matching on the concrete type.
pub trait Message {
    fn version(&self) -> Version;

    fn header(&self) -> &Header;

    fn header_mut(&mut self) -> &mut Header;

    fn body(&self) -> &Body;

    fn body_mut(&mut self) -> &mut Body;

    /// Whether the message is known to carry no payload, judged from the
    /// head alone without touching the body stream.
    fn is_body_empty(&self) -> bool;

    /// Whether the connection may carry further messages after this one.
    ///
    /// `Connection`/`Proxy-Connection` fields override the per-version
    /// default: HTTP/1.1 is persistent unless `close` is present, HTTP/1.0
    /// only with an explicit `keep-alive`.
    fn is_keep_alive(&self) -> bool {
        let header = self.header();
        if header.proxy_connection_close() {
            return false;
        }
        match self.version() {
            Version::Http11 => !header.connection_close_requested(),
            Version::Http10 => header.keep_alive_requested(),
        }
    }
}
