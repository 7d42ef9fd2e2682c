use http::Method;

use crate::protocol::header::{self, Header};
use crate::protocol::{Body, BodyFraming, Message, ParseError, Version};

/// An HTTP request: start line, header fields and body.
///
/// The URI is kept as the raw start line token, so both origin-form
/// (`/orders?id=1`) and absolute-form (`http://host/orders`) requests pass
/// through unaltered. [`path`](Request::path) derives the origin-form view
/// used for routing.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: String,
    version: Version,
    header: Header,
    body: Body,
}

impl Request {
    /// A minimal HTTP/1.1 request with empty header and body.
    pub fn new<U: Into<String>>(method: Method, uri: U) -> Self {
        Self {
            method,
            uri: uri.into(),
            version: Version::Http11,
            header: Header::new(),
            body: Body::empty(),
        }
    }

    /// Assembles a request from a decoded head; the body is attached by the
    /// caller once framing is known.
    pub fn from_head<U: Into<String>>(
        method: Method,
        uri: U,
        version: Version,
        header: Header,
    ) -> Self {
        Self { method, uri: uri.into(), version, header, body: Body::empty() }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// The request-target exactly as it appeared on the start line.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn set_uri<U: Into<String>>(&mut self, uri: U) {
        self.uri = uri.into();
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Replaces the body with fixed content and reframes the header to
    /// match: `Content-Length` is set, chunked transfer encoding dropped.
    pub fn set_body_content<C: Into<bytes::Bytes>>(&mut self, content: C) {
        let content = content.into();
        self.header.remove_fields(header::TRANSFER_ENCODING);
        self.header.set_content_length(content.len() as u64);
        self.body = Body::from_content(content);
    }

    /// The origin-form path (with query) this request addresses.
    ///
    /// Absolute-form targets are reduced to everything from the first slash
    /// after the authority; a target without one maps to `/`.
    pub fn path(&self) -> &str {
        let uri = self.uri.as_str();
        let rest = if let Some(rest) = uri.strip_prefix("http://") {
            rest
        } else if let Some(rest) = uri.strip_prefix("https://") {
            rest
        } else {
            return uri;
        };
        match rest.find('/') {
            Some(idx) => &rest[idx..],
            None => "/",
        }
    }

    /// Methods defined to carry no payload unless the header frames one.
    pub fn is_bodiless_method(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::CONNECT)
    }

    /// Selects the body framing for this request per its header.
    ///
    /// Requests are never close-delimited: with neither transfer encoding
    /// nor a content length, the body is empty. A `Content-Length` that is
    /// present but not a valid number is a framing error.
    pub fn body_framing(&self) -> Result<BodyFraming, ParseError> {
        if self.header.is_chunked() {
            return Ok(BodyFraming::Chunked);
        }
        if let Some(raw) = self.header.first_value(header::CONTENT_LENGTH) {
            let length = header::parse_content_length(raw)?;
            return Ok(if length == 0 { BodyFraming::Empty } else { BodyFraming::Length(length) });
        }
        Ok(BodyFraming::Empty)
    }
}

impl Message for Request {
    fn version(&self) -> Version {
        self.version
    }

    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn is_body_empty(&self) -> bool {
        if self.header.is_chunked() {
            return false;
        }
        if let Some(length) = self.header.content_length() {
            return length == 0;
        }
        self.is_bodiless_method() || self.body.is_empty_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_of_origin_form_is_the_uri() {
        let req = Request::new(Method::GET, "/orders?id=1");
        assert_eq!(req.path(), "/orders?id=1");
    }

    #[test]
    fn path_of_absolute_form_strips_authority() {
        let req = Request::new(Method::GET, "http://api.example.com:2000/orders/7");
        assert_eq!(req.path(), "/orders/7");

        let bare = Request::new(Method::GET, "https://api.example.com");
        assert_eq!(bare.path(), "/");
    }

    #[test]
    fn bodiless_methods() {
        assert!(Request::new(Method::GET, "/").is_bodiless_method());
        assert!(Request::new(Method::HEAD, "/").is_bodiless_method());
        assert!(!Request::new(Method::POST, "/").is_bodiless_method());
    }

    #[test]
    fn body_empty_follows_the_header() {
        let mut req = Request::new(Method::POST, "/upload");
        assert!(req.is_body_empty());

        req.header_mut().set_value(header::CONTENT_LENGTH, "12");
        assert!(!req.is_body_empty());

        req.header_mut().set_value(header::CONTENT_LENGTH, "0");
        assert!(req.is_body_empty());

        req.header_mut().remove_fields(header::CONTENT_LENGTH);
        req.header_mut().set_value(header::TRANSFER_ENCODING, "chunked");
        assert!(!req.is_body_empty());
    }

    #[test]
    fn framing_selection() {
        let mut req = Request::new(Method::POST, "/");
        assert_eq!(req.body_framing().unwrap(), BodyFraming::Empty);

        req.header_mut().set_value(header::CONTENT_LENGTH, "42");
        assert_eq!(req.body_framing().unwrap(), BodyFraming::Length(42));

        req.header_mut().set_value(header::TRANSFER_ENCODING, "chunked");
        assert_eq!(req.body_framing().unwrap(), BodyFraming::Chunked);
    }

    #[test]
    fn garbage_content_length_is_a_framing_error() {
        let mut req = Request::new(Method::POST, "/");
        req.header_mut().set_value(header::CONTENT_LENGTH, "banana");

        let err = req.body_framing().unwrap_err();
        assert!(matches!(err, ParseError::InvalidContentLength { .. }));
    }

    #[test]
    fn keep_alive_defaults_per_version() {
        let mut req = Request::new(Method::GET, "/");
        assert!(req.is_keep_alive());

        req.header_mut().set_value(header::CONNECTION, "close");
        assert!(!req.is_keep_alive());

        let mut old = Request::new(Method::GET, "/");
        old.set_version(Version::Http10);
        assert!(!old.is_keep_alive());

        old.header_mut().set_value(header::CONNECTION, "keep-alive");
        assert!(old.is_keep_alive());
    }

    #[test]
    fn set_body_content_reframes_the_header() {
        let mut req = Request::new(Method::POST, "/");
        req.header_mut().set_value(header::TRANSFER_ENCODING, "chunked");

        req.set_body_content("hello");
        assert_eq!(req.header().content_length(), Some(5));
        assert!(!req.header().is_chunked());
        assert_eq!(req.body().content().unwrap().as_ref(), b"hello");
    }
}
