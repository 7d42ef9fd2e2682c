use http::StatusCode;

use crate::protocol::header::{self, Header};
use crate::protocol::{Body, BodyFraming, Message, ParseError, Version};

/// An HTTP response: status line, header fields and body.
#[derive(Debug)]
pub struct Response {
    version: Version,
    status: StatusCode,
    reason: String,
    header: Header,
    body: Body,
}

impl Response {
    /// Assembles a response from a decoded head; the body is attached by the
    /// caller once framing is known.
    pub fn from_head<R: Into<String>>(
        version: Version,
        status: StatusCode,
        reason: R,
        header: Header,
    ) -> Self {
        Self { version, status, reason: reason.into(), header, body: Body::empty() }
    }

    /// Starts a locally generated response with the gateway's identity
    /// fields (`Server`, `Date`) preset.
    pub fn builder(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder::new(status)
    }

    pub fn ok() -> ResponseBuilder {
        Self::builder(StatusCode::OK)
    }

    pub fn bad_request() -> ResponseBuilder {
        Self::builder(StatusCode::BAD_REQUEST)
    }

    pub fn forbidden() -> ResponseBuilder {
        Self::builder(StatusCode::FORBIDDEN)
    }

    pub fn not_found() -> ResponseBuilder {
        Self::builder(StatusCode::NOT_FOUND)
    }

    pub fn internal_server_error() -> ResponseBuilder {
        Self::builder(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_gateway() -> ResponseBuilder {
        Self::builder(StatusCode::BAD_GATEWAY)
    }

    /// A canned HTML error page in the gateway's uniform shape.
    pub fn error_page(status: StatusCode, detail: &str) -> Response {
        let reason = status.canonical_reason().unwrap_or("Error");
        let html = format!(
            "<html><head><title>{code} {reason}</title></head>\
             <body><h1>{code} {reason}</h1><p>{detail}</p></body></html>",
            code = status.as_u16(),
        );
        Self::builder(status).content_type("text/html;charset=utf-8").body(html).build()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// The reason phrase from the status line; may be empty.
    pub fn reason(&self) -> &str {
        &self.reason
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

    /// Status codes defined to never carry a payload.
    pub fn is_bodiless_status(&self) -> bool {
        self.status.is_informational()
            || self.status == StatusCode::NO_CONTENT
            || self.status == StatusCode::RESET_CONTENT
    }

    /// Selects the body framing for this response per its header, status
    /// and the request method it answers.
    ///
    /// A keep-alive response that could carry a body but declares neither a
    /// length nor chunking cannot be framed and is rejected, since reading
    /// to end of stream would swallow the rest of the connection.
    pub fn body_framing(&self, to_head_request: bool) -> Result<BodyFraming, ParseError> {
        if to_head_request || self.is_bodiless_status() {
            return Ok(BodyFraming::Empty);
        }
        if self.header.is_chunked() {
            return Ok(BodyFraming::Chunked);
        }
        if let Some(raw) = self.header.first_value(header::CONTENT_LENGTH) {
            let length = header::parse_content_length(raw)?;
            return Ok(if length == 0 { BodyFraming::Empty } else { BodyFraming::Length(length) });
        }
        if !self.is_keep_alive() {
            return Ok(BodyFraming::CloseDelimited);
        }
        Err(ParseError::ambiguous_framing(
            "keep-alive response declares neither content length nor chunked encoding",
        ))
    }
}

/// Builder for locally generated responses.
///
/// Every built response carries `Server` and `Date` fields and, once
/// content is attached, an exact `Content-Length`.
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    header: Header,
    content: bytes::Bytes,
}

impl ResponseBuilder {
    fn new(status: StatusCode) -> Self {
        let mut header = Header::new();
        header.add(header::SERVER, "portico");
        header.add(header::DATE, httpdate::fmt_http_date(std::time::SystemTime::now()));
        Self { status, header, content: bytes::Bytes::new() }
    }

    pub fn header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.header.add(name, value);
        self
    }

    pub fn content_type<V: Into<String>>(mut self, value: V) -> Self {
        self.header.set_value(header::CONTENT_TYPE, value);
        self
    }

    pub fn body<C: Into<bytes::Bytes>>(mut self, content: C) -> Self {
        self.content = content.into();
        self
    }

    pub fn build(mut self) -> Response {
        self.header.set_content_length(self.content.len() as u64);
        let reason = self.status.canonical_reason().unwrap_or("").to_owned();
        Response {
            version: Version::Http11,
            status: self.status,
            reason,
            header: self.header,
            body: Body::from_content(self.content),
        }
    }
}

impl Message for Response {
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
        if self.is_bodiless_status() {
            return true;
        }
        if self.header.is_chunked() {
            return false;
        }
        if let Some(length) = self.header.content_length() {
            return length == 0;
        }
        self.body.is_empty_content()
    }
}
