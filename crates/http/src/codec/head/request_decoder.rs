use bytes::{Buf, BytesMut};
use http::Method;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::head::{find_head_end, parse_field_lines, split_start_line};
use crate::protocol::{ParseError, Request, Version};

/// Decodes a request head (start line plus field lines) into a [`Request`]
/// with an empty body; body framing and attachment happen one layer up.
///
/// Empty lines ahead of the start line are tolerated and skipped, as some
/// clients emit a stray CRLF between pipelined requests.
#[derive(Debug, Clone, Default)]
pub struct RequestHeadDecoder;

impl Decoder for RequestHeadDecoder {
    type Item = Request;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.starts_with(b"\r\n") {
            src.advance(2);
        }

        let Some(head_end) = find_head_end(src)? else {
            return Ok(None);
        };

        let head = src.split_to(head_end);
        trace!(head_size = head_end, "parsed request head");

        let (start_line, field_block) = split_start_line(&head)?;
        let (method, uri, version) = parse_request_line(start_line)?;
        let header = parse_field_lines(field_block)?;

        Ok(Some(Request::from_head(method, uri, version, header)))
    }
}

/// Parses `METHOD SP request-target SP HTTP-version`.
fn parse_request_line(line: &str) -> Result<(Method, &str, Version), ParseError> {
    let mut parts = line.split(' ').filter(|p| !p.is_empty());

    let method_token =
        parts.next().ok_or_else(|| ParseError::invalid_start_line("empty request line"))?;
    let uri = parts
        .next()
        .ok_or_else(|| ParseError::invalid_start_line(format!("missing request target: {line}")))?;
    let version_token = parts
        .next()
        .ok_or_else(|| ParseError::invalid_start_line(format!("missing http version: {line}")))?;

    if parts.next().is_some() {
        return Err(ParseError::invalid_start_line(format!("excess tokens in request line: {line}")));
    }

    let method = Method::from_bytes(method_token.as_bytes())
        .map_err(|_| ParseError::invalid_start_line(format!("invalid method: {method_token}")))?;
    let version = Version::from_token(version_token)
        .ok_or_else(|| ParseError::InvalidVersion(Some(version_token.to_owned())))?;

    Ok((method, uri, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;
    use indoc::indoc;

    fn decode(input: &str) -> Result<Option<Request>, ParseError> {
        let mut buf = BytesMut::from(input.replace('\n', "\r\n").as_str());
        RequestHeadDecoder.decode(&mut buf)
    }

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let request = decode(str).unwrap().unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.uri(), "/index.html");
        assert_eq!(request.version(), Version::Http11);
        assert_eq!(request.header().len(), 3);
        assert_eq!(request.header().first_value("host"), Some("127.0.0.1:8080"));
        assert_eq!(request.header().first_value("user-agent"), Some("curl/7.79.1"));
        assert!(request.is_body_empty());
    }

    #[test]
    fn incomplete_head_suspends() {
        let result = decode("GET / HTTP/1.1\nHost: a\n").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn leaves_the_body_bytes_in_the_buffer() {
        let input = "POST /u HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
        let mut buf = BytesMut::from(input);

        let request = RequestHeadDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(&buf[..], b"abc");
    }

    #[test]
    fn skips_stray_crlf_before_the_request_line() {
        let request = decode("\n\nGET / HTTP/1.1\nHost: a\n\n").unwrap().unwrap();
        assert_eq!(request.uri(), "/");
    }

    #[test]
    fn http_10_version() {
        let request = decode("GET / HTTP/1.0\nHost: a\n\n").unwrap().unwrap();
        assert_eq!(request.version(), Version::Http10);
    }

    #[test]
    fn unsupported_version_is_an_error() {
        let err = decode("GET / HTTP/2\nHost: a\n\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidVersion(Some(v)) if v == "HTTP/2"));
    }

    #[test]
    fn garbled_request_line_is_an_error() {
        let err = decode("NOT-A-REQUEST\nHost: a\n\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidStartLine { .. }));
    }

    #[test]
    fn malformed_field_line_is_skipped_not_fatal() {
        let str = indoc! {r##"
        GET / HTTP/1.1
        Host: example.com
        garbage-line-without-a-colon
        Accept: */*

        "##};

        let request = decode(str).unwrap().unwrap();
        assert_eq!(request.header().len(), 2);
    }
}
