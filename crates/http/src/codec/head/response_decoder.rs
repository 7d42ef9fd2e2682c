use bytes::BytesMut;
use http::StatusCode;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::head::{find_head_end, parse_field_lines, split_start_line};
use crate::protocol::{ParseError, Response, Version};

/// Decodes a response head (status line plus field lines) into a
/// [`Response`] with an empty body; framing happens one layer up, where the
/// method of the request being answered is known.
#[derive(Debug, Clone, Default)]
pub struct ResponseHeadDecoder;

impl Decoder for ResponseHeadDecoder {
    type Item = Response;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(head_end) = find_head_end(src)? else {
            return Ok(None);
        };

        let head = src.split_to(head_end);
        trace!(head_size = head_end, "parsed response head");

        let (status_line, field_block) = split_start_line(&head)?;
        let (version, status, reason) = parse_status_line(status_line)?;
        let header = parse_field_lines(field_block)?;

        Ok(Some(Response::from_head(version, status, reason, header)))
    }
}

/// Parses `HTTP-version SP status-code SP [reason-phrase]`.
///
/// The reason phrase may contain spaces and may be absent entirely.
fn parse_status_line(line: &str) -> Result<(Version, StatusCode, &str), ParseError> {
    let mut parts = line.splitn(3, ' ');

    let version_token =
        parts.next().ok_or_else(|| ParseError::invalid_start_line("empty status line"))?;
    let code_token = parts
        .next()
        .ok_or_else(|| ParseError::invalid_start_line(format!("missing status code: {line}")))?;
    let reason = parts.next().unwrap_or("");

    let version = Version::from_token(version_token)
        .ok_or_else(|| ParseError::InvalidVersion(Some(version_token.to_owned())))?;
    let status = code_token
        .parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| ParseError::invalid_start_line(format!("invalid status code: {code_token}")))?;

    Ok((version, status, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;
    use indoc::indoc;

    fn decode(input: &str) -> Result<Option<Response>, ParseError> {
        let mut buf = BytesMut::from(input.replace('\n', "\r\n").as_str());
        ResponseHeadDecoder.decode(&mut buf)
    }

    #[test]
    fn plain_response() {
        let str = indoc! {r##"
        HTTP/1.1 200 OK
        Content-Type: text/plain
        Content-Length: 5

        "##};

        let response = decode(str).unwrap().unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.reason(), "OK");
        assert_eq!(response.version(), Version::Http11);
        assert_eq!(response.header().content_length(), Some(5));
    }

    #[test]
    fn reason_phrase_may_contain_spaces() {
        let response = decode("HTTP/1.1 404 Not Found\nContent-Length: 0\n\n").unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.reason(), "Not Found");
    }

    #[test]
    fn reason_phrase_may_be_absent() {
        let response = decode("HTTP/1.1 204\nConnection: close\n\n").unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.reason(), "");
    }

    #[test]
    fn invalid_status_code_is_an_error() {
        let err = decode("HTTP/1.1 9999 Nope\n\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidStartLine { .. }));
    }

    #[test]
    fn incomplete_head_suspends() {
        assert!(decode("HTTP/1.1 200 OK\nServer: x\n").unwrap().is_none());
    }
}
