//! Streaming response decoder.
//!
//! Same two-phase shape as the request decoder, with one extra input: body
//! framing of a response depends on the request it answers (a HEAD response
//! carries no payload no matter what its header declares), so the caller
//! flags that before each message via
//! [`expect_head_response`](ResponseDecoder::expect_head_response).

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::codec::head::ResponseHeadDecoder;
use crate::protocol::{BodyFraming, Frame, ParseError, PayloadItem, Response};

#[derive(Debug)]
pub struct ResponseDecoder {
    head_decoder: ResponseHeadDecoder,
    payload_decoder: Option<PayloadDecoder>,
    head_request: bool,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Marks whether the next decoded response answers a HEAD request.
    /// Sticky until changed.
    pub fn expect_head_response(&mut self, head_request: bool) {
        self.head_request = head_request;
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self { head_decoder: ResponseHeadDecoder, payload_decoder: None, head_request: false }
    }
}

impl Decoder for ResponseDecoder {
    type Item = Frame<(Response, BodyFraming)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let frame = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Frame::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    self.payload_decoder.take();
                    Some(Frame::Payload(item))
                }
                None => None,
            };
            return Ok(frame);
        }

        match self.head_decoder.decode(src)? {
            Some(response) => {
                let framing = response.body_framing(self.head_request)?;
                self.payload_decoder = Some(PayloadDecoder::for_framing(framing));
                Ok(Some(Frame::Head((response, framing))))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let frame = match payload_decoder.decode_eof(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Frame::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    self.payload_decoder.take();
                    Some(Frame::Payload(item))
                }
                None => None,
            };
            return Ok(frame);
        }

        if src.is_empty() {
            return Ok(None);
        }
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => Err(ParseError::end_of_stream("connection closed inside a response head")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use indoc::indoc;

    fn decode_all(input: &str, head_request: bool) -> Vec<Frame<(Response, BodyFraming)>> {
        let mut buf = BytesMut::from(input.replace('\n', "\r\n").as_str());
        let mut decoder = ResponseDecoder::new();
        decoder.expect_head_response(head_request);

        let mut frames = Vec::new();
        loop {
            match decoder.decode(&mut buf).unwrap() {
                Some(frame) => frames.push(frame),
                None => match decoder.decode_eof(&mut buf).unwrap() {
                    Some(frame) => frames.push(frame),
                    None => break,
                },
            }
        }
        frames
    }

    #[test]
    fn fixed_length_response() {
        let str = indoc! {r##"
        HTTP/1.1 200 OK
        Content-Length: 5

        hello"##};

        let frames = decode_all(str, false);

        assert_eq!(frames.len(), 3);
        assert!(
            matches!(&frames[0], Frame::Head((resp, BodyFraming::Length(5))) if resp.status() == StatusCode::OK)
        );
        assert!(
            matches!(&frames[1], Frame::Payload(PayloadItem::Chunk(bytes)) if bytes.as_ref() == b"hello")
        );
        assert!(matches!(&frames[2], Frame::Payload(PayloadItem::Eof)));
    }

    #[test]
    fn head_response_ignores_declared_length() {
        let frames = decode_all("HTTP/1.1 200 OK\nContent-Length: 500\n\n", true);

        assert_eq!(frames.len(), 2);
        assert!(matches!(&frames[0], Frame::Head((_, BodyFraming::Empty))));
        assert!(matches!(&frames[1], Frame::Payload(PayloadItem::Eof)));
    }

    #[test]
    fn close_delimited_response_ends_at_eof() {
        let str = "HTTP/1.1 200 OK\nConnection: close\n\nstream until close";

        let frames = decode_all(str, false);

        assert!(matches!(&frames[0], Frame::Head((_, BodyFraming::CloseDelimited))));
        assert!(
            matches!(&frames[1], Frame::Payload(PayloadItem::Chunk(bytes)) if bytes.as_ref() == b"stream until close")
        );
        assert!(matches!(&frames[2], Frame::Payload(PayloadItem::Eof)));
    }

    #[test]
    fn interim_continue_is_a_bodiless_message() {
        let str = "HTTP/1.1 100 Continue\n\nHTTP/1.1 200 OK\nContent-Length: 0\n\n";

        let frames = decode_all(str, false);

        assert_eq!(frames.len(), 4);
        assert!(
            matches!(&frames[0], Frame::Head((resp, BodyFraming::Empty)) if resp.status() == StatusCode::CONTINUE)
        );
        assert!(matches!(&frames[1], Frame::Payload(PayloadItem::Eof)));
        assert!(matches!(&frames[2], Frame::Head((resp, _)) if resp.status() == StatusCode::OK));
    }

    #[test]
    fn unframed_keep_alive_response_is_an_error() {
        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nServer: x\r\n\r\n");
        let err = ResponseDecoder::new().decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::AmbiguousFraming { .. }));
    }

    #[test]
    fn truncated_head_at_eof_is_an_error() {
        let mut buf = BytesMut::from("HTTP/1.1 200");
        let mut decoder = ResponseDecoder::new();

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        let err = decoder.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::EndOfStream { .. }));
    }
}
