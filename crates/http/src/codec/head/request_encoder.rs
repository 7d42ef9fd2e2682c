use std::io::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::codec::head::{FastWrite, INIT_HEAD_SIZE};
use crate::protocol::{Message, Request, SendError};

/// Serializes a request head: start line, field lines, blank line.
///
/// Fields are written exactly as the header holds them, in order. The body
/// is not touched here; the connection layer streams it separately so
/// unread bodies stay write-through.
#[derive(Debug, Clone, Default)]
pub struct RequestEncoder;

impl Encoder<&Request> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, request: &Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEAD_SIZE);

        write!(FastWrite(dst), "{} {} {}\r\n", request.method(), request.uri(), request.version())
            .map_err(SendError::io)?;

        request.header().encode_into(dst);
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
