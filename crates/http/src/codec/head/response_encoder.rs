use std::io::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::codec::head::{FastWrite, INIT_HEAD_SIZE};
use crate::protocol::{Message, Response, SendError};

/// Serializes a response head: status line, field lines, blank line.
///
/// The reason phrase is forwarded as received; locally built responses
/// carry the canonical one. An unknown code with no phrase produces the
/// legal `HTTP/1.1 NNN ` form with an empty phrase.
#[derive(Debug, Clone, Default)]
pub struct ResponseEncoder;

impl Encoder<&Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, response: &Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEAD_SIZE);

        write!(
            FastWrite(dst),
            "{} {} {}\r\n",
            response.version(),
            response.status().as_str(),
            response.reason()
        )
        .map_err(SendError::io)?;

        response.header().encode_into(dst);
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
