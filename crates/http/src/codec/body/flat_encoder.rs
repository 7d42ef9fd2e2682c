use crate::protocol::{PayloadItem, SendError};
use bytes::BytesMut;
use tokio_util::codec::Encoder;

/// Writes payload chunks as a flat byte run, for bodies delimited by
/// `Content-Length` or by connection close. The declared length lives in
/// the message header; this encoder only reproduces the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEncoder {
    eof: bool,
}

impl FlatEncoder {
    pub fn new() -> Self {
        Self { eof: false }
    }

    pub fn is_finished(&self) -> bool {
        self.eof
    }
}

impl Default for FlatEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<PayloadItem> for FlatEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(bytes) => {
                if !bytes.is_empty() {
                    dst.extend_from_slice(&bytes);
                }
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                Ok(())
            }
        }
    }
}
