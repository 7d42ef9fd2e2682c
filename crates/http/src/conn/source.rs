use std::sync::Arc;
use std::time::Duration;

use futures::SinkExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::conn::{pull_frame, SharedPayloadSource, READ_BUFFER_SIZE};
use crate::protocol::{Body, Frame, Message, ParseError, PayloadItem, Request, Response, SendError};

/// The server-facing side of the gateway: a connection some client opened
/// to us. Reads requests, writes responses.
#[derive(Debug)]
pub struct SourceConnection<R, W> {
    framed_read: Arc<Mutex<FramedRead<R, RequestDecoder>>>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    read_timeout: Duration,
}

impl SourceConnection<OwnedReadHalf, OwnedWriteHalf> {
    pub fn new(stream: TcpStream, read_timeout: Duration) -> Self {
        let (reader, writer) = stream.into_split();
        Self::from_parts(reader, writer, read_timeout)
    }
}

impl<R, W> SourceConnection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send,
{
    pub fn from_parts(reader: R, writer: W, read_timeout: Duration) -> Self {
        Self {
            framed_read: Arc::new(Mutex::new(FramedRead::with_capacity(
                reader,
                RequestDecoder::new(),
                READ_BUFFER_SIZE,
            ))),
            framed_write: FramedWrite::new(writer, ResponseEncoder),
            read_timeout,
        }
    }

    /// Reads the next request head and hands back the request with a lazy
    /// body over this connection.
    ///
    /// `Ok(None)` means the client closed the connection cleanly between
    /// requests. The caller must consume or discard the body before the
    /// next call, since body and head share one stream.
    pub async fn read_request(&mut self) -> Result<Option<Request>, ParseError> {
        match pull_frame(&self.framed_read, self.read_timeout).await? {
            None => Ok(None),
            Some(Frame::Head((mut request, framing))) => {
                if framing.is_empty() {
                    self.drain_empty_body().await?;
                } else {
                    request.set_body(Body::streaming(
                        Box::new(SharedPayloadSource {
                            framed: self.framed_read.clone(),
                            read_timeout: self.read_timeout,
                        }),
                        framing.is_chunked(),
                    ));
                }
                Ok(Some(request))
            }
            Some(Frame::Payload(_)) => {
                Err(ParseError::invalid_body("previous request body was not fully consumed"))
            }
        }
    }

    /// Writes a complete response: head first, then the body in its wire
    /// framing. An unread body streams through chunk by chunk.
    pub async fn write_response(&mut self, response: &mut Response) -> Result<(), SendError> {
        self.framed_write.send(&*response).await?;
        response.body_mut().write_to(self.framed_write.get_mut()).await?;
        self.framed_write.get_mut().flush().await.map_err(SendError::io)?;
        Ok(())
    }

    /// Sends the interim `100 Continue` line for a request that carries
    /// `Expect: 100-continue`, without disturbing decoder state.
    pub async fn send_continue(&mut self) -> Result<(), SendError> {
        let writer = self.framed_write.get_mut();
        writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.map_err(SendError::io)?;
        writer.flush().await.map_err(SendError::io)?;
        debug!("sent 100 continue interim response");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), SendError> {
        self.framed_write.get_mut().shutdown().await.map_err(SendError::io)
    }

    /// Bodiless messages still produce one `Eof` payload frame; pull it so
    /// the decoder is ready for the next head.
    async fn drain_empty_body(&mut self) -> Result<(), ParseError> {
        match pull_frame(&self.framed_read, self.read_timeout).await? {
            Some(Frame::Payload(PayloadItem::Eof)) => Ok(()),
            _ => Err(ParseError::invalid_body("expected end of empty request body")),
        }
    }
}
