use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures::SinkExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::codec::{RequestEncoder, ResponseDecoder};
use crate::conn::{pull_frame, SharedPayloadSource, READ_BUFFER_SIZE};
use crate::protocol::{Body, Frame, Message, ParseError, PayloadItem, Request, Response, SendError};

/// The upstream-facing side of the gateway: a connection we opened to a
/// target server. Writes requests, reads responses.
#[derive(Debug)]
pub struct TargetConnection<R, W> {
    framed_read: Arc<Mutex<FramedRead<R, ResponseDecoder>>>,
    framed_write: FramedWrite<W, RequestEncoder>,
    read_timeout: Duration,
}

impl TargetConnection<OwnedReadHalf, OwnedWriteHalf> {
    /// Opens a TCP connection to `addr`, bounding the connect by
    /// `connect_timeout`.
    pub async fn connect(
        addr: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> io::Result<Self> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                io::Error::new(io::ErrorKind::TimedOut, format!("connect to {addr} timed out"))
            })??;
        stream.set_nodelay(true)?;

        let (reader, writer) = stream.into_split();
        Ok(Self::from_parts(reader, writer, read_timeout))
    }
}

impl<R, W> TargetConnection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send,
{
    pub fn from_parts(reader: R, writer: W, read_timeout: Duration) -> Self {
        Self {
            framed_read: Arc::new(Mutex::new(FramedRead::with_capacity(
                reader,
                ResponseDecoder::new(),
                READ_BUFFER_SIZE,
            ))),
            framed_write: FramedWrite::new(writer, RequestEncoder),
            read_timeout,
        }
    }

    /// Writes a complete request: head first, then the body in its wire
    /// framing. An unread body streams through from its own source.
    pub async fn write_request(&mut self, request: &mut Request) -> Result<(), SendError> {
        self.framed_write.send(&*request).await?;
        request.body_mut().write_to(self.framed_write.get_mut()).await?;
        self.framed_write.get_mut().flush().await.map_err(SendError::io)?;
        Ok(())
    }

    /// Reads the next response head and hands back the response with a
    /// lazy body over this connection.
    ///
    /// `head_request` flags that the request sent was HEAD, whose response
    /// carries no payload regardless of its header.
    pub async fn read_response(&mut self, head_request: bool) -> Result<Response, ParseError> {
        self.framed_read.lock().await.decoder_mut().expect_head_response(head_request);

        match pull_frame(&self.framed_read, self.read_timeout).await? {
            Some(Frame::Head((mut response, framing))) => {
                if framing.is_empty() {
                    self.drain_empty_body().await?;
                } else {
                    response.set_body(Body::streaming(
                        Box::new(SharedPayloadSource {
                            framed: self.framed_read.clone(),
                            read_timeout: self.read_timeout,
                        }),
                        framing.is_chunked(),
                    ));
                }
                Ok(response)
            }
            Some(Frame::Payload(_)) => {
                Err(ParseError::invalid_body("previous response body was not fully consumed"))
            }
            None => Err(ParseError::end_of_stream("connection closed before the response head")),
        }
    }

    pub async fn shutdown(&mut self) -> Result<(), SendError> {
        self.framed_write.get_mut().shutdown().await.map_err(SendError::io)
    }

    async fn drain_empty_body(&mut self) -> Result<(), ParseError> {
        match pull_frame(&self.framed_read, self.read_timeout).await? {
            Some(Frame::Payload(PayloadItem::Eof)) => Ok(()),
            _ => Err(ParseError::invalid_body("expected end of empty response body")),
        }
    }
}
