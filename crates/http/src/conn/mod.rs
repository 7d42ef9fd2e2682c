//! Connection wrappers over framed streams.
//!
//! A gateway terminates two connections per exchange: the source side (a
//! client talking to us, [`SourceConnection`]) and the target side (us
//! talking to an upstream server, [`TargetConnection`]). Both wrap a
//! [`FramedRead`] with the matching decoder and a [`FramedWrite`] with the
//! matching head encoder, and hand out lazy bodies backed by the shared
//! read half.
//!
//! The read half lives behind `Arc<Mutex<..>>` because a decoded message
//! and its unread [`Body`](crate::protocol::Body) both need it: the body
//! pulls payload frames from the same stream the next head will come from.
//! Exchanges on one connection are processed strictly in sequence, so the
//! lock is never contended, it only ties the two owners together.
//!
//! Every frame pull runs under the connection's read timeout. A firing
//! timeout is fatal to the message in flight; callers close the connection.

mod source;
pub use source::SourceConnection;

mod target;
pub use target::TargetConnection;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::Mutex;
use tokio_util::codec::{Decoder, FramedRead};

use crate::protocol::{Frame, ParseError, PayloadItem, PayloadSource};

/// Buffer capacity for framed reads.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Pulls the next frame, bounding the wait by `read_timeout`.
async fn pull_frame<S, D, H>(
    framed: &Mutex<FramedRead<S, D>>,
    read_timeout: Duration,
) -> Result<Option<Frame<H>>, ParseError>
where
    S: AsyncRead + Unpin,
    D: Decoder<Item = Frame<H>, Error = ParseError>,
{
    let mut framed = framed.lock().await;
    match tokio::time::timeout(read_timeout, framed.next()).await {
        Ok(Some(Ok(frame))) => Ok(Some(frame)),
        Ok(Some(Err(e))) => Err(e),
        Ok(None) => Ok(None),
        Err(_) => Err(ParseError::Timeout(read_timeout)),
    }
}

/// A [`PayloadSource`] over the connection's shared read half.
///
/// Yields payload items until `Eof`. A head frame here means the previous
/// body was not drained before the next message was read, which the
/// connection wrappers rule out; it is reported as a body error rather
/// than silently resynchronized.
struct SharedPayloadSource<S, D> {
    framed: Arc<Mutex<FramedRead<S, D>>>,
    read_timeout: Duration,
}

#[async_trait]
impl<S, D, H> PayloadSource for SharedPayloadSource<S, D>
where
    S: AsyncRead + Unpin + Send,
    D: Decoder<Item = Frame<H>, Error = ParseError> + Send,
    H: Send,
{
    async fn next_item(&mut self) -> Result<PayloadItem, ParseError> {
        match pull_frame(&self.framed, self.read_timeout).await? {
            Some(Frame::Payload(item)) => Ok(item),
            Some(Frame::Head(_)) => {
                Err(ParseError::invalid_body("received a message head while reading a body"))
            }
            None => Err(ParseError::end_of_stream("connection closed while reading a body")),
        }
    }
}
