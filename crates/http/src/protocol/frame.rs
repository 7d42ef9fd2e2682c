use bytes::Bytes;

/// One decoded unit of an HTTP/1.x stream.
///
/// The two-phase decoders emit exactly one `Head` per message, followed by
/// zero or more `Payload` items, the last of which is always
/// [`PayloadItem::Eof`]. The generic parameter `H` is the head type
/// (request or response).
#[derive(Debug)]
pub enum Frame<H> {
    /// The start line and header block of a message
    Head(H),
    /// A piece of the message body, or the end-of-body marker
    Payload(PayloadItem),
}

/// An item in a message payload stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    /// A chunk of decoded payload data
    Chunk(Bytes),
    /// Marks the end of the payload stream
    Eof,
}

/// How a message body is delimited on the wire.
///
/// Selected from the header block when a head is decoded, and used to pick
/// the payload decoder and the re-encoding strategy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyFraming {
    /// No body follows the head
    Empty,
    /// Exactly this many bytes follow
    Length(u64),
    /// Chunked transfer encoding
    Chunked,
    /// The body runs until the peer closes the connection
    CloseDelimited,
}

impl<H> Frame<H> {
    #[inline]
    pub fn is_head(&self) -> bool {
        matches!(self, Frame::Head(_))
    }

    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Frame::Payload(_))
    }

    /// Converts the frame into its payload item, or `None` for a head frame.
    pub fn into_payload_item(self) -> Option<PayloadItem> {
        match self {
            Frame::Head(_) => None,
            Frame::Payload(item) => Some(item),
        }
    }
}

impl PayloadItem {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }

    /// Returns a reference to the contained bytes if this is a `Chunk`.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    /// Consumes the item and returns the contained bytes if this is a `Chunk`.
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

impl BodyFraming {
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, BodyFraming::Chunked)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, BodyFraming::Empty)
    }
}
