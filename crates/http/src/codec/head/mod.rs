//! Message head parsing and serialization.
//!
//! A head is everything up to and including the blank line: the start line
//! plus the header fields. Decoding buffers until the `\r\n\r\n` terminator
//! is seen (bounded by [`MAX_HEAD_BYTES`]), then parses in one pass.
//!
//! Field-line parsing is deliberately lenient: a line without a colon, or
//! with an empty name, is skipped with a warning instead of failing the
//! message. A proxy that rejected every request carrying one odd header
//! would be unusable in front of real-world clients. The start line gets
//! no such leniency; without it there is no message.

mod request_decoder;
pub use request_decoder::RequestHeadDecoder;

mod request_encoder;
pub use request_encoder::RequestEncoder;

mod response_decoder;
pub use response_decoder::ResponseHeadDecoder;

mod response_encoder;
pub use response_encoder::ResponseEncoder;

use bytes::BytesMut;
use tracing::warn;

use crate::ensure;
use crate::protocol::{Header, ParseError};

/// Maximum size in bytes allowed for an entire message head.
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Maximum number of header field lines allowed in one head.
pub const MAX_FIELD_NUM: usize = 128;

/// Initial buffer size reserved when serializing a head.
const INIT_HEAD_SIZE: usize = 4 * 1024;

/// Locates the end of the head (the byte after `\r\n\r\n`), or reports that
/// more input is needed. Enforces the head size cap in both cases.
fn find_head_end(src: &BytesMut) -> Result<Option<usize>, ParseError> {
    match src.as_ref().windows(4).position(|w| w == b"\r\n\r\n") {
        Some(idx) => {
            let end = idx + 4;
            ensure!(end <= MAX_HEAD_BYTES, ParseError::too_large_head(end, MAX_HEAD_BYTES));
            Ok(Some(end))
        }
        None => {
            ensure!(src.len() <= MAX_HEAD_BYTES, ParseError::too_large_head(src.len(), MAX_HEAD_BYTES));
            Ok(None)
        }
    }
}

/// Parses the field lines of a head (everything after the start line).
///
/// Malformed lines are logged and skipped, not fatal. Leading whitespace in
/// a value and trailing whitespace around name and value are trimmed.
fn parse_field_lines(src: &[u8]) -> Result<Header, ParseError> {
    let mut header = Header::new();

    for line in src.split(|b| *b == b'\n') {
        let line = trim_cr(line);
        if line.is_empty() {
            continue;
        }
        ensure!(header.len() < MAX_FIELD_NUM, ParseError::too_many_fields(MAX_FIELD_NUM));

        let text = String::from_utf8_lossy(line);
        match text.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                header.add(name.trim(), value.trim());
            }
            _ => {
                warn!(line = %text, "skipping malformed header field line");
            }
        }
    }

    Ok(header)
}

fn trim_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

/// Infallible `io::Write` over a `BytesMut`, so start lines can be built
/// with `write!` without an intermediate `String`.
struct FastWrite<'a>(&'a mut BytesMut);

impl std::io::Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Splits a head into the start line and the field-line block.
fn split_start_line(head: &[u8]) -> Result<(&str, &[u8]), ParseError> {
    let line_end = head
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or_else(|| ParseError::invalid_start_line("missing line terminator"))?;

    let start_line = std::str::from_utf8(&head[..line_end])
        .map_err(|_| ParseError::invalid_start_line("start line is not valid UTF-8"))?;

    Ok((start_line, &head[line_end + 2..]))
}
