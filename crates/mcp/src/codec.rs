// Newline framing for inbound JSON-RPC messages

use bytes::{Bytes, BytesMut};
use std::io;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder};

/// Largest accepted message, excluding the newline.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// One inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A UTF-8 line with the line ending removed.
    Message(String),
    /// A line that cannot be a message: not UTF-8, or over the length limit.
    Malformed(String),
}

/// Splits input on `\n` without ever failing the stream on bad content.
///
/// Oversized lines are skipped up to the next newline and reported once as
/// [`Frame::Malformed`]; only I/O errors end the stream.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    inner: AnyDelimiterCodec,
    max_length: usize,
}

impl MessageCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"\n".to_vec(), max_length),
            max_length,
        }
    }

    fn frame(&self, decoded: Result<Option<Bytes>, AnyDelimiterCodecError>) -> io::Result<Option<Frame>> {
        match decoded {
            Ok(Some(chunk)) => Ok(Some(to_frame(chunk))),
            Ok(None) => Ok(None),
            Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Ok(Some(Frame::Malformed(format!(
                "Message exceeds {} bytes",
                self.max_length
            )))),
            Err(AnyDelimiterCodecError::Io(e)) => Err(e),
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_BYTES)
    }
}

impl Decoder for MessageCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<Frame>> {
        let decoded = self.inner.decode(buf);
        self.frame(decoded)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<Frame>> {
        let decoded = self.inner.decode_eof(buf);
        self.frame(decoded)
    }
}

fn to_frame(chunk: Bytes) -> Frame {
    let line = chunk.strip_suffix(b"\r").unwrap_or(&chunk[..]);
    match std::str::from_utf8(line) {
        Ok(text) => Frame::Message(text.to_string()),
        Err(e) => Frame::Malformed(format!("Message is not valid UTF-8: {}", e)),
    }
}
