//! Suspend/resume message writer.
//!
//! The writer serializes one message into a bounded [`WriteBuffer`] piece by
//! piece. Head pieces (start line parts, one header line each, the blank
//! line) are atomic: a piece is only appended when the buffer has room for
//! all of it, otherwise the writer suspends so the owner can drain the
//! buffer to the transport and resume. Body bytes are not atomic and fill
//! whatever room remains.
//!
//! The writer owns its staging buffer; connection adapters call
//! [`MessageWriter::resume`] and flush [`MessageWriter::pending`] until the
//! outcome is [`WriteOutcome::Complete`]. A write error leaves the writer's
//! position unspecified; it must be discarded.

use std::collections::VecDeque;

use bytes::Bytes;
use tracing::trace;

use crate::codec::{BodySource, WriteBuffer};
use crate::protocol::{Message, WriteError, CONTENT_LENGTH};
use crate::utils::ensure;

/// Default staging buffer size.
pub const WRITE_BUFFER_SIZE: usize = 8 * 1024;

/// What a resume step ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The whole message has been staged; the writer is idle again.
    Complete,
    /// The buffer is out of room; drain [`MessageWriter::pending`] and
    /// resume.
    Suspended,
}

#[derive(Debug, Default)]
enum WriterState {
    #[default]
    Idle,
    Head { pieces: VecDeque<Bytes>, source: BodySource, length: u64 },
    Body { source: BodySource, written: u64, length: u64 },
}

/// Serializes messages with bounded memory.
#[derive(Debug)]
pub struct MessageWriter {
    state: WriterState,
    buffer: WriteBuffer,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::with_capacity(WRITE_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { state: WriterState::Idle, buffer: WriteBuffer::with_capacity(capacity) }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, WriterState::Idle)
    }

    /// Begins writing a message whose body, if any, is attached to it.
    pub fn start(&mut self, message: Message) -> Result<(), WriteError> {
        let length = message.body().map(Bytes::len).unwrap_or(0) as u64;
        let source = BodySource::from(message.body().cloned());
        self.start_streaming(&message, source, length)
    }

    /// Begins writing a message head followed by a streamed body.
    ///
    /// `length` is the `Content-Length` that frames the body; the source
    /// must yield exactly that many bytes. A source that ends short of the
    /// declared length, or runs past it, fails the write.
    pub fn start_streaming(
        &mut self,
        message: &Message,
        source: BodySource,
        length: u64,
    ) -> Result<(), WriteError> {
        ensure!(self.is_idle(), WriteError::invalid_message("previous message still in flight"));

        let pieces = self.serialize_head(message, length)?;
        trace!(pieces = pieces.len(), body_length = length, "writer started");
        self.state = WriterState::Head { pieces, source, length };
        Ok(())
    }

    /// Stages as much of the message as the buffer holds.
    pub fn resume(&mut self) -> Result<WriteOutcome, WriteError> {
        loop {
            match &mut self.state {
                WriterState::Idle => return Ok(WriteOutcome::Complete),

                WriterState::Head { pieces, source, length } => {
                    while let Some(piece) = pieces.front() {
                        if !self.buffer.has_room(piece.len()) {
                            return Ok(WriteOutcome::Suspended);
                        }
                        self.buffer.put(piece);
                        pieces.pop_front();
                    }
                    let source = std::mem::replace(source, BodySource::Empty);
                    let length = *length;
                    self.state = WriterState::Body { source, written: 0, length };
                }

                WriterState::Body { source, written, length } => {
                    let room_before = self.buffer.room();
                    let done = source.fill(&mut self.buffer)?;
                    *written += (room_before - self.buffer.room()) as u64;
                    ensure!(
                        *written <= *length,
                        WriteError::invalid_message(format!(
                            "body source ran past the declared {length} bytes"
                        ))
                    );
                    if done {
                        ensure!(
                            *written == *length,
                            WriteError::invalid_message(format!(
                                "body source ended at {written} of {length} declared bytes"
                            ))
                        );
                        self.state = WriterState::Idle;
                        return Ok(WriteOutcome::Complete);
                    }
                    if self.buffer.room() == 0 {
                        return Ok(WriteOutcome::Suspended);
                    }
                }
            }
        }
    }

    /// Drains the staged bytes for the transport.
    pub fn pending(&mut self) -> Bytes {
        self.buffer.take()
    }

    fn serialize_head(&self, message: &Message, length: u64) -> Result<VecDeque<Bytes>, WriteError> {
        let mut pieces = VecDeque::new();

        match message {
            Message::Request(request) => {
                pieces.push_back(Bytes::from(format!("{} ", request.method())));
                pieces.push_back(Bytes::from(request.path().to_owned()));
                if let Some(query) = request.query() {
                    let encoded = serde_urlencoded::to_string(query)
                        .map_err(WriteError::invalid_message)?;
                    pieces.push_back(Bytes::from(format!("?{encoded}")));
                }
                pieces.push_back(Bytes::from(format!(" {}\r\n", request.version())));
            }
            Message::Response(response) => {
                pieces.push_back(Bytes::from(format!(
                    "{} {}\r\n",
                    response.version(),
                    response.status()
                )));
            }
        }

        let mut length_written = false;
        for (name, value) in message.headers().iter() {
            if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
                match value.as_int() {
                    Some(declared) if declared == length => length_written = true,
                    _ => {
                        return Err(WriteError::invalid_message(format!(
                            "content-length {value} does not match the {length} byte body"
                        )));
                    }
                }
            }
            pieces.push_back(Bytes::from(format!("{name}: {value}\r\n")));
        }
        if length > 0 && !length_written {
            pieces.push_back(Bytes::from(format!("{}: {length}\r\n", CONTENT_LENGTH)));
        }
        pieces.push_back(Bytes::from_static(b"\r\n"));

        // a piece larger than the whole buffer could never be staged
        if let Some(piece) = pieces.iter().find(|p| p.len() > self.buffer.capacity()) {
            return Err(WriteError::invalid_message(format!(
                "head piece of {} bytes exceeds the {} byte write buffer",
                piece.len(),
                self.buffer.capacity()
            )));
        }

        Ok(pieces)
    }
}

impl Default for MessageWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Request, Response, Status};

    fn write_all(writer: &mut MessageWriter) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let outcome = writer.resume().unwrap();
            out.extend_from_slice(&writer.pending());
            if outcome == WriteOutcome::Complete {
                return out;
            }
        }
    }

    #[test]
    fn writes_a_request_head_and_body() {
        let request = Request::builder()
            .method("POST")
            .path("/submit")
            .query(vec![("a".into(), "1".into())])
            .header("Host", "example.com")
            .body("hello")
            .build();

        let mut writer = MessageWriter::new();
        writer.start(request.into()).unwrap();
        let out = write_all(&mut writer);
        assert_eq!(
            out,
            b"POST /submit?a=1 HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello"
        );
        assert!(writer.is_idle());
    }

    #[test]
    fn writes_a_response_with_the_canonical_phrase() {
        let response = Response::builder().status(Status::NoContent).build();
        let mut writer = MessageWriter::new();
        writer.start(response.into()).unwrap();
        assert_eq!(write_all(&mut writer), b"HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[test]
    fn suspends_when_a_piece_does_not_fit() {
        let response = Response::builder()
            .status(Status::Ok)
            .header("Server", "wire")
            .body("0123456789")
            .build();

        let mut writer = MessageWriter::with_capacity(24);
        writer.start(response.into()).unwrap();

        // the first suspend happens before the head is fully staged
        assert_eq!(writer.resume().unwrap(), WriteOutcome::Suspended);
        let first = writer.pending();
        assert!(first.len() <= 24);
        assert!(first.starts_with(b"HTTP/1.1 200 OK\r\n"));

        let mut out = first.to_vec();
        loop {
            let outcome = writer.resume().unwrap();
            out.extend_from_slice(&writer.pending());
            if outcome == WriteOutcome::Complete {
                break;
            }
        }
        assert_eq!(
            out,
            b"HTTP/1.1 200 OK\r\nServer: wire\r\nContent-Length: 10\r\n\r\n0123456789"
        );
    }

    #[test]
    fn rejects_a_mismatched_content_length() {
        let request = Request::builder().header(CONTENT_LENGTH, 3u64).body("hello").build();
        let mut writer = MessageWriter::new();
        let err = writer.start(request.into()).unwrap_err();
        assert!(matches!(err, WriteError::InvalidMessage { .. }));
    }

    #[test]
    fn rejects_a_second_start_while_busy() {
        let mut writer = MessageWriter::with_capacity(32);
        writer.start(Response::builder().build().into()).unwrap();
        let err = writer.start(Response::builder().build().into()).unwrap_err();
        assert!(matches!(err, WriteError::InvalidMessage { .. }));
    }

    #[test]
    fn declared_content_length_is_kept_in_place() {
        let request = Request::builder()
            .header(CONTENT_LENGTH, 5u64)
            .header("Accept", "text/plain")
            .body("hello")
            .build();
        let mut writer = MessageWriter::new();
        writer.start(request.into()).unwrap();
        let out = write_all(&mut writer);
        assert_eq!(
            out,
            b"GET / HTTP/1.1\r\nContent-Length: 5\r\nAccept: text/plain\r\n\r\nhello"
        );
    }

    fn drive_to_error(writer: &mut MessageWriter) -> WriteError {
        loop {
            match writer.resume() {
                Ok(WriteOutcome::Complete) => panic!("expected a write error"),
                Ok(WriteOutcome::Suspended) => {
                    let _ = writer.pending();
                }
                Err(e) => return e,
            }
        }
    }

    #[test]
    fn rejects_a_reader_that_ends_short_of_the_declared_length() {
        let request = Request::builder().method("PUT").path("/f").build();
        let mut writer = MessageWriter::new();
        let source = BodySource::reader(std::io::Cursor::new(b"abc".to_vec()));
        writer.start_streaming(&request.into(), source, 5).unwrap();
        let err = drive_to_error(&mut writer);
        assert!(matches!(err, WriteError::InvalidMessage { .. }));
    }

    #[test]
    fn rejects_a_reader_that_runs_past_the_declared_length() {
        let request = Request::builder().method("PUT").path("/f").build();
        let mut writer = MessageWriter::new();
        let source = BodySource::reader(std::io::Cursor::new(b"toolong".to_vec()));
        writer.start_streaming(&request.into(), source, 5).unwrap();
        let err = drive_to_error(&mut writer);
        assert!(matches!(err, WriteError::InvalidMessage { .. }));
    }

    #[test]
    fn streams_a_reader_body() {
        let request = Request::builder().method("PUT").path("/f").build();
        let mut writer = MessageWriter::with_capacity(32);
        let source = BodySource::reader(std::io::Cursor::new(b"stream me".to_vec()));
        writer.start_streaming(&request.into(), source, 9).unwrap();
        let out = write_all(&mut writer);
        assert_eq!(out, b"PUT /f HTTP/1.1\r\nContent-Length: 9\r\n\r\nstream me");
    }
}
