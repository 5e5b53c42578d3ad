//! Streaming message decoder.
//!
//! This is the [`Decoder`] the connection adapters mount on a
//! [`tokio_util::codec::FramedRead`]. It drives the scanner and reducer over
//! the read buffer as deliveries arrive, hands out a [`Frame::Head`] once the
//! message head reduces, then switches to the body extractor until the
//! declared length is consumed.
//!
//! # State machine
//!
//! The decoder's phase is the `body` field:
//! - `None`: scanning and reducing a message head
//! - `Some(BodyDecoder)`: splitting off body chunks
//!
//! Head bytes stay in the buffer until the whole head has reduced; the
//! scanner's offsets point into the buffer, so the buffer must only grow at
//! the end while a head is in flight. Once the head is done its bytes are
//! discarded and the scanner rewinds for the next message on the connection.

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, trace};

use crate::codec::body_decoder::BodyDecoder;
use crate::codec::{Reducer, Scanner, Token};
use crate::protocol::{BodyItem, Frame, Message, ParseError};

/// Largest message head, in bytes, the decoder accepts.
pub const MAX_HEAD_SIZE: usize = 8 * 1024;

/// Decodes a byte stream into [`Frame`]s.
#[derive(Debug)]
pub struct MessageDecoder {
    scanner: Scanner,
    reducer: Reducer,
    body: Option<BodyDecoder>,
    max_head_size: usize,
}

impl MessageDecoder {
    /// A decoder for an unencrypted transport.
    pub fn new() -> Self {
        Self::with_encryption(false)
    }

    /// A decoder that derives `https` origins, for an encrypted transport.
    pub fn with_encryption(encrypted: bool) -> Self {
        Self {
            scanner: Scanner::new(),
            reducer: Reducer::new(encrypted),
            body: None,
            max_head_size: MAX_HEAD_SIZE,
        }
    }

    /// Rolls scanner, reducer and body extraction back to the start of a
    /// message. The read buffer is the caller's to discard.
    pub fn reset(&mut self) {
        self.scanner.reset();
        self.reducer.reset();
        self.body = None;
    }

    /// True when no message is in flight.
    pub fn is_idle(&self) -> bool {
        self.scanner.is_initial() && self.reducer.is_idle() && self.body.is_none()
    }

    fn decode_head(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, ParseError> {
        loop {
            let token = match self.scanner.next_token(src) {
                Ok(Some(token)) => token,
                Ok(None) => {
                    if src.len() > self.max_head_size {
                        self.reset();
                        return Err(ParseError::TooLargeHeader { max_size: self.max_head_size });
                    }
                    return Ok(None);
                }
                Err(e) => {
                    self.reducer.reset();
                    return Err(e);
                }
            };
            trace!(token = token.kind(), "scanned");

            if let Some((message, length)) = self.push_token(token)? {
                // the head has reduced: drop its bytes and rewind the scanner
                let _ = src.split_to(self.scanner.bytes_scanned());
                self.scanner.reset();
                self.body = Some(BodyDecoder::new(length));
                debug!(body_length = length, "decoded message head");
                return Ok(Some(Frame::Head(message)));
            }
        }
    }

    fn push_token(&mut self, token: Token) -> Result<Option<(Message, u64)>, ParseError> {
        match self.reducer.push(token) {
            Ok(done) => Ok(done),
            Err(e) => {
                self.scanner.reset();
                Err(e)
            }
        }
    }
}

impl Default for MessageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageDecoder {
    type Item = Frame;
    type Error = ParseError;

    /// Decodes the next frame from the buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Frame::Head(_)))`: a message head fully reduced
    /// - `Ok(Some(Frame::Body(_)))`: a body chunk or the end-of-body marker
    /// - `Ok(None)`: more input needed
    /// - `Err(_)`: a parse error; the decoder has reset itself
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(body) = &mut self.body {
            let frame = match body.decode(src) {
                Some(item @ BodyItem::Chunk(_)) => Some(Frame::Body(item)),
                Some(item @ BodyItem::End) => {
                    self.body.take();
                    Some(Frame::Body(item))
                }
                None => None,
            };
            return Ok(frame);
        }

        self.decode_head(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(body) = &mut self.body {
            let frame = match body.decode_eof(src)? {
                Some(item @ BodyItem::End) => {
                    self.body.take();
                    Some(Frame::Body(item))
                }
                Some(item) => Some(Frame::Body(item)),
                None => None,
            };
            return Ok(frame);
        }

        match self.decode_head(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() && self.is_idle() => Ok(None),
            None => {
                self.reset();
                Err(ParseError::TruncatedMessage)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Status;
    use bytes::Bytes;

    fn drain(decoder: &mut MessageDecoder, buf: &mut BytesMut) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = decoder.decode(buf).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn head_then_empty_body_markers() {
        let mut decoder = MessageDecoder::new();
        let mut buf = BytesMut::from(&b"GET /index HTTP/1.1\r\nHost: example.com\r\n\r\n"[..]);

        let frames = drain(&mut decoder, &mut buf);
        assert_eq!(frames.len(), 2);
        let request = frames[0].clone().into_message().unwrap().into_request().unwrap();
        assert_eq!(request.path(), "/index");
        assert_eq!(frames[1], Frame::Body(BodyItem::End));
        assert!(decoder.is_idle());
        assert!(buf.is_empty());
    }

    #[test]
    fn body_split_across_deliveries_then_pipelined_request() {
        let mut decoder = MessageDecoder::new();
        let mut buf =
            BytesMut::from(&b"POST /u HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel"[..]);

        let frames = drain(&mut decoder, &mut buf);
        assert!(frames[0].is_head());
        assert_eq!(frames[1], Frame::Body(BodyItem::Chunk(Bytes::from_static(b"hel"))));
        assert_eq!(frames.len(), 2);

        // remaining body bytes arrive together with a pipelined request
        buf.extend_from_slice(b"loGET /next HTTP/1.1\r\n\r\n");
        let frames = drain(&mut decoder, &mut buf);
        assert_eq!(frames[0], Frame::Body(BodyItem::Chunk(Bytes::from_static(b"lo"))));
        assert_eq!(frames[1], Frame::Body(BodyItem::End));
        let request = frames[2].clone().into_message().unwrap().into_request().unwrap();
        assert_eq!(request.path(), "/next");
        assert_eq!(frames[3], Frame::Body(BodyItem::End));
    }

    #[test]
    fn chunk_boundaries_do_not_change_the_outcome() {
        let text = b"PUT /x?k=v HTTP/1.1\r\nHost: h\r\nContent-Length: 3\r\n\r\nabc";

        // whole message at once
        let mut decoder = MessageDecoder::new();
        let mut buf = BytesMut::from(&text[..]);
        let whole = drain(&mut decoder, &mut buf);

        // one byte per delivery
        let mut decoder = MessageDecoder::new();
        let mut buf = BytesMut::new();
        let mut dribbled = Vec::new();
        for &byte in text.iter() {
            buf.extend_from_slice(&[byte]);
            dribbled.extend(drain(&mut decoder, &mut buf));
        }

        // body chunking differs, heads and reassembled bodies must not
        let head = |frames: &[Frame]| frames[0].clone().into_message().unwrap();
        assert_eq!(head(&whole), head(&dribbled));
        let body = |frames: &[Frame]| {
            frames
                .iter()
                .filter_map(|f| match f {
                    Frame::Body(BodyItem::Chunk(b)) => Some(b.to_vec()),
                    _ => None,
                })
                .flatten()
                .collect::<Vec<u8>>()
        };
        assert_eq!(body(&whole), body(&dribbled));
        assert_eq!(body(&whole), b"abc");
    }

    #[test]
    fn decodes_a_response() {
        let mut decoder = MessageDecoder::new();
        let mut buf =
            BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok"[..]);

        let frames = drain(&mut decoder, &mut buf);
        let response = match frames[0].clone().into_message().unwrap() {
            Message::Response(response) => response,
            Message::Request(_) => panic!("expected a response"),
        };
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(frames[1], Frame::Body(BodyItem::Chunk(Bytes::from_static(b"ok"))));
        assert_eq!(frames[2], Frame::Body(BodyItem::End));
    }

    #[test]
    fn recovers_after_a_parse_error() {
        let mut decoder = MessageDecoder::new();
        let mut buf = BytesMut::from(&b"HTTP/1.1 204 Wrong Phrase\r\n\r\n"[..]);
        let err = decoder.decode(&mut buf).unwrap_err();
        assert!(err.is_grammar_error());
        assert!(decoder.is_idle());

        // a fresh, well-formed message on the same decoder parses cleanly
        let mut buf = BytesMut::from(&b"HTTP/1.1 204 No Content\r\n\r\n"[..]);
        let frames = drain(&mut decoder, &mut buf);
        assert!(frames[0].is_head());
        assert_eq!(frames[1], Frame::Body(BodyItem::End));
    }

    #[test]
    fn oversized_head_is_rejected() {
        let mut decoder = MessageDecoder::new();
        let mut head = b"GET / HTTP/1.1\r\nX-Fill: ".to_vec();
        head.extend(std::iter::repeat_n(b'a', MAX_HEAD_SIZE));
        let mut buf = BytesMut::from(&head[..]);
        let err = decoder.decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::TooLargeHeader { .. }));
    }

    #[test]
    fn eof_mid_head_is_truncation() {
        let mut decoder = MessageDecoder::new();
        let mut buf = BytesMut::from(&b"GET /inde"[..]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        let err = decoder.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedMessage));
    }

    #[test]
    fn eof_at_the_end_of_a_body_completes_it() {
        let mut decoder = MessageDecoder::new();
        let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc"[..]);
        let head = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(head.is_head());

        // the stream ends with exactly the declared bytes left in the buffer
        let chunk = decoder.decode_eof(&mut buf).unwrap();
        assert_eq!(chunk, Some(Frame::Body(BodyItem::Chunk(Bytes::from_static(b"abc")))));
        let end = decoder.decode_eof(&mut buf).unwrap();
        assert_eq!(end, Some(Frame::Body(BodyItem::End)));
        assert_eq!(decoder.decode_eof(&mut buf).unwrap(), None);
        assert!(decoder.is_idle());
    }

    #[test]
    fn eof_mid_body_is_truncation() {
        let mut decoder = MessageDecoder::new();
        let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 9\r\n\r\nabc"[..]);
        let frames = drain(&mut decoder, &mut buf);
        assert_eq!(frames.len(), 2);
        let err = decoder.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedBody { remaining: 6 }));
    }
}
