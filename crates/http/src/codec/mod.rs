//! Streaming codec for HTTP/1.x messages.
//!
//! The read side turns a byte stream into [`Frame`](crate::protocol::Frame)s
//! through three cooperating layers, each resumable at any byte boundary:
//!
//! - [`Cursor`]: a read position plus a token mark over the read buffer
//! - [`Scanner`]: the byte-by-byte lexer, one token per call
//! - [`Reducer`]: folds tokens into a typed message head
//! - [`BodyDecoder`]: splits off Content-Length framed body chunks
//! - [`MessageDecoder`]: the [`tokio_util::codec::Decoder`] tying them
//!   together for a [`FramedRead`](tokio_util::codec::FramedRead)
//!
//! The write side mirrors it with bounded memory:
//!
//! - [`WriteBuffer`]: a capacity-bounded staging buffer
//! - [`BodySource`]: where outgoing body bytes come from
//! - [`MessageWriter`]: serializes piece by piece, suspending whenever the
//!   next piece does not fit
//!
//! # Example
//!
//! ```no_run
//! use wire_http::codec::MessageDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = MessageDecoder::new();
//! let mut buffer = BytesMut::new();
//! // ... read bytes into the buffer ...
//! let frame = decoder.decode(&mut buffer);
//! ```

mod cursor;
pub use cursor::Cursor;

mod token;
pub use token::Token;

mod scanner;
pub use scanner::Scanner;

mod reducer;
pub use reducer::Reducer;

mod body_decoder;
pub use body_decoder::BodyDecoder;

mod message_decoder;
pub use message_decoder::MessageDecoder;
pub use message_decoder::MAX_HEAD_SIZE;

mod write_buffer;
pub use write_buffer::WriteBuffer;

mod body_source;
pub use body_source::BodySource;

mod message_writer;
pub use message_writer::MessageWriter;
pub use message_writer::WriteOutcome;
pub use message_writer::WRITE_BUFFER_SIZE;
