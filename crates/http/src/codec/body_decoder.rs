//! Content-Length body extraction.
//!
//! Body bytes are not scanned; they are split off the read buffer in whole
//! spans, at most the declared length, and handed out as zero-copy chunks.
//! Once the declared length is consumed a single end-of-body marker follows,
//! even for a zero-length body.

use bytes::BytesMut;
use tracing::trace;

use crate::protocol::{BodyItem, ParseError};

/// Extracts one message body of a known length from the read buffer.
#[derive(Debug)]
pub struct BodyDecoder {
    remaining: u64,
}

impl BodyDecoder {
    pub fn new(length: u64) -> Self {
        Self { remaining: length }
    }

    /// Body bytes still owed by the stream.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Splits the next body item off the buffer.
    ///
    /// Returns `None` when the buffer is empty but bytes are still owed; the
    /// end marker is returned exactly once, after the last chunk.
    pub fn decode(&mut self, src: &mut BytesMut) -> Option<BodyItem> {
        if self.remaining == 0 {
            return Some(BodyItem::End);
        }
        if src.is_empty() {
            return None;
        }
        let take = usize::try_from(self.remaining).unwrap_or(usize::MAX).min(src.len());
        self.remaining -= take as u64;
        trace!(take, remaining = self.remaining, "body chunk");
        Some(BodyItem::Chunk(src.split_to(take).freeze()))
    }

    /// Like `decode`, but the stream has ended: owed bytes are an error.
    pub fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<BodyItem>, ParseError> {
        match self.decode(src) {
            Some(item) => Ok(Some(item)),
            None => Err(ParseError::TruncatedBody { remaining: self.remaining }),
        }
    }
}
