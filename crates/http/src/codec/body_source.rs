//! Where outgoing body bytes come from.

use std::io::Read;

use bytes::Bytes;

use crate::codec::WriteBuffer;
use crate::protocol::WriteError;

/// Supplies the body bytes the writer interleaves with its suspends.
///
/// A source either holds the whole body up front or pulls it from a reader
/// as room becomes available. Unlike head pieces, body bytes may be split at
/// any boundary, so the source fills whatever room the buffer has left.
pub enum BodySource {
    /// No body.
    Empty,
    /// The whole body, already in memory.
    Full { data: Bytes, pos: usize },
    /// A body streamed from a blocking reader.
    Reader(Box<dyn Read + Send>),
}

impl BodySource {
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        BodySource::Reader(Box::new(reader))
    }

    /// Copies body bytes into the buffer's remaining room.
    ///
    /// Returns `true` once the source is exhausted.
    pub fn fill(&mut self, buffer: &mut WriteBuffer) -> Result<bool, WriteError> {
        match self {
            BodySource::Empty => Ok(true),
            BodySource::Full { data, pos } => {
                let take = buffer.room().min(data.len() - *pos);
                buffer.put(&data[*pos..*pos + take]);
                *pos += take;
                Ok(*pos == data.len())
            }
            BodySource::Reader(reader) => {
                let mut chunk = vec![0u8; buffer.room()];
                if chunk.is_empty() {
                    return Ok(false);
                }
                let n = reader.read(&mut chunk).map_err(|source| WriteError::BodySource { source })?;
                buffer.put(&chunk[..n]);
                Ok(n == 0)
            }
        }
    }
}

impl std::fmt::Debug for BodySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodySource::Empty => f.write_str("BodySource::Empty"),
            BodySource::Full { data, pos } => {
                f.debug_struct("BodySource::Full").field("len", &data.len()).field("pos", pos).finish()
            }
            BodySource::Reader(_) => f.write_str("BodySource::Reader"),
        }
    }
}

impl From<Option<Bytes>> for BodySource {
    fn from(body: Option<Bytes>) -> Self {
        match body {
            Some(data) if !data.is_empty() => BodySource::Full { data, pos: 0 },
            _ => BodySource::Empty,
        }
    }
}
