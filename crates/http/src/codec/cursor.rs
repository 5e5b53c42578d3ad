//! Resumable byte cursor used by the scanner.
//!
//! The cursor is a view over the connection's read buffer plus two offsets:
//! the scan position and a mark at the start of the token being recognized.
//! The offsets live in the scanner between calls, so a token that was cut off
//! by the end of one delivery continues seamlessly once the buffer has grown;
//! the buffer owner must keep already-seen bytes in place until the scanner
//! reports how much it consumed.

/// A cursor over one contiguous buffer, carrying the scan state as plain data.
#[derive(Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    mark: usize,
}

impl<'a> Cursor<'a> {
    /// Resumes scanning `buf` at previously saved offsets.
    pub fn resume(buf: &'a [u8], pos: usize, mark: usize) -> Self {
        Self { buf, pos, mark }
    }

    /// The byte under the cursor, `None` when the buffer is exhausted.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Advances past the current byte.
    #[inline]
    pub fn bump(&mut self) {
        self.pos += 1;
    }

    /// Steps back over already-consumed bytes, e.g. to re-lex a CRLF after a
    /// failed folding probe.
    #[inline]
    pub fn back(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    /// Marks the current position as the start of the next token.
    #[inline]
    pub fn mark(&mut self) {
        self.mark = self.pos;
    }

    /// The bytes between the mark and the current position.
    pub fn span(&self) -> &'a [u8] {
        &self.buf[self.mark..self.pos]
    }

    /// Extracts the marked span as text.
    pub fn take_str(&self) -> String {
        String::from_utf8_lossy(self.span()).into_owned()
    }

    /// Extracts the marked span as an unsigned integer.
    pub fn take_u64(&self) -> Option<u64> {
        std::str::from_utf8(self.span()).ok()?.parse().ok()
    }

    /// Extracts the marked span as a decimal number.
    pub fn take_f64(&self) -> Option<f64> {
        std::str::from_utf8(self.span()).ok()?.parse().ok()
    }

    /// Hands the offsets back to the owner for the next resume.
    pub fn offsets(&self) -> (usize, usize) {
        (self.pos, self.mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_and_extract() {
        let mut cursor = Cursor::resume(b"GET /", 0, 0);
        cursor.mark();
        cursor.bump();
        cursor.bump();
        cursor.bump();
        assert_eq!(cursor.span(), b"GET");
        assert_eq!(cursor.take_str(), "GET");
        assert_eq!(cursor.peek(), Some(b' '));
    }

    #[test]
    fn typed_extraction() {
        let mut cursor = Cursor::resume(b"204 ", 0, 0);
        cursor.mark();
        for _ in 0..3 {
            cursor.bump();
        }
        assert_eq!(cursor.take_u64(), Some(204));

        let mut cursor = Cursor::resume(b"1.1 ", 0, 0);
        cursor.mark();
        for _ in 0..3 {
            cursor.bump();
        }
        assert_eq!(cursor.take_f64(), Some(1.1));
    }

    #[test]
    fn resume_continues_a_partial_token() {
        // first delivery ends mid-token
        let mut cursor = Cursor::resume(b"GE", 0, 0);
        cursor.mark();
        cursor.bump();
        cursor.bump();
        assert_eq!(cursor.peek(), None);
        let (pos, mark) = cursor.offsets();

        // same bytes plus the rest, offsets carried over
        let mut cursor = Cursor::resume(b"GET ", pos, mark);
        cursor.bump();
        assert_eq!(cursor.span(), b"GET");
    }

    #[test]
    fn back_steps_over_consumed_bytes() {
        let mut cursor = Cursor::resume(b"a\r\nb", 0, 0);
        cursor.mark();
        for _ in 0..3 {
            cursor.bump();
        }
        cursor.back(2);
        assert_eq!(cursor.span(), b"a");
        assert_eq!(cursor.peek(), Some(b'\r'));
    }
}
