//! Byte-by-byte lexical scanner for HTTP/1.x message heads.
//!
//! The scanner is an explicit condition + sub-state machine. The condition
//! selects the active sub-grammar, the sub-state the position within it, and
//! together with the cursor offsets they form the whole scanner state: plain
//! data that can be parked when the buffer runs dry and resumed at any byte
//! boundary once more bytes arrive. Recognized grammar:
//!
//! ```text
//! [main]        version = ([A-Za-z]+ "/" [.0-9]+)              => Version($1)
//! [main]        code    = ([0-9]+) " "            :=> status   => StatusCode($1)
//! [status]      status  = ( text+ )               :=> main     => StatusText($1)
//! [main]        method  = ([A-Za-z]+) " "                      => Method($1)
//! [main]        path    = ("/" [\x21-\x7E]+)                   => Path($1)
//! [main]        query   = ("?" [\x21-\x7E]+) " "               => Query($1)
//! [main]        key     = ([A-Za-z-]+) ":"        :=> header   => HeaderName($1)
//! [main]        newline = nl                                   => NewLine()
//! [header]      value   = ( text* ( nl space+ text+ )* ) :=> main => HeaderValue($1)
//!
//! [main,header]   nl    = "\x0D\x0A"
//! [status,header] text  = [\x20-\xFE]
//! [header]        space = [\x09\x20]
//! ```
//!
//! Obsolete header folding is accepted on input; the emitted header-value
//! token joins the segments of a folded value with a single space.

use crate::codec::Cursor;
use crate::codec::Token;
use crate::protocol::{ParseError, Version};
use crate::utils::ensure;

/// The active lexical sub-grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Condition {
    #[default]
    Main,
    Status,
    Header,
}

/// The fine-grained position within a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Start,
    StatusCode,
    StatusPhrase,
    MethodVersionHeader,
    Version,
    Path,
    Query,
    HeaderKey,
    HeaderSpace,
    HeaderValue,
    Indent,
    Nl,
    DoubleNl1,
    DoubleNl2,
}

/// The resumable lexer.
///
/// `next_token` pulls one complete token out of the buffer, or reports that
/// it needs more input. The caller must present the same buffer (possibly
/// grown at the end) on the next call; [`Scanner::bytes_scanned`] tells how
/// many leading bytes may be discarded once a message head is complete.
#[derive(Debug, Default)]
pub struct Scanner {
    condition: Condition,
    state: State,
    pos: usize,
    mark: usize,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rolls the scanner back to its initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Bytes consumed from the start of the buffer so far.
    pub(crate) fn bytes_scanned(&self) -> usize {
        self.pos
    }

    /// True when no message is in flight.
    pub(crate) fn is_initial(&self) -> bool {
        self.condition == Condition::Main && self.state == State::Start && self.pos == 0
    }

    /// Scans for the next token.
    ///
    /// Returns `Ok(None)` when the buffer is exhausted mid-token; the scanner
    /// keeps its position and resumes where it left off on the next call. On
    /// a scan error the state is reset to initial before the error is
    /// returned, so a later message on the same connection starts clean.
    pub fn next_token(&mut self, buf: &[u8]) -> Result<Option<Token>, ParseError> {
        let mut cursor = Cursor::resume(buf, self.pos, self.mark);
        let result = self.run(&mut cursor);
        (self.pos, self.mark) = cursor.offsets();
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn run(&mut self, cursor: &mut Cursor<'_>) -> Result<Option<Token>, ParseError> {
        loop {
            let Some(c) = cursor.peek() else {
                return Ok(None);
            };

            match self.condition {
                Condition::Main => match self.state {
                    State::Start => match c {
                        b'A'..=b'Z' | b'a'..=b'z' => {
                            self.state = State::MethodVersionHeader;
                            cursor.mark();
                            cursor.bump();
                        }
                        b'0'..=b'9' => {
                            self.state = State::StatusCode;
                            cursor.mark();
                            cursor.bump();
                        }
                        b'/' => {
                            self.state = State::Path;
                            cursor.mark();
                            cursor.bump();
                        }
                        b'-' => {
                            self.state = State::HeaderKey;
                            cursor.mark();
                            cursor.bump();
                        }
                        b'\r' => {
                            self.state = State::Nl;
                            cursor.mark();
                            cursor.bump();
                        }
                        _ => return Err(ParseError::unexpected_byte(c, "message start")),
                    },

                    State::StatusCode => match c {
                        b'0'..=b'9' => {
                            // a status code has three digits; tolerate a few more
                            // but keep the span parseable
                            ensure!(cursor.span().len() < 5, ParseError::unexpected_byte(c, "status code"));
                            cursor.bump();
                        }
                        b' ' => {
                            // span is at most five digits, always parses
                            let code = cursor.take_u64().unwrap_or(0);
                            cursor.bump();
                            self.condition = Condition::Status;
                            self.state = State::Start;
                            return Ok(Some(Token::StatusCode(code)));
                        }
                        _ => return Err(ParseError::unexpected_byte(c, "status code")),
                    },

                    State::Path => match c {
                        b'?' => {
                            let path = cursor.take_str();
                            cursor.bump();
                            cursor.mark();
                            self.state = State::Query;
                            return Ok(Some(Token::Path(path)));
                        }
                        b' ' => {
                            let path = cursor.take_str();
                            cursor.bump();
                            self.state = State::Start;
                            return Ok(Some(Token::Path(path)));
                        }
                        0x21..=0x7E => cursor.bump(),
                        _ => return Err(ParseError::unexpected_byte(c, "path")),
                    },

                    State::Query => match c {
                        b' ' => {
                            let raw = cursor.take_str();
                            let query = serde_urlencoded::from_str::<Vec<(String, String)>>(&raw)
                                .map_err(ParseError::invalid_query)?;
                            cursor.bump();
                            self.state = State::Start;
                            return Ok(Some(Token::Query(query)));
                        }
                        0x21..=0x7E => cursor.bump(),
                        _ => return Err(ParseError::unexpected_byte(c, "query")),
                    },

                    State::MethodVersionHeader => match c {
                        b'/' => {
                            // version: HTTP/number
                            ensure!(cursor.span() == b"HTTP", ParseError::unexpected_byte(c, "protocol name"));
                            self.state = State::Version;
                            cursor.bump();
                            cursor.mark();
                        }
                        b'-' => {
                            self.state = State::HeaderKey;
                            cursor.bump();
                        }
                        b' ' => {
                            let method = cursor.take_str();
                            cursor.bump();
                            self.state = State::Start;
                            return Ok(Some(Token::Method(method)));
                        }
                        b':' => {
                            let name = cursor.take_str();
                            cursor.bump();
                            self.condition = Condition::Header;
                            self.state = State::Start;
                            return Ok(Some(Token::HeaderName(name)));
                        }
                        b'A'..=b'Z' | b'a'..=b'z' => cursor.bump(),
                        _ => return Err(ParseError::unexpected_byte(c, "method, protocol or header name")),
                    },

                    State::Version => match c {
                        b'.' | b'0'..=b'9' => {
                            ensure!(cursor.span().len() < 4, ParseError::unexpected_byte(c, "protocol version"));
                            cursor.bump();
                        }
                        b' ' => {
                            let version = version_from_span(cursor)?;
                            cursor.bump();
                            self.state = State::Start;
                            return Ok(Some(Token::Version(version)));
                        }
                        b'\r' => {
                            let version = version_from_span(cursor)?;
                            cursor.bump();
                            self.state = State::Nl;
                            return Ok(Some(Token::Version(version)));
                        }
                        _ => return Err(ParseError::unexpected_byte(c, "protocol version")),
                    },

                    State::HeaderKey => match c {
                        b':' => {
                            let name = cursor.take_str();
                            cursor.bump();
                            self.condition = Condition::Header;
                            self.state = State::Start;
                            return Ok(Some(Token::HeaderName(name)));
                        }
                        b'A'..=b'Z' | b'a'..=b'z' | b'-' => cursor.bump(),
                        _ => return Err(ParseError::unexpected_byte(c, "header name")),
                    },

                    State::Nl => match c {
                        b'\n' => {
                            cursor.bump();
                            self.state = State::DoubleNl1;
                            return Ok(Some(Token::NewLine));
                        }
                        _ => return Err(ParseError::unexpected_byte(c, "line terminator")),
                    },

                    State::DoubleNl1 => match c {
                        b'\r' => {
                            cursor.bump();
                            self.state = State::DoubleNl2;
                        }
                        _ => self.state = State::Start,
                    },

                    State::DoubleNl2 => match c {
                        b'\n' => {
                            cursor.bump();
                            cursor.mark();
                            self.state = State::Start;
                            return Ok(Some(Token::NewLine));
                        }
                        _ => return Err(ParseError::unexpected_byte(c, "line terminator")),
                    },

                    _ => return Err(ParseError::unexpected_byte(c, "message head")),
                },

                Condition::Status => match self.state {
                    State::Start => {
                        self.state = State::StatusPhrase;
                        cursor.mark();
                    }
                    State::StatusPhrase => match c {
                        b'\r' => {
                            let phrase = cursor.take_str();
                            cursor.bump();
                            self.condition = Condition::Main;
                            self.state = State::Nl;
                            return Ok(Some(Token::StatusText(phrase)));
                        }
                        0x20..=0xFE => cursor.bump(),
                        _ => return Err(ParseError::unexpected_byte(c, "status phrase")),
                    },
                    _ => return Err(ParseError::unexpected_byte(c, "status phrase")),
                },

                Condition::Header => match self.state {
                    State::Start => self.state = State::HeaderSpace,
                    State::HeaderSpace => match c {
                        b' ' => {
                            cursor.bump();
                            cursor.mark();
                        }
                        b'\r' => {
                            // empty value
                            cursor.mark();
                            self.state = State::Nl;
                            cursor.bump();
                        }
                        _ => {
                            self.state = State::HeaderValue;
                            cursor.mark();
                        }
                    },
                    State::HeaderValue => match c {
                        b'\r' => {
                            self.state = State::Nl;
                            cursor.bump();
                        }
                        0x20..=0xFE => cursor.bump(),
                        _ => return Err(ParseError::unexpected_byte(c, "header value")),
                    },
                    State::Nl => match c {
                        b'\n' => {
                            cursor.bump();
                            self.state = State::Indent;
                        }
                        _ => return Err(ParseError::unexpected_byte(c, "line terminator")),
                    },
                    State::Indent => match c {
                        // folded continuation: the value keeps accumulating,
                        // fold bytes stay inside the span and are joined below
                        b'\t' | b' ' => {
                            self.state = State::HeaderValue;
                            cursor.bump();
                        }
                        _ => {
                            // not a fold: hand the CRLF back to the main condition
                            cursor.back(2);
                            let value = unfold(cursor.span());
                            self.condition = Condition::Main;
                            self.state = State::Start;
                            return Ok(Some(Token::HeaderValue(value)));
                        }
                    },
                    _ => return Err(ParseError::unexpected_byte(c, "header value")),
                },
            }
        }
    }
}

/// Only the exact spans `1.0` and `1.1` name a version; spellings that parse
/// to the same number, like `1.10` or `01.1`, are scan errors.
fn version_from_span(cursor: &Cursor<'_>) -> Result<Version, ParseError> {
    match cursor.span() {
        b"1.0" => Ok(Version::Http10),
        b"1.1" => Ok(Version::Http11),
        _ => Err(ParseError::invalid_version(cursor.take_str())),
    }
}

/// Joins the segments of a folded header value with a single space.
fn unfold(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\r' && raw.get(i + 1) == Some(&b'\n') {
            i += 2;
            while i < raw.len() && (raw[i] == b' ' || raw[i] == b'\t') {
                i += 1;
            }
            out.push(b' ');
            continue;
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
