//! Grammar reducer: folds the scanner's token stream into a message head.
//!
//! Productions, applied one token at a time:
//!
//! ```text
//! Message     := RequestLine  [Headers] NewLine
//! Message     := ResponseLine [Headers] NewLine
//! RequestLine := Method Path [Query] Version NewLine
//! ResponseLine:= Version StatusCode StatusText NewLine
//! Headers     := [Headers] HeaderKey HeaderValue NewLine
//! ```
//!
//! The reducer is fed immediately after every recognized token, so partial
//! reductions survive buffer boundaries for free: whatever tokens have
//! arrived are already folded in when the scanner parks. The terminal
//! newline triggers the finishing step, which derives scheme, host and port
//! from the `Host` header, checks a response's status against the status
//! table and extracts the declared body length.

use crate::codec::Token;
use crate::utils::ensure;
use crate::protocol::{
    FieldValue, HeaderMap, Message, ParseError, Request, Response, Scheme, Status, Version, HOST,
};

/// The start line, once fully reduced.
#[derive(Debug)]
enum StartLine {
    Request { method: String, path: String, query: Option<Vec<(String, String)>>, version: Version },
    Response { version: Version, status: Status },
}

/// Partial reduction of the start line.
#[derive(Debug, Default)]
enum LineBuilder {
    #[default]
    Empty,
    Request {
        method: String,
        path: Option<String>,
        query: Option<Vec<(String, String)>>,
        version: Option<Version>,
    },
    Response {
        version: Version,
        status: Option<Status>,
    },
}

/// What the header production expects next.
#[derive(Debug)]
enum Expect {
    Name,
    Value(String),
    Newline,
}

#[derive(Debug, Default)]
enum Stage {
    #[default]
    Idle,
    Line(LineBuilder),
    Headers { line: StartLine, headers: HeaderMap, expect: Expect },
}

/// Reduces tokens into messages, one connection's worth of state.
///
/// `encrypted` records whether the underlying transport is encrypted; it
/// selects the scheme and default port derived for requests that carry a
/// `Host` header.
#[derive(Debug)]
pub struct Reducer {
    stage: Stage,
    encrypted: bool,
}

impl Reducer {
    pub fn new(encrypted: bool) -> Self {
        Self { stage: Stage::Idle, encrypted }
    }

    /// Rolls the reducer back to the start of a message.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
    }

    pub(crate) fn is_idle(&self) -> bool {
        matches!(self.stage, Stage::Idle)
    }

    /// Folds one token into the partial reduction.
    ///
    /// Returns the finished message and its declared body length when the
    /// token completes the `Message` production. On a grammar error the
    /// reducer resets before returning, like the scanner does.
    pub fn push(&mut self, token: Token) -> Result<Option<(Message, u64)>, ParseError> {
        let result = self.step(token);
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn step(&mut self, token: Token) -> Result<Option<(Message, u64)>, ParseError> {
        match std::mem::take(&mut self.stage) {
            Stage::Idle => self.start_line(LineBuilder::Empty, token),
            Stage::Line(line) => self.start_line(line, token),
            Stage::Headers { line, headers, expect } => self.headers(line, headers, expect, token),
        }
    }

    fn start_line(
        &mut self,
        line: LineBuilder,
        token: Token,
    ) -> Result<Option<(Message, u64)>, ParseError> {
        let line = match (line, token) {
            (LineBuilder::Empty, Token::Method(method)) => {
                LineBuilder::Request { method, path: None, query: None, version: None }
            }
            (LineBuilder::Empty, Token::Version(version)) => {
                LineBuilder::Response { version, status: None }
            }

            (LineBuilder::Request { method, path: None, query, version }, Token::Path(path)) => {
                LineBuilder::Request { method, path: Some(path), query, version }
            }
            (
                LineBuilder::Request { method, path: path @ Some(_), query: None, version },
                Token::Query(query),
            ) => LineBuilder::Request { method, path, query: Some(query), version },
            (
                LineBuilder::Request { method, path: path @ Some(_), query, version: None },
                Token::Version(version),
            ) => LineBuilder::Request { method, path, query, version: Some(version) },
            (
                LineBuilder::Request { method, path: Some(path), query, version: Some(version) },
                Token::NewLine,
            ) => {
                self.stage = Stage::Headers {
                    line: StartLine::Request { method, path, query, version },
                    headers: HeaderMap::new(),
                    expect: Expect::Name,
                };
                return Ok(None);
            }

            (LineBuilder::Response { version, status: None }, Token::StatusCode(code)) => {
                let status = u16::try_from(code)
                    .ok()
                    .and_then(Status::from_code)
                    .ok_or(ParseError::UnknownStatus { code })?;
                LineBuilder::Response { version, status: Some(status) }
            }
            (LineBuilder::Response { version, status: Some(status) }, Token::StatusText(phrase)) => {
                ensure!(
                    phrase == status.reason(),
                    ParseError::ReasonMismatch { code: status.code(), phrase, expected: status.reason() }
                );
                LineBuilder::Response { version, status: Some(status) }
            }
            (LineBuilder::Response { version, status: Some(status) }, Token::NewLine) => {
                self.stage = Stage::Headers {
                    line: StartLine::Response { version, status },
                    headers: HeaderMap::new(),
                    expect: Expect::Name,
                };
                return Ok(None);
            }

            (_, token) => return Err(ParseError::unexpected_token(token.kind(), "start line")),
        };
        self.stage = Stage::Line(line);
        Ok(None)
    }

    fn headers(
        &mut self,
        line: StartLine,
        mut headers: HeaderMap,
        expect: Expect,
        token: Token,
    ) -> Result<Option<(Message, u64)>, ParseError> {
        let expect = match (expect, token) {
            (Expect::Name, Token::HeaderName(name)) => Expect::Value(name),
            // terminal newline: the header block is done
            (Expect::Name, Token::NewLine) => return self.finish(line, headers).map(Some),
            (Expect::Value(name), Token::HeaderValue(value)) => {
                headers.insert(name, FieldValue::cast(value));
                Expect::Newline
            }
            (Expect::Newline, Token::NewLine) => Expect::Name,
            (_, token) => return Err(ParseError::unexpected_token(token.kind(), "header block")),
        };
        self.stage = Stage::Headers { line, headers, expect };
        Ok(None)
    }

    fn finish(&mut self, line: StartLine, headers: HeaderMap) -> Result<(Message, u64), ParseError> {
        let length = headers
            .content_length()
            .ok_or_else(|| ParseError::invalid_content_length("value is not an integer"))?;

        let message = match line {
            StartLine::Request { method, path, query, version } => {
                let (scheme, host, port) = self.derive_origin(&headers)?;
                Message::Request(Request::from_reduction(
                    method, path, query, version, headers, scheme, host, port,
                ))
            }
            StartLine::Response { version, status } => {
                Message::Response(Response::from_reduction(status, version, headers))
            }
        };
        Ok((message, length))
    }

    /// Derives `(scheme, host, port)` from the `Host` header and the
    /// connection's encryption flag. Without a `Host` header all three stay
    /// unknown.
    fn derive_origin(
        &self,
        headers: &HeaderMap,
    ) -> Result<(Option<Scheme>, Option<String>, Option<u16>), ParseError> {
        let Some(value) = headers.get(HOST) else {
            return Ok((None, None, None));
        };
        let value = match value {
            FieldValue::Text(text) => text.as_str(),
            FieldValue::Int(_) => return Err(ParseError::invalid_host("host is numeric")),
        };

        let scheme = if self.encrypted { Scheme::Https } else { Scheme::Http };
        let (host, port) = match value.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ParseError::invalid_host(format!("bad port in {value:?}")))?;
                (host, port)
            }
            None => (value, scheme.default_port()),
        };
        ensure!(!host.is_empty(), ParseError::invalid_host("empty host"));
        Ok((Some(scheme), Some(host.to_owned()), Some(port)))
    }
}
