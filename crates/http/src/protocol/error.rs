use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("parse error: {source}")]
    ParseError {
        #[from]
        source: ParseError,
    },

    #[error("write error: {source}")]
    WriteError {
        #[from]
        source: WriteError,
    },
}

/// Everything that can go wrong between wire bytes and a typed message.
///
/// The taxonomy follows the three recoverable classes: scan errors (a byte
/// does not match the active sub-state), grammar errors (token stream or
/// status table violations) and framing errors (a declared body length that
/// the stream cannot satisfy). All of them reset the per-connection parse
/// state and are handed to the caller as values.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unexpected byte 0x{byte:02X} in {context}")]
    UnexpectedByte { byte: u8, context: &'static str },

    #[error("invalid http version {version:?}")]
    InvalidVersion { version: String },

    #[error("invalid query string: {reason}")]
    InvalidQuery { reason: String },

    #[error("unexpected {token} token while parsing {context}")]
    UnexpectedToken { token: &'static str, context: &'static str },

    #[error("unknown status code {code}")]
    UnknownStatus { code: u64 },

    #[error("status phrase {phrase:?} does not match {expected:?} for code {code}")]
    ReasonMismatch { code: u16, phrase: String, expected: &'static str },

    #[error("invalid host header: {reason}")]
    InvalidHost { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("header block exceeds the {max_size} byte limit")]
    TooLargeHeader { max_size: usize },

    #[error("stream ended with {remaining} body bytes outstanding")]
    TruncatedBody { remaining: u64 },

    #[error("stream ended in the middle of a message")]
    TruncatedMessage,

    #[error("unexpected frame: {reason}")]
    UnexpectedFrame { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn unexpected_byte(byte: u8, context: &'static str) -> Self {
        Self::UnexpectedByte { byte, context }
    }

    pub fn invalid_version<S: ToString>(version: S) -> Self {
        Self::InvalidVersion { version: version.to_string() }
    }

    pub fn invalid_query<S: ToString>(reason: S) -> Self {
        Self::InvalidQuery { reason: reason.to_string() }
    }

    pub fn unexpected_token(token: &'static str, context: &'static str) -> Self {
        Self::UnexpectedToken { token, context }
    }

    pub fn invalid_host<S: ToString>(reason: S) -> Self {
        Self::InvalidHost { reason: reason.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(reason: S) -> Self {
        Self::InvalidContentLength { reason: reason.to_string() }
    }

    pub fn unexpected_frame<S: ToString>(reason: S) -> Self {
        Self::UnexpectedFrame { reason: reason.to_string() }
    }

    /// True for lexical errors: a byte did not fit the active sub-state.
    pub fn is_scan_error(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedByte { .. } | Self::InvalidVersion { .. } | Self::InvalidQuery { .. }
        )
    }

    /// True for grammar errors: the token stream or a checked field was wrong.
    pub fn is_grammar_error(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedToken { .. }
                | Self::UnknownStatus { .. }
                | Self::ReasonMismatch { .. }
                | Self::InvalidHost { .. }
                | Self::InvalidContentLength { .. }
        )
    }

    /// True for framing errors: the stream cannot satisfy the declared length.
    pub fn is_framing_error(&self) -> bool {
        matches!(self, Self::TruncatedBody { .. } | Self::TruncatedMessage)
    }
}

/// Writer-side failures.
///
/// After any of these the writer's position is unspecified; the writer must
/// be discarded, not retried.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("message cannot be serialized: {reason}")]
    InvalidMessage { reason: String },

    #[error("body source error: {source}")]
    BodySource { source: io::Error },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl WriteError {
    pub fn invalid_message<S: ToString>(reason: S) -> Self {
        Self::InvalidMessage { reason: reason.to_string() }
    }
}
