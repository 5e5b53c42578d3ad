use crate::protocol::Version;

/// A classified, complete lexical unit handed from the scanner to the reducer.
///
/// Tokens are consumed by the reduction that receives them and never retained
/// past it.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Method(String),
    Path(String),
    Query(Vec<(String, String)>),
    Version(Version),
    StatusCode(u64),
    StatusText(String),
    HeaderName(String),
    HeaderValue(String),
    NewLine,
}

impl Token {
    /// The token kind, for error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Method(_) => "method",
            Token::Path(_) => "path",
            Token::Query(_) => "query",
            Token::Version(_) => "version",
            Token::StatusCode(_) => "status-code",
            Token::StatusText(_) => "status-text",
            Token::HeaderName(_) => "header-name",
            Token::HeaderValue(_) => "header-value",
            Token::NewLine => "newline",
        }
    }
}
