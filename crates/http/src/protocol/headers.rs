//! Ordered header map with wire-accurate casing.
//!
//! Header names are matched case-insensitively (`host` finds `Host`) but the
//! casing that arrived on the wire is what the writer emits again. Entries
//! keep their insertion order; writing a name that already exists overwrites
//! the stored name and value in place, so the last write wins without
//! disturbing the position of the header in the output.

use std::fmt;

/// Well-known header names.
pub const ACCEPT: &str = "Accept";
pub const ALLOW: &str = "Allow";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const DATE: &str = "Date";
pub const ETAG: &str = "ETag";
pub const HOST: &str = "Host";
pub const LAST_MODIFIED: &str = "Last-Modified";
pub const SERVER: &str = "Server";

/// A single header value, either free text or a number.
///
/// Values that consist entirely of digits are stored as integers, matching
/// the reduction's cast of numeric header values such as `Content-Length`.
/// The cast is only applied when it loses nothing: `0123` stays text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Int(u64),
}

impl FieldValue {
    /// Casts a wire value, storing it as an integer when it is purely numeric.
    pub fn cast(value: String) -> Self {
        match value.parse::<u64>() {
            Ok(n) if n.to_string() == value => FieldValue::Int(n),
            _ => FieldValue::Text(value),
        }
    }

    /// The numeric value, when this field holds one.
    pub fn as_int(&self) -> Option<u64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// The text value, when this field holds one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Int(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::cast(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::cast(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Int(value)
    }
}

/// Insertion-ordered header map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderMap {
    entries: Vec<(String, FieldValue)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a header, overwriting any entry with the same name in any
    /// casing. The overwritten entry keeps its position but takes the new
    /// wire casing and value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates entries in insertion order with their original casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// The declared body length, zero when no `Content-Length` is present.
    ///
    /// A `Content-Length` that is not a plain integer is reported as `None`
    /// so the caller can reject the message.
    pub fn content_length(&self) -> Option<u64> {
        match self.get(CONTENT_LENGTH) {
            None => Some(0),
            Some(FieldValue::Int(n)) => Some(*n),
            Some(FieldValue::Text(_)) => None,
        }
    }
}

impl FromIterator<(String, FieldValue)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}
