use std::fmt;

use bytes::Bytes;

use crate::protocol::{HeaderMap, Status, Version};

/// An HTTP response, immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: Status,
    version: Version,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub(crate) fn from_reduction(status: Status, version: Version, headers: HeaderMap) -> Self {
        Self { status, version, headers, body: None }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub(crate) fn attach_body(&mut self, body: Bytes) {
        self.body = Some(body);
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.version, self.status)?;
        for (name, value) in self.headers.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f)
    }
}

#[derive(Debug)]
pub struct ResponseBuilder {
    status: Status,
    version: Version,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self { status: Status::Ok, version: Version::default(), headers: HeaderMap::new(), body: None }
    }
}

impl ResponseBuilder {
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<super::FieldValue>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Response {
        Response { status: self.status, version: self.version, headers: self.headers, body: self.body }
    }
}
