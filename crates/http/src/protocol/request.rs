use std::fmt;

use bytes::Bytes;

use crate::protocol::{HeaderMap, Version};

/// Well-known request methods.
pub const OPTIONS: &str = "OPTIONS";
pub const HEAD: &str = "HEAD";
pub const GET: &str = "GET";
pub const PUT: &str = "PUT";
pub const POST: &str = "POST";
pub const PATCH: &str = "PATCH";
pub const DELETE: &str = "DELETE";

/// URL scheme derived from the connection's encryption flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// The default port for this scheme, used when `Host` carries none.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// An HTTP request, immutable after construction.
///
/// `scheme`, `host` and `port` are derived once, at reduction time, from the
/// `Host` header and the connection's encryption flag. When no `Host` header
/// is present they stay `None`; the codec never invents a host.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: String,
    path: String,
    query: Option<Vec<(String, String)>>,
    version: Version,
    headers: HeaderMap,
    body: Option<Bytes>,
    scheme: Option<Scheme>,
    host: Option<String>,
    port: Option<u16>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    #[allow(clippy::too_many_arguments, reason = "crate-internal reduction constructor")]
    pub(crate) fn from_reduction(
        method: String,
        path: String,
        query: Option<Vec<(String, String)>>,
        version: Version,
        headers: HeaderMap,
        scheme: Option<Scheme>,
        host: Option<String>,
        port: Option<u16>,
    ) -> Self {
        Self { method, path, query, version, headers, body: None, scheme, host, port }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The decoded query pairs, `None` when the request line carried none.
    pub fn query(&self) -> Option<&[(String, String)]> {
        self.query.as_deref()
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

    pub fn scheme(&self) -> Option<Scheme> {
        self.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// `host:port` for connecting a client, when a host is known.
    pub fn socket_address(&self) -> Option<String> {
        let host = self.host.as_deref()?;
        let port = self.port.unwrap_or_else(|| self.scheme.unwrap_or(Scheme::Http).default_port());
        Some(format!("{host}:{port}"))
    }

    pub(crate) fn attach_body(&mut self, body: Bytes) {
        self.body = Some(body);
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.path, self.version)?;
        writeln!(f)?;
        for (name, value) in self.headers.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f)
    }
}

/// Builder for requests assembled by callers rather than the reducer.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<String>,
    path: Option<String>,
    query: Option<Vec<(String, String)>>,
    version: Version,
    headers: HeaderMap,
    body: Option<Bytes>,
    scheme: Option<Scheme>,
    host: Option<String>,
    port: Option<u16>,
}

impl RequestBuilder {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = Some(query);
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

    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method.unwrap_or_else(|| GET.to_owned()),
            path: self.path.unwrap_or_else(|| "/".to_owned()),
            query: self.query,
            version: self.version,
            headers: self.headers,
            body: self.body,
            scheme: self.scheme,
            host: self.host,
            port: self.port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let request = Request::builder().build();
        assert_eq!(request.method(), GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), Version::Http11);
        assert!(request.query().is_none());
        assert!(request.body().is_none());
    }

    #[test]
    fn socket_address_defaults_scheme_port() {
        let request = Request::builder().host("example.com").scheme(Scheme::Https).build();
        assert_eq!(request.socket_address().as_deref(), Some("example.com:443"));

        let request = Request::builder().host("example.com").port(8080).build();
        assert_eq!(request.socket_address().as_deref(), Some("example.com:8080"));

        assert!(Request::builder().build().socket_address().is_none());
    }
}
