//! Request handlers and path routing.
//!
//! A [`Handler`] turns one decoded request into the response the connection
//! writes back. Handlers are plain synchronous functions of the typed
//! message model; the connection adapter drives the codec around them.

use std::fmt;

use tracing::warn;

use crate::protocol::{HttpError, Request, Response, Status};

/// Handles one request at a time on a connection.
pub trait Handler: Send + Sync {
    fn handle(&self, request: Request) -> Result<Response, HttpError>;

    /// The response sent back when the connection hits an error, either from
    /// the codec or from [`Handler::handle`] itself.
    ///
    /// The default maps parse errors to `400 Bad Request` and everything
    /// else to `500 Internal Server Error`.
    fn recover(&self, error: &HttpError) -> Response {
        let status = match error {
            HttpError::ParseError { .. } => Status::BadRequest,
            HttpError::WriteError { .. } => Status::InternalServerError,
        };
        warn!(%error, %status, "recovering with an error response");
        Response::builder().status(status).build()
    }
}

/// Adapts a plain function to a [`Handler`].
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, HttpError> + Send + Sync,
{
    fn handle(&self, request: Request) -> Result<Response, HttpError> {
        (self.f)(request)
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerFn")
    }
}

pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Result<Response, HttpError> + Send + Sync,
{
    HandlerFn { f }
}

/// A handler that answers every request with the same response.
#[derive(Debug, Clone)]
pub struct StaticResponse {
    response: Response,
}

impl StaticResponse {
    pub fn new(response: Response) -> Self {
        Self { response }
    }
}

impl Handler for StaticResponse {
    fn handle(&self, _request: Request) -> Result<Response, HttpError> {
        Ok(self.response.clone())
    }
}

/// Receives the outcome of one client exchange.
///
/// Errors arrive in the same slot a response would, so implementations
/// discriminate on the variant rather than learning about failures out of
/// band.
pub trait ResponseHandler: Send {
    fn on_response(&mut self, result: Result<Response, HttpError>);
}

impl<F> ResponseHandler for F
where
    F: FnMut(Result<Response, HttpError>) + Send,
{
    fn on_response(&mut self, result: Result<Response, HttpError>) {
        self(result);
    }
}

/// Picks the handler for a request.
pub trait Router: Send + Sync {
    fn route(&self, request: &Request) -> Option<&dyn Handler>;
}

/// Path-prefix router.
///
/// Handlers are mounted under a path prefix; a request is routed to the
/// longest mounted prefix that matches its path on a segment boundary.
/// Mounting the same prefix twice replaces the earlier handler.
#[derive(Default)]
pub struct Mounts {
    // sorted longest prefix first, ties alphabetical
    mounts: Vec<(String, Box<dyn Handler>)>,
}

impl Mounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, prefix: impl Into<String>, handler: impl Handler + 'static) -> &mut Self {
        let prefix = prefix.into();
        match self.mounts.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = Box::new(handler),
            None => {
                self.mounts.push((prefix, Box::new(handler)));
                self.mounts.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            }
        }
        self
    }

    fn matches(prefix: &str, path: &str) -> bool {
        let Some(rest) = path.strip_prefix(prefix) else {
            return false;
        };
        prefix.ends_with('/') || rest.is_empty() || rest.starts_with('/')
    }
}

impl Router for Mounts {
    fn route(&self, request: &Request) -> Option<&dyn Handler> {
        self.mounts
            .iter()
            .find(|(prefix, _)| Self::matches(prefix, request.path()))
            .map(|(_, handler)| handler.as_ref())
    }
}

impl Handler for Mounts {
    /// Routes and dispatches; a path with no mounted prefix answers
    /// `404 Not Found`.
    fn handle(&self, request: Request) -> Result<Response, HttpError> {
        match self.route(&request) {
            Some(handler) => handler.handle(request),
            None => Ok(Response::builder().status(Status::NotFound).build()),
        }
    }
}

impl fmt::Debug for Mounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.mounts.iter().map(|(p, _)| p)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_handler(status: Status) -> impl Handler {
        make_handler(move |_| Ok(Response::builder().status(status).build()))
    }

    fn request(path: &str) -> Request {
        Request::builder().path(path).build()
    }

    #[test]
    fn routes_to_the_longest_matching_prefix() {
        let mut mounts = Mounts::new();
        mounts.mount("/", status_handler(Status::Ok));
        mounts.mount("/api", status_handler(Status::NoContent));
        mounts.mount("/api/admin", status_handler(Status::Forbidden));

        let dispatch = |path| mounts.handle(request(path)).unwrap().status();
        assert_eq!(dispatch("/index"), Status::Ok);
        assert_eq!(dispatch("/api/users"), Status::NoContent);
        assert_eq!(dispatch("/api"), Status::NoContent);
        assert_eq!(dispatch("/api/admin/keys"), Status::Forbidden);
    }

    #[test]
    fn prefix_matches_on_segment_boundaries_only() {
        let mut mounts = Mounts::new();
        mounts.mount("/api", status_handler(Status::NoContent));

        assert_eq!(mounts.handle(request("/apiary")).unwrap().status(), Status::NotFound);
        assert_eq!(mounts.handle(request("/api/x")).unwrap().status(), Status::NoContent);
    }

    #[test]
    fn remounting_a_prefix_replaces_the_handler() {
        let mut mounts = Mounts::new();
        mounts.mount("/x", status_handler(Status::Ok));
        mounts.mount("/x", status_handler(Status::Gone));
        assert_eq!(mounts.handle(request("/x")).unwrap().status(), Status::Gone);
    }

    #[test]
    fn default_recovery_maps_error_classes() {
        let handler = status_handler(Status::Ok);
        let parse: HttpError = crate::protocol::ParseError::TruncatedMessage.into();
        assert_eq!(handler.recover(&parse).status(), Status::BadRequest);
        let write: HttpError = crate::protocol::WriteError::invalid_message("x").into();
        assert_eq!(handler.recover(&write).status(), Status::InternalServerError);
    }
}
