//! Core protocol types: the message model and the error taxonomy.
//!
//! This module holds the value types the codec produces and consumes:
//!
//! - [`Request`] / [`Response`]: immutable-after-construction messages
//! - [`Message`]: the request/response sum the grammar reduces to
//! - [`Frame`] / [`BodyItem`]: the units the streaming decoder hands out
//! - [`HeaderMap`] / [`FieldValue`]: ordered, casing-preserving headers
//! - [`Status`] / [`Version`]: the checked status table and version pair
//! - [`HttpError`] / [`ParseError`] / [`WriteError`]: the error taxonomy
//!
//! All parse failures are values, not panics, and every class of failure is
//! recoverable at the connection level: the owning scanner/reducer state is
//! reset so a later message on the same connection is unaffected.

mod headers;
pub use headers::FieldValue;
pub use headers::HeaderMap;
pub use headers::{ACCEPT, ALLOW, CONTENT_LENGTH, CONTENT_TYPE, DATE, ETAG, HOST, LAST_MODIFIED, SERVER};

mod version;
pub use version::Version;

mod status;
pub use status::Status;

mod request;
pub use request::Request;
pub use request::RequestBuilder;
pub use request::Scheme;
pub use request::{DELETE, GET, HEAD, OPTIONS, PATCH, POST, PUT};

mod response;
pub use response::Response;
pub use response::ResponseBuilder;

mod message;
pub use message::BodyItem;
pub use message::Frame;
pub use message::Message;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::WriteError;
