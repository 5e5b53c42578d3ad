//! Connection adapters over async streams.
//!
//! These types mount the codec on a tokio stream and drive it:
//!
//! - [`HttpConnection`]: the server side; decodes requests, runs a
//!   [`Handler`](crate::handler::Handler), writes responses until the peer
//!   closes
//! - [`ClientConnection`]: the client side; writes requests and reads their
//!   responses in order
//! - [`HttpClient`]: one-shot convenience that connects per request
//!
//! Both sides share the same [`MessageDecoder`](crate::codec::MessageDecoder)
//! and [`MessageWriter`](crate::codec::MessageWriter); only the direction
//! they insist on differs.

mod http_connection;
pub use http_connection::HttpConnection;

mod client_connection;
pub use client_connection::ClientConnection;
pub use client_connection::HttpClient;
