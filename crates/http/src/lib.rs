//! A hand-built HTTP/1.x message codec for non-blocking byte streams
//!
//! This crate parses and writes HTTP/1.x messages over streams that deliver
//! bytes in arbitrary chunks. Instead of buffering until a full head has
//! arrived, the codec scans byte by byte through a resumable state machine:
//! whatever a delivery holds is consumed, the machine parks, and the next
//! delivery continues exactly where the last one stopped. The same economy
//! applies on the way out, where messages are serialized through a bounded
//! buffer that suspends whenever the next piece does not fit.
//!
//! # Features
//!
//! - Requests and responses decoded from the same grammar
//! - Byte-at-a-time scanning, resumable at any chunk boundary
//! - Content-Length framed bodies, handed out as zero-copy chunks
//! - Pipelined messages on one connection
//! - Obsolete header folding accepted on input, never emitted
//! - Response status lines checked against the full status table
//! - Bounded-memory writing with suspend and resume
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn, Level};
//! use tracing_subscriber::FmtSubscriber;
//! use wire_http::connection::HttpConnection;
//! use wire_http::handler::make_handler;
//! use wire_http::protocol::{Response, Status, CONTENT_TYPE};
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     info!(port = 8080, "start listening");
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(|request| {
//!         info!(path = request.path(), "handling");
//!         Ok(Response::builder()
//!             .status(Status::Ok)
//!             .header(CONTENT_TYPE, "text/plain")
//!             .body("Hello World!\r\n")
//!             .build())
//!     }));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             if let Err(e) = connection.process(handler).await {
//!                 error!("connection closed with error: {e}");
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: the scanner, reducer, body extractor and writer
//! - [`protocol`]: the message model, status table and error taxonomy
//! - [`connection`]: server and client adapters over tokio streams
//! - [`handler`]: request handler traits and path routing
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only
//! - Content-Length framing only (no chunked transfer coding)
//! - No TLS; the encryption flag only marks transports secured elsewhere
//! - Maximum head size: 8KB

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
