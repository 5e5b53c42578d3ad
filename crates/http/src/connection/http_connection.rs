use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info};

use crate::codec::{MessageDecoder, MessageWriter, WriteOutcome};
use crate::handler::Handler;
use crate::protocol::{BodyItem, Frame, HttpError, Message, ParseError, Response, WriteError};

/// A server-side HTTP connection.
///
/// `HttpConnection` owns the read and write halves of one accepted stream
/// and drives the codec around a [`Handler`]: decode a request head, collect
/// its body, hand the request to the handler, write the response back, then
/// wait for the next pipelined request until the peer closes.
///
/// # Type Parameters
///
/// * `R`: the async readable half
/// * `W`: the async writable half
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, MessageDecoder>,
    writer: W,
    message_writer: MessageWriter,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// A connection over an unencrypted transport.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_encryption(reader, writer, false)
    }

    /// A connection whose transport is already encrypted; decoded requests
    /// derive `https` origins.
    pub fn with_encryption(reader: R, writer: W, encrypted: bool) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(
                reader,
                MessageDecoder::with_encryption(encrypted),
                8 * 1024,
            ),
            writer,
            message_writer: MessageWriter::new(),
        }
    }

    /// Serves requests until the peer closes the connection or an error is
    /// terminal.
    ///
    /// Parse errors are answered with the handler's [`Handler::recover`]
    /// response before the error is returned, so the peer learns why the
    /// connection is going away.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(Frame::Head(Message::Request(mut request)))) => {
                    match self.read_body().await {
                        Ok(Some(body)) => request.attach_body(body),
                        Ok(None) => {}
                        Err(e) => {
                            let e = e.into();
                            self.send_response(handler.recover(&e)).await?;
                            return Err(e);
                        }
                    }

                    debug!(method = request.method(), path = request.path(), "handling request");
                    let response = match handler.handle(request) {
                        Ok(response) => response,
                        Err(e) => handler.recover(&e),
                    };
                    self.send_response(response).await?;
                }

                Some(Ok(frame)) => {
                    error!("expected a request head, got {frame:?}");
                    let e = ParseError::unexpected_frame("request head expected").into();
                    self.send_response(handler.recover(&e)).await?;
                    return Err(e);
                }

                Some(Err(e)) => {
                    error!("cannot decode next request: {e}");
                    let e = e.into();
                    self.send_response(handler.recover(&e)).await?;
                    return Err(e);
                }

                None => {
                    info!("peer closed, connection done");
                    return Ok(());
                }
            }
        }
    }

    /// Collects the body frames that follow a head.
    async fn read_body(&mut self) -> Result<Option<Bytes>, ParseError> {
        let mut body = BytesMut::new();
        loop {
            match self.framed_read.next().await {
                Some(Ok(Frame::Body(BodyItem::Chunk(chunk)))) => body.extend_from_slice(&chunk),
                Some(Ok(Frame::Body(BodyItem::End))) => {
                    return Ok(if body.is_empty() { None } else { Some(body.freeze()) });
                }
                Some(Ok(Frame::Head(_))) => {
                    return Err(ParseError::unexpected_frame("body frame expected"));
                }
                Some(Err(e)) => return Err(e),
                None => return Err(ParseError::TruncatedMessage),
            }
        }
    }

    async fn send_response(&mut self, response: Response) -> Result<(), HttpError> {
        self.message_writer.start(response.into()).map_err(HttpError::from)?;
        loop {
            let outcome = self.message_writer.resume().map_err(HttpError::from)?;
            let staged = self.message_writer.pending();
            if !staged.is_empty() {
                self.writer.write_all(&staged).await.map_err(WriteError::from)?;
            }
            if outcome == WriteOutcome::Complete {
                self.writer.flush().await.map_err(WriteError::from)?;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use crate::protocol::Status;

    fn echo_handler() -> impl Handler {
        make_handler(|request| {
            let body = request.body().cloned().unwrap_or_default();
            Ok(Response::builder().status(Status::Ok).body(body).build())
        })
    }

    #[tokio::test]
    async fn serves_pipelined_requests() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let connection = HttpConnection::new(server_read, server_write);
        let task = tokio::spawn(connection.process(Arc::new(echo_handler())));

        client_write
            .write_all(
                b"POST /a HTTP/1.1\r\nContent-Length: 2\r\n\r\nhiPOST /b HTTP/1.1\r\nContent-Length: 3\r\n\r\nbye",
            )
            .await
            .unwrap();
        client_write.shutdown().await.unwrap();

        let mut out = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut client_read, &mut out).await.unwrap();
        assert_eq!(
            out,
            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhiHTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nbye"
        );
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn answers_a_parse_error_with_bad_request() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let connection = HttpConnection::new(server_read, server_write);
        let task = tokio::spawn(connection.process(Arc::new(echo_handler())));

        client_write.write_all(b"\x01garbage").await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut out = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut client_read, &mut out).await.unwrap();
        assert_eq!(out, b"HTTP/1.1 400 Bad Request\r\n\r\n");
        assert!(task.await.unwrap().is_err());
    }
}
