use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use tracing::debug;

use crate::codec::{MessageDecoder, MessageWriter, WriteOutcome};
use crate::handler::ResponseHandler;
use crate::protocol::{
    BodyItem, Frame, HttpError, Message, ParseError, Request, Response, WriteError,
};

/// A client-side HTTP connection.
///
/// Writes requests and reads the responses back over one stream. Responses
/// are matched to requests by order, as HTTP/1.x pipelining prescribes.
#[derive(Debug)]
pub struct ClientConnection<R, W> {
    framed_read: FramedRead<R, MessageDecoder>,
    writer: W,
    message_writer: MessageWriter,
}

impl<R, W> ClientConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_encryption(reader, writer, false)
    }

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

    /// Sends one request and reads its response.
    pub async fn send(&mut self, request: Request) -> Result<Response, HttpError> {
        self.write_request(request).await?;
        self.read_response().await
    }

    /// Sends one request and delivers the outcome to a [`ResponseHandler`].
    pub async fn exchange<H>(&mut self, request: Request, handler: &mut H)
    where
        H: ResponseHandler,
    {
        handler.on_response(self.send(request).await);
    }

    async fn write_request(&mut self, request: Request) -> Result<(), HttpError> {
        debug!(method = request.method(), path = request.path(), "sending request");
        self.message_writer.start(request.into()).map_err(HttpError::from)?;
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

    async fn read_response(&mut self) -> Result<Response, HttpError> {
        let mut response = match self.framed_read.next().await {
            Some(Ok(Frame::Head(Message::Response(response)))) => response,
            Some(Ok(_)) => {
                return Err(ParseError::unexpected_frame("response head expected").into());
            }
            Some(Err(e)) => return Err(e.into()),
            None => return Err(ParseError::TruncatedMessage.into()),
        };
        if let Some(body) = self.read_body().await? {
            response.attach_body(body);
        }
        Ok(response)
    }

    async fn read_body(&mut self) -> Result<Option<Bytes>, HttpError> {
        let mut body = BytesMut::new();
        loop {
            match self.framed_read.next().await {
                Some(Ok(Frame::Body(BodyItem::Chunk(chunk)))) => body.extend_from_slice(&chunk),
                Some(Ok(Frame::Body(BodyItem::End))) => {
                    return Ok(if body.is_empty() { None } else { Some(body.freeze()) });
                }
                Some(Ok(Frame::Head(_))) => {
                    return Err(ParseError::unexpected_frame("body frame expected").into());
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Err(ParseError::TruncatedMessage.into()),
            }
        }
    }
}

/// One-shot client over a fresh TCP connection per request.
///
/// The request must carry enough to derive a socket address, either through
/// its `Host` header or an explicit host and port.
#[derive(Debug, Default)]
pub struct HttpClient;

impl HttpClient {
    /// Connects to the request's origin, sends it and reads the response.
    pub async fn send(request: Request) -> Result<Response, HttpError> {
        let address = request
            .socket_address()
            .ok_or_else(|| WriteError::invalid_message("request has no host to connect to"))?;

        let stream = TcpStream::connect(&address).await.map_err(WriteError::from)?;
        debug!(%address, "connected");
        let (reader, writer) = stream.into_split();
        ClientConnection::new(reader, writer).send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::HttpConnection;
    use crate::handler::make_handler;
    use crate::protocol::{Status, HOST};
    use std::sync::Arc;

    #[tokio::test]
    async fn request_response_over_a_duplex_pipe() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, client_write) = tokio::io::split(client);

        let handler = make_handler(|request: Request| {
            let body = format!("you sent {}", request.path());
            Ok(Response::builder().status(Status::Ok).body(body).build())
        });
        tokio::spawn(HttpConnection::new(server_read, server_write).process(Arc::new(handler)));

        let mut connection = ClientConnection::new(client_read, client_write);
        let request = Request::builder().path("/ping").header(HOST, "example.com").build();
        let response = connection.send(request).await.unwrap();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.body().map(|b| &b[..]), Some(&b"you sent /ping"[..]));
    }

    #[tokio::test]
    async fn exchange_delivers_the_outcome_to_the_handler() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, client_write) = tokio::io::split(client);

        let handler =
            make_handler(|_| Ok(Response::builder().status(Status::NoContent).build()));
        tokio::spawn(HttpConnection::new(server_read, server_write).process(Arc::new(handler)));

        let mut connection = ClientConnection::new(client_read, client_write);
        let mut seen = None;
        let mut on_response = |result: Result<Response, HttpError>| seen = Some(result);
        connection.exchange(Request::builder().build(), &mut on_response).await;

        let status = seen.expect("handler called").map(|r| r.status());
        assert_eq!(status.unwrap(), Status::NoContent);
    }
}
