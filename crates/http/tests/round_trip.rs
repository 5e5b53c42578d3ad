//! Serialize-then-parse round trips through the public codec API.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use wire_http::codec::{MessageDecoder, MessageWriter, WriteOutcome};
use wire_http::protocol::{
    BodyItem, Frame, Message, Request, Response, Status, Version, CONTENT_TYPE, HOST,
};

fn write(message: Message) -> Vec<u8> {
    let mut writer = MessageWriter::with_capacity(64);
    writer.start(message).unwrap();
    let mut out = Vec::new();
    loop {
        let outcome = writer.resume().unwrap();
        out.extend_from_slice(&writer.pending());
        if outcome == WriteOutcome::Complete {
            return out;
        }
    }
}

fn parse(bytes: &[u8]) -> (Message, Option<Vec<u8>>) {
    let mut decoder = MessageDecoder::new();
    let mut buf = BytesMut::from(bytes);
    let mut head = None;
    let mut body = Vec::new();
    while let Some(frame) = decoder.decode(&mut buf).unwrap() {
        match frame {
            Frame::Head(message) => head = Some(message),
            Frame::Body(BodyItem::Chunk(chunk)) => body.extend_from_slice(&chunk),
            Frame::Body(BodyItem::End) => break,
        }
    }
    let body = if body.is_empty() { None } else { Some(body) };
    (head.expect("message head"), body)
}

#[test]
fn request_round_trip() {
    let request = Request::builder()
        .method("POST")
        .path("/submit")
        .query(vec![("key".into(), "value".into()), ("flag".into(), "1".into())])
        .version(Version::Http11)
        .header(HOST, "example.com")
        .header(CONTENT_TYPE, "text/plain")
        .body("hello there")
        .build();

    let (head, body) = parse(&write(request.clone().into()));
    let parsed = head.into_request().unwrap();

    assert_eq!(parsed.method(), request.method());
    assert_eq!(parsed.path(), request.path());
    assert_eq!(parsed.query(), request.query());
    assert_eq!(parsed.version(), request.version());
    assert_eq!(body.as_deref(), request.body().map(|b| &b[..]));
    // wire casing preserved
    let names: Vec<_> = parsed.headers().iter().map(|(n, _)| n.to_owned()).collect();
    assert_eq!(names, vec!["Host", "Content-Type", "Content-Length"]);
    // origin derived during reduction
    assert_eq!(parsed.host(), Some("example.com"));
    assert_eq!(parsed.port(), Some(80));
}

#[test]
fn response_round_trip() {
    let response = Response::builder()
        .status(Status::Created)
        .header("Server", "wire")
        .body("created")
        .build();

    let (head, body) = parse(&write(response.clone().into()));
    let parsed = head.into_response().unwrap();

    assert_eq!(parsed.status(), response.status());
    assert_eq!(parsed.version(), response.version());
    assert_eq!(body.as_deref(), response.body().map(|b| &b[..]));
    assert_eq!(
        parsed.headers().get("server").map(ToString::to_string),
        Some("wire".to_owned())
    );
}

#[test]
fn headerless_response_round_trip() {
    let response = Response::builder().status(Status::NoContent).build();
    let bytes = write(response.clone().into());
    assert_eq!(bytes, b"HTTP/1.1 204 No Content\r\n\r\n");
    let (head, body) = parse(&bytes);
    assert_eq!(head.into_response().unwrap(), response);
    assert!(body.is_none());
}
