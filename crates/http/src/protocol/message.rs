use bytes::Bytes;

use crate::protocol::{HeaderMap, Request, Response, Version};

/// A complete HTTP message, either direction.
///
/// The grammar recognizes requests and responses from the same token stream,
/// so the decoder produces this sum type; connection adapters then insist on
/// the direction they expect.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    #[inline]
    pub fn is_request(&self) -> bool {
        matches!(self, Message::Request(_))
    }

    #[inline]
    pub fn is_response(&self) -> bool {
        matches!(self, Message::Response(_))
    }

    pub fn headers(&self) -> &HeaderMap {
        match self {
            Message::Request(request) => request.headers(),
            Message::Response(response) => response.headers(),
        }
    }

    pub fn version(&self) -> Version {
        match self {
            Message::Request(request) => request.version(),
            Message::Response(response) => response.version(),
        }
    }

    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Message::Request(request) => request.body(),
            Message::Response(response) => response.body(),
        }
    }

    pub fn into_request(self) -> Option<Request> {
        match self {
            Message::Request(request) => Some(request),
            Message::Response(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Message::Request(_) => None,
            Message::Response(response) => Some(response),
        }
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}

/// One decoded unit handed out by the message decoder.
///
/// A message arrives as one `Head` frame followed by zero or more body
/// `Chunk`s and exactly one `End`, even when the body is empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A fully reduced message head; its body is not attached yet.
    Head(Message),
    /// A span of body bytes or the end-of-body marker.
    Body(BodyItem),
}

impl Frame {
    #[inline]
    pub fn is_head(&self) -> bool {
        matches!(self, Frame::Head(_))
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            Frame::Head(message) => Some(message),
            Frame::Body(_) => None,
        }
    }
}

/// A lazily extracted span of body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem {
    /// A chunk of the body, at most the remaining declared length.
    Chunk(Bytes),
    /// The declared length has been fully consumed.
    End,
}

impl BodyItem {
    #[inline]
    pub fn is_end(&self) -> bool {
        matches!(self, BodyItem::End)
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            BodyItem::Chunk(bytes) => Some(bytes),
            BodyItem::End => None,
        }
    }
}
