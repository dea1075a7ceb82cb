//! The injected HTTP collaborator interface.
//!
//! The core never owns connection pooling, TLS, timeouts or cancellation;
//! all of that belongs to whatever implements [`HttpTransport`]. The crate
//! ships [`crate::ReqwestTransport`] as the default implementation, and
//! tests inject doubles.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use http::{HeaderMap, Method};

use crate::error::BlobResult;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Body of an outgoing request, buffered or streaming.
pub enum RequestBody {
    Bytes(Bytes),
    Stream(ByteStream),
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        Self::Bytes(Bytes::from(s))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        Self::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<ByteStream> for RequestBody {
    fn from(stream: ByteStream) -> Self {
        Self::Stream(stream)
    }
}

/// A single HTTP exchange to perform.
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl TransportRequest {
    pub fn new<S: Into<String>>(method: Method, url: S) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set the request headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the request body
    pub fn with_body<B: Into<RequestBody>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The transport's answer to a [`TransportRequest`].
///
/// The body is always a stream; [`TransportResponse::bytes`] buffers it for
/// callers that want the whole payload.
pub struct TransportResponse {
    pub status: u16,
    /// HTTP reason phrase, when the transport knows one.
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl TransportResponse {
    /// Whether the exchange completed with a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Buffer the remaining body into a single byte buffer.
    pub async fn bytes(mut self) -> BlobResult<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

/// HTTP transport collaborator - must be implemented by all backends.
///
/// Implementations are expected to be independently thread-safe; the core
/// issues exchanges strictly sequentially per logical operation and holds
/// no locks of its own.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one HTTP exchange, resolving once response headers are
    /// available. Body bytes are pulled from the returned stream.
    async fn send(&self, request: TransportRequest) -> BlobResult<TransportResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunked_body(chunks: &[&[u8]]) -> ByteStream {
        let chunks: Vec<Result<Bytes, std::io::Error>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Box::pin(stream::iter(chunks))
    }

    #[tokio::test]
    async fn bytes_buffers_all_chunks() {
        let response = TransportResponse {
            status: 200,
            reason: Some("OK".into()),
            headers: HeaderMap::new(),
            body: chunked_body(&[b"hel", b"lo ", b"world"]),
        };
        assert!(response.is_success());
        assert_eq!(response.bytes().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn bytes_propagates_stream_errors() {
        let body: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("connection reset")),
        ]));
        let response = TransportResponse {
            status: 200,
            reason: None,
            headers: HeaderMap::new(),
            body,
        };
        assert!(response.bytes().await.is_err());
    }

    #[test]
    fn partial_content_is_success() {
        let response = TransportResponse {
            status: 206,
            reason: None,
            headers: HeaderMap::new(),
            body: chunked_body(&[]),
        };
        assert!(response.is_success());
    }
}
