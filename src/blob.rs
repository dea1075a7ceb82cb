use std::pin::Pin;
use std::sync::Arc;

use async_stream::{stream, try_stream};
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use http::header::{CONTENT_TYPE, RANGE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use tracing::debug;

use crate::classify::classify;
use crate::decode::{grow_to_valid, shrink_to_valid, FragmentSource};
use crate::error::{BlobError, BlobResult};
use crate::provider::Provider;
use crate::range::{ByteRange, RangeSpec};
use crate::stat::BlobStats;
use crate::transport::{
    ByteStream, HttpTransport, RequestBody, TransportRequest, TransportResponse,
};

/// Stream of decoded text lines.
pub type LineStream = Pin<Box<dyn Stream<Item = BlobResult<String>> + Send>>;

/// A handle to one blob behind an HTTP URL.
///
/// The provider tag is fixed at construction (auto-detected from the URL or
/// explicitly overridden) and governs request headers and error
/// interpretation for the handle's lifetime. All operations issue their
/// HTTP exchanges strictly sequentially; concurrency, pooling, timeouts and
/// cancellation are the transport's concern.
pub struct UrlBlob {
    url: String,
    provider: Provider,
    transport: Arc<dyn HttpTransport>,
}

impl UrlBlob {
    /// Create a handle, auto-detecting the provider from the URL.
    pub fn new<S: Into<String>>(url: S, transport: Arc<dyn HttpTransport>) -> Self {
        let url = url.into();
        let provider = Provider::detect(&url);
        Self {
            url,
            provider,
            transport,
        }
    }

    /// Create a handle with an explicit provider, skipping detection.
    pub fn with_provider<S: Into<String>>(
        url: S,
        transport: Arc<dyn HttpTransport>,
        provider: Provider,
    ) -> Self {
        Self {
            url: url.into(),
            provider,
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Get statistics about the blob.
    ///
    /// Requests a single byte (`Range: bytes=0-0`) rather than issuing a
    /// HEAD: the 206 response's `Content-Range` then carries the full
    /// object size while transferring almost nothing.
    pub async fn stat(&self) -> BlobResult<BlobStats> {
        let response = self.ranged_get(ByteRange::new(Some(0), Some(0))).await?;
        Ok(BlobStats::new(response.headers))
    }

    /// Download blob content, optionally a byte range of it.
    pub async fn get<R: Into<RangeSpec>>(&self, spec: R) -> BlobResult<Bytes> {
        let range = spec.into().resolve()?;
        let response = self.ranged_get(range).await?;
        response.bytes().await
    }

    /// Download blob content and split it into lines.
    ///
    /// The content must be strictly valid UTF-8; use the boundary-resolving
    /// accessors for ranges that may cut a code point.
    pub async fn get_lines<R: Into<RangeSpec>>(&self, spec: R) -> BlobResult<Vec<String>> {
        let content = self.get(spec).await?;
        let text = std::str::from_utf8(&content)?;
        Ok(text.lines().map(str::to_owned).collect())
    }

    /// Download a byte range as a valid UTF-8 string, repairing code points
    /// cut at either boundary by fetching extra bytes outward.
    ///
    /// Lossless whenever the cut code points can be completed within the
    /// blob; falls back to lossy replacement of the originally fetched
    /// fragment otherwise. Costs up to three extra single-byte fetches per
    /// edge plus one lazy size lookup.
    pub async fn grow_to_valid_string<R: Into<RangeSpec>>(&self, spec: R) -> BlobResult<String> {
        let range = spec.into().resolve()?;
        let fragment = self.ranged_get(range).await?.bytes().await?;
        grow_to_valid(self, range, fragment).await
    }

    /// Download a byte range as a valid UTF-8 string, discarding bytes of
    /// code points cut at either boundary.
    ///
    /// Never performs extra I/O; boundary bytes are silently lost. The
    /// zero-round-trip complement of
    /// [`grow_to_valid_string`](UrlBlob::grow_to_valid_string).
    pub async fn shrink_to_valid_string<R: Into<RangeSpec>>(&self, spec: R) -> BlobResult<String> {
        let range = spec.into().resolve()?;
        let fragment = self.ranged_get(range).await?.bytes().await?;
        if range.is_full() {
            // No boundary to shrink away from; decode errors are genuine.
            return Ok(String::from_utf8_lossy(&fragment).into_owned());
        }
        Ok(shrink_to_valid(&fragment))
    }

    /// Stream the blob content as chunks of bytes.
    ///
    /// A pass-through over the transport's response body; nothing is
    /// buffered or reordered.
    pub async fn stream<R: Into<RangeSpec>>(&self, spec: R) -> BlobResult<ByteStream> {
        let range = spec.into().resolve()?;
        let response = self.ranged_get(range).await?;
        Ok(response.body)
    }

    /// Stream the blob content as lines of text.
    ///
    /// Lines are split on `\n` (a trailing `\r` is dropped) as chunks
    /// arrive; each line must be valid UTF-8.
    pub async fn stream_lines<R: Into<RangeSpec>>(&self, spec: R) -> BlobResult<LineStream> {
        let mut body = self.stream(spec).await?;
        let lines = try_stream! {
            let mut buf: Vec<u8> = Vec::new();
            while let Some(chunk) = body.next().await {
                buf.extend_from_slice(&chunk?);
                while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                    let mut line: Vec<u8> = buf.drain(..=pos).collect();
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    let line = String::from_utf8(line)
                        .map_err(|e| BlobError::from(e.utf8_error()))?;
                    yield line;
                }
            }
            if !buf.is_empty() {
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                let line = String::from_utf8(buf)
                    .map_err(|e| BlobError::from(e.utf8_error()))?;
                yield line;
            }
        };
        Ok(Box::pin(lines))
    }

    /// Upload content to the URL with HTTP PUT.
    ///
    /// `Content-Type` is sent only when supplied; Azure targets always get
    /// the `x-ms-blob-type: BlockBlob` header its write API requires.
    pub async fn put<B: Into<RequestBody>>(
        &self,
        content: B,
        content_type: Option<&str>,
    ) -> BlobResult<()> {
        let headers = self.put_headers(content_type)?;
        debug!(url = %self.url, provider = %self.provider, "PUT");
        let request = TransportRequest::new(Method::PUT, &self.url)
            .with_headers(headers)
            .with_body(content);
        let response = self.transport.send(request).await?;
        self.validate(response).await?;
        Ok(())
    }

    /// Upload lines of content, joined with `\n`.
    pub async fn put_lines<I>(&self, lines: I, content_type: Option<&str>) -> BlobResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut buf: Vec<u8> = Vec::new();
        for (i, line) in lines.into_iter().enumerate() {
            if i > 0 {
                buf.push(b'\n');
            }
            buf.extend_from_slice(line.as_ref());
        }
        self.put(buf, content_type).await
    }

    /// Upload a stream of lines, inserting `\n` between items without
    /// buffering the whole payload.
    pub async fn put_line_stream<S>(&self, lines: S, content_type: Option<&str>) -> BlobResult<()>
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    {
        let newline_separated = stream! {
            let mut first = true;
            for await line in lines {
                match line {
                    Ok(line) => {
                        if !first {
                            yield Ok(Bytes::from_static(b"\n"));
                        }
                        first = false;
                        yield Ok(line);
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        };
        let body: ByteStream = Box::pin(newline_separated);
        self.put(RequestBody::Stream(body), content_type).await
    }

    /// Issue a GET for `range` and classify any failure.
    async fn ranged_get(&self, range: ByteRange) -> BlobResult<TransportResponse> {
        let mut headers = HeaderMap::new();
        if let Some(value) = range.header_value() {
            headers.insert(RANGE, value);
        }
        debug!(url = %self.url, provider = %self.provider, range = ?range, "GET");
        let request = TransportRequest::new(Method::GET, &self.url).with_headers(headers);
        let response = self.transport.send(request).await?;
        self.validate(response).await
    }

    /// Pass successful responses through; turn failures into classified
    /// [`crate::RemoteError`]s, buffering the error body for inspection.
    async fn validate(&self, response: TransportResponse) -> BlobResult<TransportResponse> {
        if response.is_success() {
            return Ok(response);
        }
        let status = response.status;
        let reason = response.reason.clone();
        // A broken error-body stream must not mask the failure itself.
        let body = response.bytes().await.unwrap_or_else(|_| Bytes::new());
        Err(classify(self.provider, status, reason.as_deref(), &body).into())
    }

    fn put_headers(&self, content_type: Option<&str>) -> BlobResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            let value = HeaderValue::from_str(ct)
                .map_err(|_| BlobError::invalid_header("Content-Type", ct))?;
            headers.insert(CONTENT_TYPE, value);
        }
        if self.provider == Provider::Azure {
            headers.insert(
                HeaderName::from_static("x-ms-blob-type"),
                HeaderValue::from_static("BlockBlob"),
            );
        }
        Ok(headers)
    }
}

#[async_trait]
impl FragmentSource for UrlBlob {
    async fn byte_at(&self, offset: u64) -> BlobResult<Bytes> {
        self.get(ByteRange::new(Some(offset), Some(offset))).await
    }

    async fn size(&self) -> BlobResult<u64> {
        self.stat().await?.size()
    }
}

impl std::fmt::Debug for UrlBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlBlob")
            .field("url", &self.url)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}
