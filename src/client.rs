use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::trace;

use crate::blob::UrlBlob;
use crate::error::{BlobError, BlobResult};
use crate::provider::Provider;
use crate::transport::{HttpTransport, RequestBody, TransportRequest, TransportResponse};

/// Default [`HttpTransport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing, pre-configured client (proxies, timeouts, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> BlobResult<TransportResponse> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;
        trace!(%method, %url, "sending request");
        let mut builder = self.client.request(method, url.as_str()).headers(headers);
        if let Some(body) = body {
            builder = match body {
                RequestBody::Bytes(bytes) => builder.body(bytes),
                RequestBody::Stream(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
            };
        }

        let response = builder.send().await.map_err(BlobError::transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));

        Ok(TransportResponse {
            status: status.as_u16(),
            // reqwest does not surface the server's reason phrase; the
            // canonical one is advisory text only.
            reason: status.canonical_reason().map(str::to_owned),
            headers,
            body: Box::pin(body),
        })
    }
}

/// Factory for [`UrlBlob`] handles sharing one transport.
///
/// ```no_run
/// use dog_urlblob::prelude::*;
///
/// # async fn example() -> BlobResult<()> {
/// let client = UrlBlobClient::new();
/// let blob = client.from_url("https://bucket.s3.eu-west-1.amazonaws.com/data.txt");
/// let stats = blob.stat().await?;
/// println!("{} bytes", stats.size()?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct UrlBlobClient {
    transport: Arc<dyn HttpTransport>,
}

impl UrlBlobClient {
    /// Create a client with the default reqwest transport.
    pub fn new() -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::new()),
        }
    }

    /// Create a client over a custom transport.
    pub fn with_transport<T: HttpTransport + 'static>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Create a blob handle, auto-detecting the provider from the URL.
    pub fn from_url<S: Into<String>>(&self, url: S) -> UrlBlob {
        UrlBlob::new(url, Arc::clone(&self.transport))
    }

    /// Create a blob handle with an explicit provider override.
    pub fn from_url_with_provider<S: Into<String>>(&self, url: S, provider: Provider) -> UrlBlob {
        UrlBlob::with_provider(url, Arc::clone(&self.transport), provider)
    }
}

impl Default for UrlBlobClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UrlBlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlBlobClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_inherit_detection_and_overrides() {
        let client = UrlBlobClient::new();
        let blob = client.from_url("https://account.blob.core.windows.net/c/b");
        assert_eq!(blob.provider(), Provider::Azure);

        let blob = client.from_url_with_provider("https://example.com/x", Provider::S3);
        assert_eq!(blob.provider(), Provider::S3);
    }
}
