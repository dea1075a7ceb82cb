use http::HeaderMap;
use serde::Serialize;

use crate::error::{BlobError, BlobResult};

/// Blob metadata derived from response headers.
///
/// Produced by a `stat` call; every field is optional because plain HTTP
/// origins are free to omit headers. Absence only becomes an error when a
/// non-`_or_none` accessor is used.
#[derive(Debug, Clone)]
pub struct BlobStats {
    headers: HeaderMap,
}

impl BlobStats {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// Total blob size in bytes.
    ///
    /// Prefers the total of a `Content-Range: bytes a-b/total` header over
    /// `Content-Length`: on a ranged GET the latter reports only the
    /// fragment size, while `Content-Range` carries the full object size.
    pub fn size(&self) -> BlobResult<u64> {
        self.size_or_none()?
            .ok_or_else(|| BlobError::missing_header("Content-Length"))
    }

    /// Like [`BlobStats::size`], but absence yields `Ok(None)`.
    /// A header that is present but unparsable is still an error.
    pub fn size_or_none(&self) -> BlobResult<Option<u64>> {
        if let Some(content_range) = self.header_str("content-range") {
            let total = content_range.rsplit('/').next().unwrap_or(content_range);
            return total
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| BlobError::invalid_header("Content-Range", content_range));
        }
        match self.header_str("content-length") {
            Some(len) => len
                .parse()
                .map(Some)
                .map_err(|_| BlobError::invalid_header("Content-Length", len)),
            None => Ok(None),
        }
    }

    /// The blob's `Content-Type`.
    pub fn content_type(&self) -> BlobResult<String> {
        self.content_type_or_none()
            .ok_or_else(|| BlobError::missing_header("Content-Type"))
    }

    pub fn content_type_or_none(&self) -> Option<String> {
        self.header_str("content-type").map(str::to_owned)
    }

    /// The blob's `Last-Modified` date, as the raw header string.
    pub fn last_modified(&self) -> BlobResult<String> {
        self.last_modified_or_none()
            .ok_or_else(|| BlobError::missing_header("Last-Modified"))
    }

    pub fn last_modified_or_none(&self) -> Option<String> {
        self.header_str("last-modified").map(str::to_owned)
    }

    /// Serializable snapshot of the available stats.
    pub fn summary(&self) -> BlobResult<StatsSummary> {
        Ok(StatsSummary {
            size: self.size_or_none()?,
            content_type: self.content_type_or_none(),
            last_modified: self.last_modified_or_none(),
        })
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Flattened stats for serialization; absent fields are skipped.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}
