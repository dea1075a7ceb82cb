use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use http::HeaderValue;

use crate::error::{BlobError, BlobResult};

/// Inclusive byte interval over a blob's offsets.
///
/// `start: None` means "from the beginning"; `end: None` means "to the end
/// of the blob". Out-of-range values are not validated locally; the server
/// is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteRange {
    pub start: Option<u64>,
    /// Inclusive upper bound, matching HTTP `Range` semantics.
    pub end: Option<u64>,
}

impl ByteRange {
    /// The whole blob; produces no `Range` header.
    pub const FULL: ByteRange = ByteRange {
        start: None,
        end: None,
    };

    pub fn new(start: Option<u64>, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// True when neither bound is set.
    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Encode as an HTTP `Range` header value: `bytes=<start>-<end?>`.
    ///
    /// Returns `None` when the range covers the whole blob, in which case
    /// the header must be omitted entirely. An absent start defaults to 0;
    /// an absent end leaves the range open-ended (`bytes=5-`).
    pub fn header_value(&self) -> Option<HeaderValue> {
        if self.is_full() {
            return None;
        }
        let start = self.start.unwrap_or(0);
        let value = match self.end {
            Some(end) => format!("bytes={start}-{end}"),
            None => format!("bytes={start}-"),
        };
        // Digits, '=' and '-' are always valid header characters.
        HeaderValue::from_str(&value).ok()
    }
}

/// Caller-facing range specifier for read operations.
///
/// Accepts either a half-open span (Rust range syntax, end-exclusive) or
/// explicit inclusive `start`/`end` bounds — but never both at once:
/// [`RangeSpec::resolve`] rejects the combination before any network call
/// is made.
///
/// ```
/// use dog_urlblob::RangeSpec;
///
/// // Half-open span: bytes 0..10 → HTTP bytes=0-9
/// let spec = RangeSpec::from(0..10);
/// assert!(spec.resolve().is_ok());
///
/// // Explicit inclusive bounds: HTTP bytes=5-10
/// let spec = RangeSpec::new().with_start(5).with_end(10);
/// assert!(spec.resolve().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeSpec {
    span: Option<Span>,
    start: Option<u64>,
    end: Option<u64>,
}

/// Half-open `[start, stop)` span, either bound optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: Option<u64>,
    stop: Option<u64>,
}

impl RangeSpec {
    /// Specifier for the whole blob.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the explicit inclusive start bound.
    pub fn with_start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the explicit inclusive end bound.
    pub fn with_end(mut self, end: u64) -> Self {
        self.end = Some(end);
        self
    }

    /// Resolve into a canonical [`ByteRange`].
    ///
    /// Fails with [`BlobError::ConflictingRange`] if both a span and
    /// explicit bounds were supplied.
    pub fn resolve(&self) -> BlobResult<ByteRange> {
        if let Some(span) = self.span {
            if self.start.is_some() || self.end.is_some() {
                return Err(BlobError::ConflictingRange);
            }
            // Spans are end-exclusive; HTTP ranges are end-inclusive.
            return Ok(ByteRange::new(
                span.start,
                span.stop.map(|stop| stop.saturating_sub(1)),
            ));
        }
        Ok(ByteRange::new(self.start, self.end))
    }
}

impl From<Range<u64>> for RangeSpec {
    fn from(r: Range<u64>) -> Self {
        Self {
            span: Some(Span {
                start: Some(r.start),
                stop: Some(r.end),
            }),
            ..Self::default()
        }
    }
}

impl From<RangeFrom<u64>> for RangeSpec {
    fn from(r: RangeFrom<u64>) -> Self {
        Self {
            span: Some(Span {
                start: Some(r.start),
                stop: None,
            }),
            ..Self::default()
        }
    }
}

impl From<RangeTo<u64>> for RangeSpec {
    fn from(r: RangeTo<u64>) -> Self {
        Self {
            span: Some(Span {
                start: None,
                stop: Some(r.end),
            }),
            ..Self::default()
        }
    }
}

impl From<RangeFull> for RangeSpec {
    fn from(_: RangeFull) -> Self {
        Self::default()
    }
}

impl From<ByteRange> for RangeSpec {
    fn from(r: ByteRange) -> Self {
        Self {
            span: None,
            start: r.start,
            end: r.end,
        }
    }
}
