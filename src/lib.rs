//! # dog-urlblob: range-aware blob access over plain HTTP URLs
//!
//! `dog-urlblob` reads and writes byte ranges of remote objects ("blobs")
//! that live behind ordinary HTTP URLs — S3, Google Cloud Storage, Azure
//! Blob Storage, or any generic origin — without pulling in a cloud SDK.
//! URLs are assumed to be already authorized (e.g. pre-signed).
//!
//! ## Key Features
//!
//! - **Provider auto-detection**: the storage convention is inferred from
//!   the URL's hostname and drives request headers and error parsing
//! - **Boundary-safe UTF-8 reads**: a byte range that cuts a multi-byte
//!   code point can be repaired by growing the range outward or shrinking
//!   the decoded window inward
//! - **Typed error taxonomy**: XML error bodies (S3/Azure) and bare status
//!   codes (GCS/generic) map to a small set of variants a retry policy can
//!   branch on
//! - **Transport agnostic**: all I/O goes through an injected
//!   [`HttpTransport`]; a pooled reqwest backend is included
//! - **Streaming**: chunk and line streams pass the response body through
//!   without buffering
//!
//! ## Quick Start
//!
//! ```no_run
//! use dog_urlblob::prelude::*;
//!
//! # async fn example() -> BlobResult<()> {
//! let client = UrlBlobClient::new();
//! let blob = client.from_url("https://bucket.s3.eu-west-1.amazonaws.com/logs.txt");
//!
//! // Metadata via a single-byte ranged GET
//! let stats = blob.stat().await?;
//! println!("{} bytes of {}", stats.size()?, stats.content_type()?);
//!
//! // Fetch a slice; repair any code point cut at the edges
//! let text = blob.grow_to_valid_string(1024..2048).await?;
//!
//! // Branch on the typed error taxonomy
//! match blob.get(0..512).await {
//!     Ok(bytes) => println!("{} bytes", bytes.len()),
//!     Err(e) if e.is_retryable() => println!("server-side failure, retry later"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │     UrlBlob      │  ← headers → request → classify → decode
//! ├──────────────────┤
//! │  HttpTransport   │  ← pooling, TLS, timeouts (injected)
//! └──────────────────┘
//! ```
//!
//! The pure pieces — provider detection, range encoding, error
//! classification, and the UTF-8 boundary resolver — never touch the
//! network and are exposed for direct use and testing.

mod blob;
mod classify;
mod client;
pub mod decode;
mod error;
mod provider;
mod range;
mod stat;
pub mod transport;

// Re-export main types for clean API
pub use blob::{LineStream, UrlBlob};
pub use classify::classify;
pub use client::{ReqwestTransport, UrlBlobClient};
pub use decode::{
    grow_to_valid, shrink_to_valid, try_decode, DecodeFailure, DecodeFailureKind, FragmentSource,
};
pub use error::{BlobError, BlobResult, RemoteError, RemoteErrorKind};
pub use provider::Provider;
pub use range::{ByteRange, RangeSpec};
pub use stat::{BlobStats, StatsSummary};
pub use transport::{
    ByteStream, HttpTransport, RequestBody, TransportRequest, TransportResponse,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobError, BlobResult, BlobStats, Provider, RangeSpec, UrlBlob, UrlBlobClient,
    };
}
