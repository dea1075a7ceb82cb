use once_cell::sync::Lazy;
use regex::RegexSet;
use std::str::FromStr;

use crate::error::BlobError;

/// S3-compatible hostname patterns (AWS regional/global endpoints plus
/// known third-party S3 clones such as Hetzner object storage).
static S3_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"\.s3\.[a-z0-9-]+\.amazonaws\.com",
        r"s3\.amazonaws\.com",
        r"\.your-objectstorage\.com",
    ])
    .expect("invalid S3 hostname patterns")
});

static GCP_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"\.storage\.googleapis\.com",
        r"storage\.cloud\.google\.com",
    ])
    .expect("invalid GCP hostname patterns")
});

static AZURE_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([r"\.blob\.core\.windows\.net"]).expect("invalid Azure hostname patterns")
});

/// Storage provider convention governing request headers and error format
/// for a given blob URL.
///
/// Detected from the URL's hostname at handle construction, or supplied
/// explicitly by the caller. Never changes over a handle's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// AWS S3 or an S3-compatible service (XML error bodies).
    S3,
    /// Google Cloud Storage (status-code-only error handling).
    Gcp,
    /// Azure Blob Storage (XML error bodies, `x-ms-blob-type` on writes).
    Azure,
    /// Any other HTTP origin.
    Generic,
}

impl Provider {
    /// Detect the provider from a URL string.
    ///
    /// Matches S3 patterns first, then GCP, then Azure; the first hit wins
    /// and anything unmatched is [`Provider::Generic`]. Pure string
    /// matching, no network access.
    pub fn detect(url: &str) -> Self {
        if S3_PATTERNS.is_match(url) {
            Provider::S3
        } else if GCP_PATTERNS.is_match(url) {
            Provider::Gcp
        } else if AZURE_PATTERNS.is_match(url) {
            Provider::Azure
        } else {
            Provider::Generic
        }
    }

    /// Lowercase canonical name, e.g. for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::S3 => "s3",
            Provider::Gcp => "gcp",
            Provider::Azure => "azure",
            Provider::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = BlobError;

    /// Parse a provider name, accepting common aliases
    /// (`aws`/`aws_s3` for S3, `google` for GCP, `az`/`windows` for Azure).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s3" | "aws" | "aws_s3" => Ok(Provider::S3),
            "gcp" | "google" => Ok(Provider::Gcp),
            "azure" | "az" | "windows" => Ok(Provider::Azure),
            "generic" => Ok(Provider::Generic),
            other => Err(BlobError::invalid_provider(other)),
        }
    }
}
