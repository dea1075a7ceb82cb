use thiserror::Error;

use crate::provider::Provider;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Classification of a server-reported failure, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// The bucket/container does not exist (S3/Azure only; generic and GCP
    /// responses carry no container-level detail).
    ContainerNotFound,
    /// The blob itself does not exist.
    BlobNotFound,
    /// The request was rejected for authentication/authorization reasons.
    AuthenticationFailed,
    /// Server-side failure (5xx); a caller's retry policy may reattempt.
    Retryable,
    /// Any other failure; retrying will not help.
    NonRetryable,
}

/// A failed HTTP exchange as reported by the storage provider.
///
/// Built once per failed exchange by [`crate::classify::classify`] and
/// surfaced immediately; never stored or mutated afterward. Always carries
/// the original status code and raw body so callers can fall back to manual
/// inspection.
#[derive(Debug, Clone)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub provider: Provider,
    pub status: u16,
    /// HTTP reason phrase, when the transport exposes one.
    pub reason: Option<String>,
    /// Provider-supplied error message (e.g. the XML `<Message>` element).
    pub message: Option<String>,
    /// Provider-specific detail: the S3 error `Code` or Azure's
    /// `AuthenticationErrorDetail`, captured on authentication failures.
    pub extra_info: Option<String>,
    /// The response body, decoded lossily, verbatim.
    pub raw_body: Option<String>,
}

impl RemoteError {
    /// Whether a caller's retry policy should consider reattempting.
    pub fn is_retryable(&self) -> bool {
        self.kind == RemoteErrorKind::Retryable
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(reason) = &self.reason {
            write!(f, "{reason}")?;
        } else if let Some(message) = &self.message {
            write!(f, "{message}")?;
        } else if let Some(raw) = &self.raw_body {
            write!(f, "{raw}")?;
        } else {
            write!(f, "{}", self.status)?;
        }
        if let Some(extra) = &self.extra_info {
            write!(f, " ({extra})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteError {}

/// Errors that can occur during blob operations.
///
/// Server-reported failures live in [`BlobError::Remote`]; everything else
/// is a local usage or transport problem and is never retryable.
#[derive(Error, Debug)]
pub enum BlobError {
    /// The server rejected or failed the request; see [`RemoteError`].
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A byte span and explicit start/end bounds were supplied together.
    #[error("cannot specify both a byte span and explicit start/end bounds")]
    ConflictingRange,

    /// A required response header was absent.
    #[error("{header} header is not present")]
    MissingHeader { header: &'static str },

    /// A response header was present but unparsable.
    #[error("invalid {header} header: {value}")]
    InvalidHeader { header: &'static str, value: String },

    /// An unrecognized provider name was supplied.
    #[error("invalid provider: {name} (valid: s3, gcp, azure, generic)")]
    InvalidProvider { name: String },

    /// The underlying HTTP transport failed before a response arrived.
    #[error("transport error: {source}")]
    Transport {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O failure while reading a response body stream.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Blob content was requested as text but is not valid UTF-8.
    /// The boundary-resolving accessors never produce this.
    #[error("invalid UTF-8 in blob content: {source}")]
    Utf8 {
        #[from]
        source: std::str::Utf8Error,
    },
}

impl BlobError {
    /// Create a transport error from any error type
    pub fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            source: Box::new(error),
        }
    }

    /// Create a missing header error
    pub fn missing_header(header: &'static str) -> Self {
        Self::MissingHeader { header }
    }

    /// Create an invalid header error
    pub fn invalid_header<S: Into<String>>(header: &'static str, value: S) -> Self {
        Self::InvalidHeader {
            header,
            value: value.into(),
        }
    }

    /// Create an invalid provider error
    pub fn invalid_provider<S: Into<String>>(name: S) -> Self {
        Self::InvalidProvider { name: name.into() }
    }

    /// The server-reported error, if that is what this is.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(e) => Some(e),
            _ => None,
        }
    }

    /// Whether a caller's retry policy should consider reattempting.
    /// Local usage errors are never retryable.
    pub fn is_retryable(&self) -> bool {
        self.remote().is_some_and(RemoteError::is_retryable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(kind: RemoteErrorKind) -> RemoteError {
        RemoteError {
            kind,
            provider: Provider::Generic,
            status: 503,
            reason: None,
            message: None,
            extra_info: None,
            raw_body: None,
        }
    }

    #[test]
    fn display_prefers_reason_then_message_then_raw() {
        let mut e = remote(RemoteErrorKind::Retryable);
        e.raw_body = Some("<xml/>".into());
        assert_eq!(e.to_string(), "<xml/>");
        e.message = Some("slow down".into());
        assert_eq!(e.to_string(), "slow down");
        e.reason = Some("Service Unavailable".into());
        assert_eq!(e.to_string(), "Service Unavailable");
        e.extra_info = Some("SlowDown".into());
        assert_eq!(e.to_string(), "Service Unavailable (SlowDown)");
    }

    #[test]
    fn display_falls_back_to_status() {
        assert_eq!(remote(RemoteErrorKind::Retryable).to_string(), "503");
    }

    #[test]
    fn only_remote_retryable_errors_are_retryable() {
        assert!(BlobError::from(remote(RemoteErrorKind::Retryable)).is_retryable());
        assert!(!BlobError::from(remote(RemoteErrorKind::NonRetryable)).is_retryable());
        assert!(!BlobError::ConflictingRange.is_retryable());
    }
}
