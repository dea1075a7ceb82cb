//! Provider-aware classification of failed HTTP exchanges.
//!
//! S3 and Azure report structured XML error bodies; GCP and generic origins
//! get status-code-only treatment. Classification is total: malformed or
//! non-XML bodies degrade to the coarser status-only mapping with the raw
//! body retained verbatim, never a secondary failure.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{RemoteError, RemoteErrorKind};
use crate::provider::Provider;

/// Classify a failed HTTP exchange into a [`RemoteError`].
///
/// Called only after an exchange completed with a non-success status. Pure
/// function of its inputs; performs no I/O and never fails.
pub fn classify(provider: Provider, status: u16, reason: Option<&str>, body: &[u8]) -> RemoteError {
    let fields = match provider {
        Provider::S3 | Provider::Azure => parse_error_fields(body).unwrap_or_default(),
        Provider::Gcp | Provider::Generic => ErrorFields::default(),
    };

    let kind = match provider {
        Provider::S3 => match status {
            404 if fields.code.as_deref() == Some("NoSuchBucket") => {
                RemoteErrorKind::ContainerNotFound
            }
            404 => RemoteErrorKind::BlobNotFound,
            403 => RemoteErrorKind::AuthenticationFailed,
            s if s >= 500 => RemoteErrorKind::Retryable,
            _ => RemoteErrorKind::NonRetryable,
        },
        Provider::Azure => match status {
            404 if fields.code.as_deref() == Some("ContainerNotFound") => {
                RemoteErrorKind::ContainerNotFound
            }
            404 => RemoteErrorKind::BlobNotFound,
            403 => RemoteErrorKind::AuthenticationFailed,
            s if s >= 500 => RemoteErrorKind::Retryable,
            _ => RemoteErrorKind::NonRetryable,
        },
        // No body parsing for these, so a container-level distinction is
        // not possible; 404 is always reported as the blob being absent.
        Provider::Gcp | Provider::Generic => match status {
            403 => RemoteErrorKind::AuthenticationFailed,
            404 => RemoteErrorKind::BlobNotFound,
            s if s >= 500 => RemoteErrorKind::Retryable,
            _ => RemoteErrorKind::NonRetryable,
        },
    };

    let extra_info = match (provider, kind) {
        // S3 surfaces the error code on auth failures; Azure has a
        // dedicated detail element for them.
        (Provider::S3, RemoteErrorKind::AuthenticationFailed) => fields.code.clone(),
        (Provider::Azure, RemoteErrorKind::AuthenticationFailed) => fields.auth_detail,
        _ => None,
    };

    let raw_body = if body.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(body).into_owned())
    };

    RemoteError {
        kind,
        provider,
        status,
        reason: reason.map(str::to_owned),
        message: fields.message,
        extra_info,
        raw_body,
    }
}

/// Structured fields pulled out of an S3/Azure XML error body.
#[derive(Debug, Default, Clone)]
struct ErrorFields {
    code: Option<String>,
    message: Option<String>,
    auth_detail: Option<String>,
}

/// Which element's text we are currently inside.
#[derive(Clone, Copy)]
enum Capture {
    Code,
    Message,
    AuthDetail,
}

/// Scan an XML document for `<Code>`, `<Message>` and
/// `<AuthenticationErrorDetail>` elements anywhere in the tree.
///
/// Returns `None` if the document is malformed — the caller then falls back
/// to status-only classification with no partial fields, matching the
/// all-or-nothing behavior of a whole-document parse.
fn parse_error_fields(body: &[u8]) -> Option<ErrorFields> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut fields = ErrorFields::default();
    let mut capture: Option<Capture> = None;
    // The pull reader reports Eof without error when elements are left
    // unclosed; track open elements so a truncated document is rejected
    // as a whole rather than honoring the fields seen before the cut.
    let mut depth: usize = 0;

    loop {
        match reader.read_event().ok()? {
            Event::Start(e) => {
                depth += 1;
                capture = match e.local_name().as_ref() {
                    b"Code" => Some(Capture::Code),
                    b"Message" => Some(Capture::Message),
                    b"AuthenticationErrorDetail" => Some(Capture::AuthDetail),
                    _ => None,
                };
            }
            Event::Text(e) => {
                if let Some(which) = capture {
                    let decoded = e.decode().ok()?;
                    let text = quick_xml::escape::unescape(&decoded).ok()?.into_owned();
                    let slot = match which {
                        Capture::Code => &mut fields.code,
                        Capture::Message => &mut fields.message,
                        Capture::AuthDetail => &mut fields.auth_detail,
                    };
                    // First occurrence wins.
                    slot.get_or_insert(text);
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1)?;
                capture = None;
            }
            Event::Eof => {
                if depth != 0 {
                    return None;
                }
                break;
            }
            _ => {}
        }
    }

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_no_such_bucket_is_container_not_found() {
        let body = b"<Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message></Error>";
        let err = classify(Provider::S3, 404, Some("Not Found"), body);
        assert_eq!(err.kind, RemoteErrorKind::ContainerNotFound);
        assert_eq!(
            err.message.as_deref(),
            Some("The specified bucket does not exist")
        );
    }

    #[test]
    fn s3_other_404_is_blob_not_found() {
        let body = b"<Error><Code>NoSuchKey</Code></Error>";
        let err = classify(Provider::S3, 404, None, body);
        assert_eq!(err.kind, RemoteErrorKind::BlobNotFound);
    }

    #[test]
    fn s3_403_carries_code_as_extra_info() {
        let body = b"<Error><Code>SignatureDoesNotMatch</Code><Message>denied</Message></Error>";
        let err = classify(Provider::S3, 403, Some("Forbidden"), body);
        assert_eq!(err.kind, RemoteErrorKind::AuthenticationFailed);
        assert_eq!(err.extra_info.as_deref(), Some("SignatureDoesNotMatch"));
        assert_eq!(err.to_string(), "Forbidden (SignatureDoesNotMatch)");
    }

    #[test]
    fn azure_container_not_found() {
        let body = b"<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>ContainerNotFound</Code><Message>The specified container does not exist.</Message></Error>";
        let err = classify(Provider::Azure, 404, None, body);
        assert_eq!(err.kind, RemoteErrorKind::ContainerNotFound);
    }

    #[test]
    fn azure_blob_not_found() {
        let body = b"<Error><Code>BlobNotFound</Code></Error>";
        let err = classify(Provider::Azure, 404, None, body);
        assert_eq!(err.kind, RemoteErrorKind::BlobNotFound);
    }

    #[test]
    fn azure_auth_detail_captured_on_403() {
        let body = b"<Error><Code>AuthenticationFailed</Code><AuthenticationErrorDetail>Signature did not match</AuthenticationErrorDetail></Error>";
        let err = classify(Provider::Azure, 403, None, body);
        assert_eq!(err.kind, RemoteErrorKind::AuthenticationFailed);
        assert_eq!(err.extra_info.as_deref(), Some("Signature did not match"));
    }

    #[test]
    fn azure_500_with_empty_body_is_retryable() {
        let err = classify(Provider::Azure, 500, None, b"");
        assert_eq!(err.kind, RemoteErrorKind::Retryable);
        assert_eq!(err.raw_body, None);
        assert_eq!(err.to_string(), "500");
    }

    #[test]
    fn nested_elements_are_found() {
        let body = b"<ErrorResponse><Error><Code>NoSuchBucket</Code></Error></ErrorResponse>";
        let err = classify(Provider::S3, 404, None, body);
        assert_eq!(err.kind, RemoteErrorKind::ContainerNotFound);
    }

    #[test]
    fn malformed_xml_degrades_to_status_only() {
        let body = b"<Error><Code>NoSuchBucket</Code>"; // truncated, never closed
        let err = classify(Provider::S3, 404, None, body);
        // All-or-nothing: the partially seen Code is discarded.
        assert_eq!(err.kind, RemoteErrorKind::BlobNotFound);
        assert_eq!(err.message, None);
        assert_eq!(err.raw_body.as_deref(), Some("<Error><Code>NoSuchBucket</Code>"));
    }

    #[test]
    fn truncated_xml_discards_fields_seen_before_the_cut() {
        // Both inner elements closed cleanly, but the document was cut
        // before </Error>: still treated as malformed as a whole.
        let body = b"<Error><Code>NoSuchBucket</Code><Message>gone</Message>";
        let err = classify(Provider::S3, 404, None, body);
        assert_eq!(err.kind, RemoteErrorKind::BlobNotFound);
        assert_eq!(err.message, None);
    }

    #[test]
    fn non_xml_body_is_kept_verbatim() {
        let err = classify(Provider::S3, 503, Some("Service Unavailable"), b"plain text");
        assert_eq!(err.kind, RemoteErrorKind::Retryable);
        assert_eq!(err.raw_body.as_deref(), Some("plain text"));
    }

    #[test]
    fn generic_provider_ignores_body() {
        let body = b"<Error><Code>NoSuchBucket</Code></Error>";
        let err = classify(Provider::Generic, 403, None, body);
        assert_eq!(err.kind, RemoteErrorKind::AuthenticationFailed);
        assert_eq!(err.message, None);

        // Container-level detail is never available without body parsing.
        let err = classify(Provider::Gcp, 404, None, body);
        assert_eq!(err.kind, RemoteErrorKind::BlobNotFound);
    }

    #[test]
    fn unclassified_4xx_is_non_retryable() {
        let err = classify(Provider::Generic, 416, Some("Range Not Satisfiable"), b"");
        assert_eq!(err.kind, RemoteErrorKind::NonRetryable);
        assert!(!err.is_retryable());
    }

    #[test]
    fn non_utf8_body_is_replaced_lossily() {
        let err = classify(Provider::Generic, 400, None, &[0xff, 0xfe, b'x']);
        assert_eq!(err.raw_body.as_deref(), Some("\u{fffd}\u{fffd}x"));
    }
}
