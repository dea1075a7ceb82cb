//! Boundary-safe UTF-8 decoding of byte-range fragments.
//!
//! An arbitrary byte range can cut a multi-byte UTF-8 code point at either
//! edge. Two complementary policies repair that: [`grow_to_valid`] fetches
//! extra bytes outward through a [`FragmentSource`] (bounded, lossless when
//! it succeeds), and [`shrink_to_valid`] discards undecodable edge bytes
//! without any further I/O.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::BlobResult;
use crate::range::ByteRange;

/// A UTF-8 code point is at most 4 bytes, so at most 3 extra bytes can ever
/// complete a cut sequence on a given edge; the counters abort at 4.
const MAX_EXTENSION: u8 = 4;

/// Why a strict UTF-8 decode attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailureKind {
    /// The buffer begins with a byte that cannot start a code point — the
    /// first included byte is a continuation of a code point that started
    /// before the buffer.
    InvalidStart,
    /// The buffer ends mid-sequence — the last code point's continuation
    /// bytes were cut off.
    UnexpectedEnd,
    /// An invalid byte strictly inside the buffer; a genuine encoding
    /// error, not a boundary artifact.
    InvalidMiddle,
}

/// Structured decode failure, replacing reliance on error message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeFailure {
    pub kind: DecodeFailureKind,
    /// Byte offset where the failure begins.
    pub offset: usize,
    /// Length of the invalid byte run; `None` when the input simply ended
    /// mid-sequence.
    pub error_len: Option<usize>,
}

/// Attempt a strict UTF-8 decode, classifying any failure by position.
pub fn try_decode(bytes: &[u8]) -> Result<&str, DecodeFailure> {
    std::str::from_utf8(bytes).map_err(|e| {
        let offset = e.valid_up_to();
        let kind = match e.error_len() {
            None => DecodeFailureKind::UnexpectedEnd,
            Some(_) if offset == 0 => DecodeFailureKind::InvalidStart,
            Some(_) => DecodeFailureKind::InvalidMiddle,
        };
        DecodeFailure {
            kind,
            offset,
            error_len: e.error_len(),
        }
    })
}

/// Fetch abstraction the growing resolver needs: one extra byte at a given
/// offset, and the blob's total size (requested lazily, at most once per
/// resolution).
#[async_trait]
pub trait FragmentSource: Send + Sync {
    /// Fetch the byte at `offset` (as a one-byte ranged read).
    async fn byte_at(&self, offset: u64) -> BlobResult<Bytes>;

    /// Total size of the blob in bytes.
    async fn size(&self) -> BlobResult<u64>;
}

/// Decode a fragment fetched for `range`, extending outward through
/// `source` when a multi-byte code point was cut at either edge.
///
/// Extension is bounded: at most 3 extra single-byte fetches per edge, never
/// past the blob's boundaries. When extension cannot succeed, the
/// **original** fragment is decoded with lossy replacement — partial
/// extensions are discarded so the fallback is deterministic regardless of
/// how far extension got.
pub async fn grow_to_valid<S>(source: &S, range: ByteRange, fragment: Bytes) -> BlobResult<String>
where
    S: FragmentSource + ?Sized,
{
    // A whole-object fetch has no edge to extend past; any decode failure
    // is a genuine encoding error.
    if range.is_full() {
        return Ok(String::from_utf8_lossy(&fragment).into_owned());
    }

    let original = fragment.clone();
    let mut buf = fragment.to_vec();
    let mut left_extension: u8 = 0;
    let mut right_extension: u8 = 0;
    let mut blob_size: Option<u64> = None;

    loop {
        let failure = match try_decode(&buf) {
            Ok(s) => return Ok(s.to_owned()),
            Err(f) => f,
        };

        match failure.kind {
            DecodeFailureKind::InvalidStart => {
                left_extension += 1;
                // Cannot extend before the start of the blob, and a range
                // starting at an unspecified offset already begins at 0.
                let Some(start) = range.start else { break };
                if u64::from(left_extension) > start || left_extension >= MAX_EXTENSION {
                    break;
                }
                let pos = start - u64::from(left_extension);
                trace!(pos, "extending fragment leftward");
                let byte = source.byte_at(pos).await?;
                let mut extended = Vec::with_capacity(byte.len() + buf.len());
                extended.extend_from_slice(&byte);
                extended.extend_from_slice(&buf);
                buf = extended;
            }
            DecodeFailureKind::UnexpectedEnd => {
                right_extension += 1;
                let size = match blob_size {
                    Some(size) => size,
                    None => {
                        let size = source.size().await?;
                        blob_size = Some(size);
                        size
                    }
                };
                // An unbounded range already reaches the end of the blob.
                let Some(end) = range.end else { break };
                // Checked arithmetic: the caller's end bound is not
                // validated locally and may sit anywhere in u64.
                let Some(reach) = end.checked_add(u64::from(right_extension) + 1) else {
                    break;
                };
                if reach >= size || right_extension >= MAX_EXTENSION {
                    break;
                }
                let pos = end + u64::from(right_extension);
                trace!(pos, "extending fragment rightward");
                let byte = source.byte_at(pos).await?;
                buf.extend_from_slice(&byte);
            }
            DecodeFailureKind::InvalidMiddle => break,
        }
    }

    debug!(
        left_extension,
        right_extension, "extension gave up; decoding original fragment lossily"
    );
    Ok(String::from_utf8_lossy(&original).into_owned())
}

/// Decode a fragment by discarding undecodable bytes at either edge.
///
/// Performs no I/O: boundary bytes of a cut code point are silently dropped.
/// An invalid byte strictly inside the fragment falls back to lossy
/// replacement of what remains.
pub fn shrink_to_valid(fragment: &[u8]) -> String {
    let mut buf = fragment;
    loop {
        let failure = match try_decode(buf) {
            Ok(s) => return s.to_owned(),
            Err(f) => f,
        };
        let bad_end = failure.offset + failure.error_len.unwrap_or(buf.len() - failure.offset);
        if failure.offset == 0 {
            buf = &buf[bad_end..];
        } else if bad_end == buf.len() {
            buf = &buf[..failure.offset];
        } else {
            return String::from_utf8_lossy(buf).into_owned();
        }
    }
}
