//! Content-Encoding decoding with repair fallbacks
//!
//! Responses are fetched without transparent decompression, so the declared
//! `Content-Encoding` is handled here. Servers frequently lie about it: gzip
//! bodies labelled as brotli, truncated gzip members, raw deflate sent as
//! zlib. Each path falls back to a repair attempt before giving up, and the
//! gzip and brotli paths hand back the raw bytes rather than losing the page.

use flate2::read::{DeflateDecoder, GzDecoder, MultiGzDecoder, ZlibDecoder};
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};

/// Outcome of decoding one response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingDecision {
    /// Decoded bytes, or `None` when the body cannot be used at all
    pub bytes: Option<Vec<u8>>,

    /// Informational note about a repair or a fatal problem
    pub note: Option<String>,
}

impl EncodingDecision {
    fn clean(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            note: None,
        }
    }

    fn repaired(bytes: Vec<u8>, note: String) -> Self {
        Self {
            bytes: Some(bytes),
            note: Some(note),
        }
    }

    fn fatal(note: String) -> Self {
        Self {
            bytes: None,
            note: Some(note),
        }
    }

    /// True when the body is unusable and the candidate must be treated as failed
    pub fn is_fatal(&self) -> bool {
        self.bytes.is_none()
    }
}

/// Decodes `raw` according to the declared encoding `label`
///
/// | Label | Behaviour |
/// |-------|-----------|
/// | none, empty, `identity` | passthrough |
/// | contains `gzip` | gunzip, then single-member gunzip, else raw bytes + note |
/// | contains `deflate` | zlib, then raw deflate, else fatal |
/// | contains `br` | brotli, then the gzip path, else raw bytes + note |
/// | anything else | fatal `unknown encoding: <label>` |
///
/// This function never panics; an internal panic is reported as a fatal
/// `enc:decode-error` note.
///
/// # Examples
///
/// ```
/// use homepage_harvest::crawler::decode_body;
///
/// let decision = decode_body(None, b"<html></html>");
/// assert_eq!(decision.bytes.as_deref(), Some(&b"<html></html>"[..]));
/// assert!(decision.note.is_none());
///
/// let decision = decode_body(Some("compress"), b"...");
/// assert!(decision.is_fatal());
/// ```
pub fn decode_body(label: Option<&str>, raw: &[u8]) -> EncodingDecision {
    let label = label.map(|l| l.trim().to_lowercase()).unwrap_or_default();

    match panic::catch_unwind(AssertUnwindSafe(|| decode_labelled(&label, raw))) {
        Ok(decision) => decision,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            EncodingDecision::fatal(format!("enc:decode-error:{}", message))
        }
    }
}

fn decode_labelled(label: &str, raw: &[u8]) -> EncodingDecision {
    if label.is_empty() || label == "identity" {
        return EncodingDecision::clean(raw.to_vec());
    }

    if label.contains("gzip") {
        return match gunzip_repair(raw) {
            Some(bytes) => EncodingDecision::clean(bytes),
            None => EncodingDecision::repaired(raw.to_vec(), "gzip-raw".to_string()),
        };
    }

    if label.contains("deflate") {
        return match read_all(ZlibDecoder::new(raw)) {
            Ok(bytes) => EncodingDecision::clean(bytes),
            Err(_) => match read_all(DeflateDecoder::new(raw)) {
                Ok(bytes) => EncodingDecision::clean(bytes),
                Err(e) => EncodingDecision::fatal(format!("deflate-bad:{}", error_kind(&e))),
            },
        };
    }

    if label.contains("br") {
        return match read_all(brotli::Decompressor::new(raw, 4096)) {
            Ok(bytes) => EncodingDecision::clean(bytes),
            Err(e) => match gunzip_repair(raw) {
                Some(bytes) => {
                    EncodingDecision::repaired(bytes, format!("br-fallback-gzip:{}", error_kind(&e)))
                }
                None => EncodingDecision::repaired(
                    raw.to_vec(),
                    format!("br-fallback-raw:{}", error_kind(&e)),
                ),
            },
        };
    }

    EncodingDecision::fatal(format!("unknown encoding: {}", label))
}

/// Gunzips `raw`, tolerating trailing garbage after the first member
///
/// Returns `None` when neither a strict multi-member decode nor a
/// single-member decode succeeds.
pub fn gunzip_repair(raw: &[u8]) -> Option<Vec<u8>> {
    read_all(MultiGzDecoder::new(raw))
        .or_else(|_| read_all(GzDecoder::new(raw)))
        .ok()
}

fn read_all<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

fn error_kind(err: &io::Error) -> String {
    format!("{:?}", err.kind())
}
