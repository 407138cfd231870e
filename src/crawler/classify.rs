/// Number of leading bytes inspected by [`looks_like_html`]
pub const SAMPLE_LEN: usize = 4096;

/// Minimum share of printable bytes in the sample
const MIN_PRINTABLE_RATIO: f64 = 0.6;

const HTML_MARKERS: [&str; 5] = ["<!doctype", "<html", "<head", "<title", "<meta"];

/// Cheap test for whether decoded bytes look like an HTML document
///
/// Only the first [`SAMPLE_LEN`] bytes are inspected. At least 60% of them
/// must be printable ASCII, tab, newline or carriage return, and the
/// lowercased sample must contain one of `<!doctype`, `<html`, `<head`,
/// `<title` or `<meta`.
///
/// # Examples
///
/// ```
/// use homepage_harvest::crawler::looks_like_html;
///
/// assert!(looks_like_html(b"<!DOCTYPE html><html><head><title>x</title></head></html>"));
/// assert!(!looks_like_html(&[0u8; 512]));
/// assert!(!looks_like_html(b"{\"json\": true}"));
/// ```
pub fn looks_like_html(decoded: &[u8]) -> bool {
    if decoded.is_empty() {
        return false;
    }

    let sample = &decoded[..decoded.len().min(SAMPLE_LEN)];

    let printable = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || matches!(b, b'\t' | b'\n' | b'\r'))
        .count();
    if (printable as f64) / (sample.len() as f64) < MIN_PRINTABLE_RATIO {
        return false;
    }

    let text = String::from_utf8_lossy(sample).to_lowercase();
    HTML_MARKERS.iter().any(|marker| text.contains(marker))
}
