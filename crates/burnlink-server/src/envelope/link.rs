use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use super::ProtocolError;

/// Bytes escaped when an id is written as a path segment. Covers everything
/// a URL parser would split on, strip, or rewrite, plus `%` itself so that
/// decoding gives back the original id.
const ID_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Build `origin/id#key`.
///
/// The key rides in the fragment, which clients never send to the server, and
/// is written as-is. The id is percent-encoded as a single path segment.
/// A trailing `/` on `origin` is dropped so the separator is not doubled.
pub fn assemble_link(origin: &str, id: &str, key: &str) -> String {
    format!(
        "{}/{}#{}",
        origin.trim_end_matches('/'),
        utf8_percent_encode(id, ID_SEGMENT),
        key
    )
}

/// Split a secret link into `(id, key)`.
///
/// The key is the raw text after the first `#`, untouched by URL parsing.
/// The id is the last non-empty path segment, percent-decoded. A missing or
/// empty key is `MissingKey`; it is checked first so a link without a key is
/// rejected before anything else is looked at.
pub fn split_link(link: &str) -> Result<(String, String), ProtocolError> {
    let (base, key) = link.split_once('#').ok_or(ProtocolError::MissingKey)?;
    if key.is_empty() {
        return Err(ProtocolError::MissingKey);
    }

    let url = Url::parse(base).map_err(|e| ProtocolError::InvalidLink(e.to_string()))?;
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or(ProtocolError::MissingId)?;
    let id = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|e| ProtocolError::InvalidLink(e.to_string()))?;

    Ok((id.into_owned(), key.to_owned()))
}
