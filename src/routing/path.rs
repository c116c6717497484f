//! Path segmentation and canonical cache keys.
//!
//! # Responsibilities
//! - Split an escaped request path into decoded segments
//! - Produce the canonical cache key for a segment sequence
//!
//! # Design Decisions
//! - Empty segments are dropped, so `//a/b/` and `/a/b` are the same path
//! - A `%` must be followed by two hex digits, anything else is rejected
//! - Segments are `String`s, so an escape sequence that decodes to invalid
//!   UTF-8 (e.g. `%ff`) is rejected as `DecodeFailed` rather than passed on
//!   as raw bytes
//! - Canonical keys re-encode segments, so differently escaped requests that
//!   decode to the same segments share one cache entry

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::CacheError;

/// Characters left unescaped inside a canonical path segment.
///
/// Unreserved characters plus the sub-delimiters that are safe inside a
/// single segment. `/`, `;`, `,` and `?` are always escaped.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// Split a raw escaped path into decoded segments.
pub fn decode(raw_path: &str) -> Result<Vec<String>, CacheError> {
    raw_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(decode_segment)
        .collect()
}

fn decode_segment(segment: &str) -> Result<String, CacheError> {
    let malformed = || CacheError::DecodeFailed {
        segment: segment.to_string(),
    };

    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(malformed());
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| malformed())
}

/// Build the canonical cache key for a segment sequence.
///
/// Always starts with `/`; an empty sequence yields `/`.
pub fn canonicalize<S: AsRef<str>>(segments: &[S]) -> String {
    let mut key = String::with_capacity(segments.iter().map(|s| s.as_ref().len() + 1).sum());
    for segment in segments.iter().map(|s| s.as_ref()).filter(|s| !s.is_empty()) {
        key.push('/');
        key.extend(utf8_percent_encode(segment, SEGMENT));
    }
    if key.is_empty() {
        key.push('/');
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_collapses_slashes() {
        assert_eq!(decode("//greet///bob/").unwrap(), vec!["greet", "bob"]);
        assert!(decode("/").unwrap().is_empty());
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_percent_sequences() {
        assert_eq!(decode("/a%20b/c%2Fd").unwrap(), vec!["a b", "c/d"]);
        assert_eq!(decode("/caf%C3%A9").unwrap(), vec!["café"]);
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        match decode("/ok/%ff%fe") {
            Err(CacheError::DecodeFailed { segment }) => assert_eq!(segment, "%ff%fe"),
            other => panic!("expected DecodeFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for raw in ["/bad%", "/bad%2", "/bad%zz", "/ok/%G1", "/%ff"] {
            match decode(raw) {
                Err(CacheError::DecodeFailed { .. }) => {}
                other => panic!("expected DecodeFailed for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_canonicalize() {
        let empty: [&str; 0] = [];
        assert_eq!(canonicalize(&empty), "/");
        assert_eq!(canonicalize(&["greet", "bob"]), "/greet/bob");
        assert_eq!(canonicalize(&["a b", "c/d"]), "/a%20b/c%2Fd");
        assert_eq!(canonicalize(&["k=v&x+y@h:1"]), "/k=v&x+y@h:1");
    }

    #[test]
    fn test_equivalent_escapes_share_a_key() {
        let plain = decode("/greet/bob").unwrap();
        let escaped = decode("/gr%65et//%62ob/").unwrap();
        assert_eq!(canonicalize(&plain), canonicalize(&escaped));
    }

    #[test]
    fn test_decode_inverts_canonicalize() {
        let samples: Vec<Vec<&str>> = vec![
            vec![],
            vec!["plain"],
            vec!["with space", "slash/inside", "semi;colon"],
            vec!["100%", "?query", "#frag", "ünïcödé"],
        ];
        for segments in samples {
            let decoded = decode(&canonicalize(&segments)).unwrap();
            assert_eq!(decoded, segments);
        }
    }
}
