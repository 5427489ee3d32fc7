//! Deterministic parameter canonicalization.
//!
//! The canonical string is the exact byte sequence that gets signed:
//! ```text
//! k1=v1&k2=v2&...
//! ```
//! with every key and value percent-encoded using the URI component rules
//! browsers apply in `encodeURIComponent`.
//!
//! Keys are ordered by UTF-16 code units, as JavaScript's default sort does.
//! This matches byte order except when keys mix characters in
//! U+E000..=U+FFFF with characters outside the Basic Multilingual Plane.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;

/// Characters left untouched by URI component encoding.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single URI component.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Sorted parameters plus their serialized query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalParams {
    /// Parameters keyed by name.
    pub params: BTreeMap<String, String>,
    /// `key=value` pairs joined by `&`, keys in UTF-16 code unit order.
    pub query: String,
}

/// Sort a parameter set and serialize it.
///
/// Accepts any collection of pairs; values are converted with `ToString` and
/// nothing else. If a key appears twice the last value wins.
pub fn canonicalize<I, K, V>(params: I) -> CanonicalParams
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: ToString,
{
    let params = sort_params(params);
    let query = build_query_string(&params);
    CanonicalParams { params, query }
}

/// Collect pairs into a map keyed by name.
pub fn sort_params<I, K, V>(params: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: ToString,
{
    params
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.to_string()))
        .collect()
}

/// Serialize parameters in canonical key order. Empty input yields an empty string.
pub fn build_query_string(params: &BTreeMap<String, String>) -> String {
    let mut entries: Vec<_> = params.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.encode_utf16().cmp(b.encode_utf16()));

    let mut query = String::new();
    for (key, value) in entries {
        if !query.is_empty() {
            query.push('&');
        }
        query.extend(utf8_percent_encode(key, URI_COMPONENT));
        query.push('=');
        query.extend(utf8_percent_encode(value, URI_COMPONENT));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_params() {
        let canonical = canonicalize(Vec::<(&str, &str)>::new());
        assert!(canonical.params.is_empty());
        assert_eq!(canonical.query, "");
    }

    #[test]
    fn test_keys_sorted() {
        let canonical = canonicalize([("symbol", "BTCUSDT"), ("side", "BUY"), ("quantity", "1")]);
        assert_eq!(canonical.query, "quantity=1&side=BUY&symbol=BTCUSDT");
        let keys: Vec<_> = canonical.params.keys().cloned().collect();
        assert_eq!(keys, vec!["quantity", "side", "symbol"]);
    }

    #[test]
    fn test_permutations_are_byte_identical() {
        let pairs = [
            ("type", "LIMIT"),
            ("price", "42000.5"),
            ("symbol", "BTCUSDT"),
            ("timeInForce", "GTC"),
            ("side", "SELL"),
        ];
        let expected = canonicalize(pairs).query;

        let mut reversed = pairs;
        reversed.reverse();
        assert_eq!(canonicalize(reversed).query, expected);

        let mut rotated = pairs;
        rotated.rotate_left(2);
        assert_eq!(canonicalize(rotated).query, expected);

        let map: HashMap<_, _> = pairs.into_iter().collect();
        assert_eq!(canonicalize(&map).query, expected);
    }

    #[test]
    fn test_uppercase_sorts_before_lowercase() {
        let canonical = canonicalize([("b", "1"), ("B", "2"), ("a", "3")]);
        assert_eq!(canonical.query, "B=2&a=3&b=1");
    }

    #[test]
    fn test_supplementary_plane_sorts_before_high_bmp() {
        // U+1F600 is a surrogate pair (0xD83D ...), below U+FF21 in UTF-16
        let canonical = canonicalize([("\u{FF21}", "1"), ("\u{1F600}", "2")]);
        assert_eq!(canonical.query, "%F0%9F%98%80=2&%EF%BC%A1=1");
    }

    #[test]
    fn test_percent_encoding_matches_uri_component() {
        let canonical = canonicalize([("note", "a b&c=d/é"), ("safe", "-_.!~*'()")]);
        assert_eq!(
            canonical.query,
            "note=a%20b%26c%3Dd%2F%C3%A9&safe=-_.!~*'()"
        );
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("a+b c"), "a%2Bb%20c");
        assert_eq!(encode_component("0f3a-9"), "0f3a-9");
    }

    #[test]
    fn test_keys_are_encoded_too() {
        let canonical = canonicalize([("odd key", "v")]);
        assert_eq!(canonical.query, "odd%20key=v");
    }

    #[test]
    fn test_numeric_values_stringified() {
        let canonical = canonicalize([("recvWindow", 5000_i64), ("timestamp", 1_700_000_000_000)]);
        assert_eq!(canonical.query, "recvWindow=5000&timestamp=1700000000000");
    }

    #[test]
    fn test_empty_values_kept() {
        let canonical = canonicalize([("a", ""), ("b", "x")]);
        assert_eq!(canonical.query, "a=&b=x");
    }

    #[test]
    fn test_no_trailing_delimiter() {
        let canonical = canonicalize([("only", "one")]);
        assert!(!canonical.query.ends_with('&'));
    }
}
