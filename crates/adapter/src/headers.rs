//! Header reconciliation between the raw server and `http::HeaderMap`.
//!
//! The raw server hands headers over as lowercase names mapped to either one
//! string or a list of strings. A list becomes one `HeaderMap` entry per item,
//! in order; a single string replaces whatever the name held before.

use http::{HeaderMap, HeaderName, HeaderValue};
use raw_http::protocol::{RawHeaderValue, RawHeaders};

use crate::AdapterError;

/// Builds a `HeaderMap` holding every header of `raw_headers`.
///
/// An empty [`RawHeaderValue::Multiple`] adds nothing, which is how a header
/// without a value is represented.
///
/// # Errors
///
/// Returns [`AdapterError::InvalidHeader`] when a name or value is not a legal HTTP header.
pub fn create_headers(raw_headers: &RawHeaders) -> Result<HeaderMap, AdapterError> {
    let mut headers = HeaderMap::with_capacity(raw_headers.len());

    for (name, value) in raw_headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| AdapterError::invalid_header(name, e))?;

        match value {
            RawHeaderValue::Single(value) => {
                headers.insert(header_name, header_value(name, value)?);
            }
            RawHeaderValue::Multiple(values) => {
                for value in values {
                    headers.append(header_name.clone(), header_value(name, value)?);
                }
            }
        }
    }

    Ok(headers)
}

/// Raw header values hold latin-1 text, each char is turned back into its byte.
fn header_value(name: &str, value: &str) -> Result<HeaderValue, AdapterError> {
    let bytes = value.chars().map(|c| u8::try_from(c).ok()).collect::<Option<Vec<u8>>>();
    let result = match bytes {
        Some(bytes) => HeaderValue::from_bytes(&bytes),
        None => HeaderValue::from_str(value),
    };
    result.map_err(|e| AdapterError::invalid_header(name, e))
}

/// Joined lookups on a `HeaderMap`.
pub trait HeadersExt {
    /// All values of `name` joined with `", "` in insertion order, `None` when absent.
    fn get_joined(&self, name: &str) -> Option<String>;
}

impl HeadersExt for HeaderMap {
    fn get_joined(&self, name: &str) -> Option<String> {
        let values = self.get_all(name).iter().map(|value| latin1(value.as_bytes())).collect::<Vec<_>>();

        if values.is_empty() { None } else { Some(values.join(", ")) }
    }
}

/// Header bytes read back as latin-1, every byte maps to one char.
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_headers() {
        let headers = create_headers(&RawHeaders::new()).unwrap();

        assert!(headers.is_empty());
    }

    #[test]
    fn simple_headers() {
        let raw_headers = RawHeaders::from_iter([("x-foo", "bar"), ("x-bar", "baz")]);

        let headers = create_headers(&raw_headers).unwrap();

        assert_eq!(headers.get_joined("x-foo").as_deref(), Some("bar"));
        assert_eq!(headers.get_joined("X-Bar").as_deref(), Some("baz"));
    }

    #[test]
    fn multiple_values_are_appended() {
        let raw_headers = RawHeaders::from_iter([("x-foo", RawHeaderValue::from(vec!["bar", "baz"]))]);

        let headers = create_headers(&raw_headers).unwrap();

        assert_eq!(headers.get_all("x-foo").iter().count(), 2);
        assert_eq!(headers.get_joined("x-foo").as_deref(), Some("bar, baz"));
    }

    #[test]
    fn comma_joined_value_stays_single() {
        let raw_headers = RawHeaders::from_iter([("x-foo", "bar, baz")]);

        let headers = create_headers(&raw_headers).unwrap();

        assert_eq!(headers.get_all("x-foo").iter().count(), 1);
        assert_eq!(headers.get_joined("x-foo").as_deref(), Some("bar, baz"));
    }

    #[test]
    fn set_cookie_values_in_order() {
        let raw_headers = RawHeaders::from_iter([("set-cookie", RawHeaderValue::from(vec!["foo=bar", "bar=baz"]))]);

        let headers = create_headers(&raw_headers).unwrap();

        let cookies = headers.get_all("set-cookie").iter().collect::<Vec<_>>();
        assert_eq!(cookies, vec!["foo=bar", "bar=baz"]);
        assert_eq!(headers.get_joined("set-cookie").as_deref(), Some("foo=bar, bar=baz"));
    }

    #[test]
    fn absent_value_adds_nothing() {
        let raw_headers = RawHeaders::from_iter([("x-empty", RawHeaderValue::Multiple(vec![]))]);

        let headers = create_headers(&raw_headers).unwrap();

        assert!(headers.get("x-empty").is_none());
        assert!(headers.get_joined("x-empty").is_none());
    }

    #[test]
    fn obs_text_survives() {
        let raw_headers = RawHeaders::from_iter([("x-name", "caf\u{e9}")]);

        let headers = create_headers(&raw_headers).unwrap();

        assert_eq!(headers.get("x-name").unwrap().as_bytes(), b"caf\xe9");
        assert_eq!(headers.get_joined("x-name").as_deref(), Some("caf\u{e9}"));
    }

    #[test]
    fn rejects_illegal_values() {
        let raw_headers = RawHeaders::from_iter([("x-bad", "line\nbreak")]);

        assert!(matches!(create_headers(&raw_headers), Err(AdapterError::InvalidHeader { .. })));
    }
}
