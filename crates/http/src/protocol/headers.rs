//! Raw header representation shared by incoming requests and outgoing responses.
//!
//! Headers are kept the way a Node-style server exposes them: every name is
//! lowercase and maps to either one string or an ordered list of strings.
//! Repeated request headers are folded when they are decoded, see
//! [`RawHeaders::append_incoming`].

use std::borrow::Cow;
use std::slice;

/// Request headers whose duplicates are discarded, only the first occurrence is kept.
const SINGLETON_HEADERS: &[&str] = &[
    "age",
    "authorization",
    "content-type",
    "etag",
    "expires",
    "from",
    "host",
    "if-modified-since",
    "if-unmodified-since",
    "last-modified",
    "location",
    "max-forwards",
    "proxy-authorization",
    "referer",
    "retry-after",
    "server",
    "user-agent",
];

/// The value stored under one header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawHeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl RawHeaderValue {
    /// Iterates the individual values, a `Single` yields exactly one item.
    pub fn iter(&self) -> slice::Iter<'_, String> {
        match self {
            RawHeaderValue::Single(value) => slice::from_ref(value).iter(),
            RawHeaderValue::Multiple(values) => values.iter(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawHeaderValue::Single(_) => 1,
            RawHeaderValue::Multiple(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first value, if any.
    pub fn first(&self) -> Option<&str> {
        self.iter().next().map(String::as_str)
    }

    /// All values joined with `", "`.
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            RawHeaderValue::Single(value) => Cow::Borrowed(value),
            RawHeaderValue::Multiple(values) => Cow::Owned(values.join(", ")),
        }
    }
}

impl From<String> for RawHeaderValue {
    fn from(value: String) -> Self {
        RawHeaderValue::Single(value)
    }
}

impl From<&str> for RawHeaderValue {
    fn from(value: &str) -> Self {
        RawHeaderValue::Single(value.to_owned())
    }
}

impl From<Vec<String>> for RawHeaderValue {
    fn from(values: Vec<String>) -> Self {
        RawHeaderValue::Multiple(values)
    }
}

impl From<Vec<&str>> for RawHeaderValue {
    fn from(values: Vec<&str>) -> Self {
        RawHeaderValue::Multiple(values.into_iter().map(str::to_owned).collect())
    }
}

impl<'a> IntoIterator for &'a RawHeaderValue {
    type Item = &'a String;
    type IntoIter = slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ordered collection of lowercase header names and their values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeaders {
    entries: Vec<(String, RawHeaderValue)>,
}

impl RawHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RawHeaderValue> {
        self.position(name).map(|index| &self.entries[index].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Sets the value for `name`, replacing any previous value in place.
    pub fn set(&mut self, name: &str, value: impl Into<RawHeaderValue>) {
        let value = value.into();
        match self.position(name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<RawHeaderValue> {
        self.position(name).map(|index| self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawHeaderValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Adds a header line read from the wire, folding repeats:
    ///
    /// - `set-cookie` accumulates into [`RawHeaderValue::Multiple`]
    /// - `cookie` is joined with `"; "`
    /// - singleton headers such as `host` keep their first value
    /// - `content-length` drops exact repeats and keeps differing values joined,
    ///   so the conflict stays visible to framing
    /// - anything else is joined with `", "`
    pub fn append_incoming(&mut self, name: &str, value: String) {
        let name = name.to_ascii_lowercase();
        let Some(index) = self.position(&name) else {
            let value = if name == "set-cookie" { RawHeaderValue::Multiple(vec![value]) } else { RawHeaderValue::Single(value) };
            self.entries.push((name, value));
            return;
        };

        if SINGLETON_HEADERS.contains(&name.as_str()) {
            return;
        }

        if name == "content-length" && self.entries[index].1.iter().any(|current| current.trim() == value.trim()) {
            return;
        }

        let separator = if name == "cookie" { "; " } else { ", " };
        match &mut self.entries[index].1 {
            RawHeaderValue::Multiple(values) => values.push(value),
            RawHeaderValue::Single(current) => {
                current.push_str(separator);
                current.push_str(&value);
            }
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}

impl<'a> IntoIterator for &'a RawHeaders {
    type Item = (&'a str, &'a RawHeaderValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a RawHeaderValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl<N, V> FromIterator<(N, V)> for RawHeaders
where
    N: AsRef<str>,
    V: Into<RawHeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = RawHeaders::new();
        for (name, value) in iter {
            headers.set(name.as_ref(), value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_case_insensitively() {
        let mut headers = RawHeaders::new();
        headers.set("X-Foo", "bar");
        headers.set("x-foo", "baz");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-FOO"), Some(&RawHeaderValue::from("baz")));
        assert_eq!(headers.iter().next().unwrap().0, "x-foo");
    }

    #[test]
    fn set_cookie_accumulates() {
        let mut headers = RawHeaders::new();
        headers.append_incoming("Set-Cookie", "a=1".to_string());
        headers.append_incoming("set-cookie", "b=2".to_string());

        assert_eq!(headers.get("set-cookie"), Some(&RawHeaderValue::from(vec!["a=1", "b=2"])));
    }

    #[test]
    fn repeated_headers_are_folded() {
        let mut headers = RawHeaders::new();
        headers.append_incoming("Accept", "text/html".to_string());
        headers.append_incoming("accept", "application/json".to_string());
        headers.append_incoming("Cookie", "a=1".to_string());
        headers.append_incoming("Cookie", "b=2".to_string());
        headers.append_incoming("Host", "first".to_string());
        headers.append_incoming("Host", "second".to_string());

        assert_eq!(headers.get("accept").unwrap().joined(), "text/html, application/json");
        assert_eq!(headers.get("cookie").unwrap().joined(), "a=1; b=2");
        assert_eq!(headers.get("host").unwrap().first(), Some("first"));
    }

    #[test]
    fn content_length_repeats() {
        let mut headers = RawHeaders::new();
        headers.append_incoming("Content-Length", "3".to_string());
        headers.append_incoming("content-length", "3".to_string());
        assert_eq!(headers.get("content-length"), Some(&RawHeaderValue::from("3")));

        headers.append_incoming("Content-Length", "30".to_string());
        assert_eq!(headers.get("content-length"), Some(&RawHeaderValue::from("3, 30")));
    }

    #[test]
    fn value_iteration() {
        let single = RawHeaderValue::from("one");
        let multiple = RawHeaderValue::from(vec!["one", "two"]);

        assert_eq!(single.iter().collect::<Vec<_>>(), vec!["one"]);
        assert_eq!(multiple.iter().collect::<Vec<_>>(), vec!["one", "two"]);
        assert_eq!(multiple.joined(), "one, two");
        assert!(RawHeaderValue::Multiple(vec![]).is_empty());
    }
}
