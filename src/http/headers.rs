use std::fmt;

/// A header value as stored after parsing.
///
/// Values that parse as numbers are kept as numbers, everything else is text.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl HeaderValue {
    /// Coerces a raw header value, preferring integers over floats over text.
    ///
    /// ```
    /// # use massive_magenta::http::headers::HeaderValue;
    /// assert_eq!(HeaderValue::parse("42"), HeaderValue::Integer(42));
    /// assert_eq!(HeaderValue::parse("0.5"), HeaderValue::Float(0.5));
    /// assert_eq!(HeaderValue::parse("close"), HeaderValue::Text("close".into()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            return HeaderValue::Integer(n);
        }

        match raw.parse::<f64>() {
            // "inf" and "NaN" parse as f64 but are not numbers on the wire
            Ok(f) if f.is_finite() => HeaderValue::Float(f),
            _ => HeaderValue::Text(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Integer(n) => write!(f, "{}", n),
            HeaderValue::Float(n) => write!(f, "{}", n),
            HeaderValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Text(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Text(s)
    }
}

impl From<i64> for HeaderValue {
    fn from(n: i64) -> Self {
        HeaderValue::Integer(n)
    }
}

impl From<u64> for HeaderValue {
    fn from(n: u64) -> Self {
        i64::try_from(n)
            .map(HeaderValue::Integer)
            .unwrap_or_else(|_| HeaderValue::Text(n.to_string()))
    }
}

impl From<usize> for HeaderValue {
    fn from(n: usize) -> Self {
        HeaderValue::from(n as u64)
    }
}

/// Header mapping that iterates in insertion order.
///
/// Lookups and replacement match names case-insensitively; the spelling of the
/// first insertion is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    entries: Vec<(String, HeaderValue)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing the value in place if the name already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<HeaderValue>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
