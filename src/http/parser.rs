use std::fmt;

use crate::http::headers::{HeaderMap, HeaderValue};
use crate::http::request::{Method, Request};

/// Why a buffer could not be turned into a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing was received
    Empty,
    /// The entry line did not hold exactly method, target and version
    MalformedEntryLine(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => f.write_str("empty request"),
            ParseError::MalformedEntryLine(line) => {
                write!(f, "malformed entry line {:?}", line)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses a raw request buffer.
///
/// The buffer does not need to be terminated by a blank line: whatever
/// arrived is split on CRLF, line 0 is the entry line and the following lines
/// up to the first empty one are headers. Header lines that are not
/// `Name: value` with a `[A-Za-z-]+` name are dropped.
pub fn parse_request(buf: &[u8]) -> Result<Request, ParseError> {
    if buf.is_empty() {
        return Err(ParseError::Empty);
    }

    let text = String::from_utf8_lossy(buf);
    let mut lines = text.split("\r\n");

    let entry_line = lines.next().unwrap_or_default();
    let (method, target, version) = parse_entry_line(entry_line)
        .ok_or_else(|| ParseError::MalformedEntryLine(entry_line.to_string()))?;

    let mut headers = HeaderMap::new();

    for line in lines.take_while(|line| !line.is_empty()) {
        if let Some((key, value)) = parse_header_line(line) {
            headers.insert(key, value);
        }
    }

    Ok(Request {
        method: Method::parse(method),
        target: target.to_string(),
        version: version.to_string(),
        headers,
    })
}

/// Splits the entry line on single spaces; exactly three non-empty tokens.
fn parse_entry_line(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.split(' ');

    let method = parts.next().filter(|s| !s.is_empty())?;
    let target = parts.next().filter(|s| !s.is_empty())?;
    let version = parts.next().filter(|s| !s.is_empty())?;

    if parts.next().is_some() {
        return None;
    }

    Some((method, target, version))
}

fn parse_header_line(line: &str) -> Option<(&str, HeaderValue)> {
    let (key, value) = line.split_once(": ")?;

    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-') {
        return None;
    }

    if value.is_empty() {
        return None;
    }

    Some((key, HeaderValue::parse(value)))
}
