use bytes::Bytes;

use crate::http::headers::{HeaderMap, HeaderValue};
use crate::resource::Resource;

/// Value of the `Server` header sent with every response.
pub const SERVER_NAME: &str = "massive-magenta";

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): the requested file was found
/// - `BadRequest` (400): malformed entry line or a method other than GET
/// - `NotFound` (404): the target did not resolve to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use massive_magenta::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use massive_magenta::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// Represents a complete HTTP response ready to be framed.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers in the order they will be written
    pub headers: HeaderMap,
    /// Response body, absent for error responses
    pub body: Option<Bytes>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// `Server` is always the first header. Setting a body also sets
/// `Content-Length` to its byte length.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain; charset=utf-8")
///     .body(Bytes::from_static(b"hello"))
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Server", SERVER_NAME);

        Self {
            status,
            headers,
            body: None,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Builds the final Response.
    ///
    /// `Content-Length` always reflects the body actually attached, overriding
    /// any value set through `header`.
    pub fn build(mut self) -> Response {
        if let Some(body) = &self.body {
            self.headers.insert("Content-Length", body.len());
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// 200 OK carrying a resolved file.
    pub fn ok(resource: Resource) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", resource.content_type)
            .body(resource.content)
            .build()
    }

    /// 400 Bad Request without a body.
    pub fn bad_request() -> Self {
        ResponseBuilder::new(StatusCode::BadRequest).build()
    }

    /// 404 Not Found without a body.
    pub fn not_found() -> Self {
        ResponseBuilder::new(StatusCode::NotFound).build()
    }

    pub fn content_length(&self) -> Option<i64> {
        self.headers.get("Content-Length").and_then(|v| v.as_i64())
    }
}
