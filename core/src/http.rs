//! HTTP request and response types for the DatabunkerPro gateway.
//!
//! # Design
//! Requests and responses are plain data. The gateway builds an `HttpRequest`
//! from a `RequestDescriptor`, a `Transport` executes it, and the gateway
//! parses the resulting `HttpResponse`. Callers that want to run the network
//! round-trip themselves can stop after the build step.
//!
//! All fields use owned types (`String`, `Vec`) so values can be moved across
//! threads and stored without lifetime concerns.

use std::borrow::Cow;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::types::Payload;

/// Everything except RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical API call before headers and the base URL are applied.
///
/// `path` is relative to the `/v2` prefix and must already have its
/// identifier segments passed through [`encode_segment`]. `route` is the
/// same path with identifiers left as placeholders; it is what gets logged.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub path: String,
    pub route: String,
    pub body: Option<Payload>,
}

impl RequestDescriptor {
    /// Descriptor for a path without identifier segments.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method,
            route: path.clone(),
            path,
            body: None,
        }
    }

    /// Replace the logged route, e.g. `/user/{mode}/{identity}`.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn with_body(mut self, body: Payload) -> Self {
        self.body = Some(body);
        self
    }
}

/// A fully built HTTP request: absolute URL, headers and serialized body.
///
/// `route` is the `/v2` route template without identifiers, safe to log.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub route: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// The body is kept as raw bytes; decoding is the gateway's job.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Percent-encode one path segment so reserved characters (`@`, `+`, `/`,
/// spaces, ...) reach the remote router as literal data.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
