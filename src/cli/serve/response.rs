//! HTTP response values and delivery.
//!
//! Handlers build a [`Reply`]; [`send`] turns it into a `tiny_http`
//! response and adds headers every response carries.

use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Request, Response, StatusCode};

use crate::utils::mime::{self, types::PLAIN};

/// Headers that disable caching of static assets.
const NO_CACHE_HEADERS: [(&str, &str); 4] = [
    ("Cache-Control", "no-cache, private, max-age=0"),
    ("Pragma", "no-cache"),
    ("Expires", "Thu, 01 Jan 1970 00:00:00 GMT"),
    ("X-Accel-Expires", "0"),
];

/// A complete response, independent of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, content_type, body)
    }

    /// Plain-text error response.
    pub fn error(status: u16, message: &str) -> Self {
        let mut body = message.to_string();
        if !body.ends_with('\n') {
            body.push('\n');
        }
        Self::new(status, PLAIN, body)
    }

    pub fn not_found() -> Self {
        Self::error(404, "404 page not found")
    }

    pub fn unavailable() -> Self {
        Self::error(503, "503 Service Unavailable")
    }

    /// 303 See Other to `location`.
    pub fn see_other(location: &str) -> Self {
        Self::new(303, PLAIN, format!("See Other: {location}\n"))
            .with_header("Location", location)
    }

    /// Serve a file from disk, or 404 if it is not a regular file.
    pub fn file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::not_found());
        }
        let body = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::ok(mime::from_path(path), body))
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Add the headers that keep browsers and proxies from caching.
    pub fn no_cache(self) -> Self {
        NO_CACHE_HEADERS
            .iter()
            .fold(self, |reply, (name, value)| reply.with_header(*name, *value))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Write `reply` to the client.
///
/// `tiny_http` omits the body for HEAD requests while keeping the headers.
pub fn send(request: Request, reply: Reply, allow_origin: Option<&str>) -> Result<()> {
    let mut response = Response::from_data(reply.body)
        .with_status_code(StatusCode(reply.status))
        .with_header(make_header("Content-Type", reply.content_type)?);
    for (name, value) in &reply.headers {
        response.add_header(make_header(name, value)?);
    }
    if let Some(origin) = allow_origin {
        response.add_header(make_header("Access-Control-Allow-Origin", origin)?);
    }
    request.respond(response)?;
    Ok(())
}

fn make_header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow::anyhow!("invalid header {name}: {value:?}"))
}
