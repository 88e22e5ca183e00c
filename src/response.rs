//! Outgoing HTTP response.
//!
//! Unlike the request, the response is built up in place: every middleware
//! and handler in the chain holds the same [`Response`] through the
//! [`Context`](crate::Context). Body writers append, so two middleware that
//! each write `"a"` and `"b"` produce `"ab"`. Nothing reaches the client until
//! the chain (and the tail middleware) has finished.

use std::fmt;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use tracing::warn;

use crate::error::Error;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for [`Response::bytes`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream
    Html,         // text/html; charset=utf-8
    JavaScript,   // application/javascript; charset=utf-8
    Json,         // application/json; charset=utf-8
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml; charset=utf-8
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html; charset=utf-8",
            Self::JavaScript  => "application/javascript; charset=utf-8",
            Self::Json        => "application/json; charset=utf-8",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml; charset=utf-8",
        }
    }
}

// ── Cookie ────────────────────────────────────────────────────────────────────

/// A `Set-Cookie` value.
#[derive(Clone, Debug, Default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    /// `Some(0)` tells the client to drop the cookie.
    pub max_age: Option<i64>,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), ..Self::default() }
    }

    /// A cookie that removes `name` from the client.
    pub fn expired(name: impl Into<String>) -> Self {
        Self { max_age: Some(0), ..Self::new(name, "") }
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age.max(0))?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// The response under construction for one request. Defaults to `200 OK`
/// with no headers and an empty body.
///
/// ```rust
/// # use rally::{App, Context, HeaderValue, StatusCode, header};
/// # let mut app = App::new();
/// app.root().post("/users", |ctx: &mut Context| {
///     ctx.response.set_status(StatusCode::CREATED);
///     ctx.response.header(header::LOCATION, HeaderValue::from_static("/users/99"));
///     ctx.response.text("created");
/// });
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub(crate) fn new() -> Self {
        Self { status: StatusCode::OK, headers: HeaderMap::new(), body: Vec::new() }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Sets header `name`, replacing any earlier value.
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Appends a `Set-Cookie` header.
    pub fn cookie(&mut self, cookie: &Cookie) {
        match HeaderValue::try_from(cookie.to_string()) {
            Ok(value) => {
                self.headers.append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(cookie = %cookie.name, "dropping unencodable cookie: {e}"),
        }
    }

    /// Appends `body` as `text/plain`.
    pub fn text(&mut self, body: impl AsRef<str>) {
        self.bytes(ContentType::Text, body.as_ref());
    }

    /// Appends `body` as `text/html`.
    pub fn html(&mut self, body: impl AsRef<str>) {
        self.bytes(ContentType::Html, body.as_ref());
    }

    /// Appends the JSON encoding of `value`. Nothing is written when
    /// encoding fails.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let encoded = serde_json::to_vec(value)?;
        self.bytes(ContentType::Json, encoded);
        Ok(())
    }

    /// Appends the XML encoding of `value`, using the type name as the root
    /// element.
    pub fn xml<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let encoded = quick_xml::se::to_string(value)?;
        self.bytes(ContentType::Xml, encoded);
        Ok(())
    }

    /// Appends `callback(<json>)` as JavaScript.
    pub fn jsonp<T: Serialize + ?Sized>(&mut self, value: &T, callback: &str) -> Result<(), Error> {
        let encoded = serde_json::to_vec(value)?;
        let mut wrapped = Vec::with_capacity(callback.len() + encoded.len() + 2);
        wrapped.extend_from_slice(callback.as_bytes());
        wrapped.push(b'(');
        wrapped.extend_from_slice(&encoded);
        wrapped.push(b')');
        self.bytes(ContentType::JavaScript, wrapped);
        Ok(())
    }

    /// Appends raw bytes and sets `Content-Type`.
    pub fn bytes(&mut self, content_type: ContentType, body: impl AsRef<[u8]>) {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        self.body.extend_from_slice(body.as_ref());
    }

    /// Points the client at `location`. Keeps the current status if it is
    /// already a redirect, otherwise uses `302 Found`.
    pub fn redirect(&mut self, location: &str) {
        if !self.status.is_redirection() {
            self.status = StatusCode::FOUND;
        }
        match HeaderValue::try_from(location) {
            Ok(value) => {
                self.headers.insert(header::LOCATION, value);
            }
            Err(e) => warn!(location, "dropping unencodable redirect target: {e}"),
        }
    }

    /// Discards the body written so far, along with its content type.
    pub fn clear_body(&mut self) {
        self.body.clear();
        self.headers.remove(header::CONTENT_TYPE);
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_append_and_set_content_type() {
        let mut res = Response::new();
        res.text("a");
        res.text("b");
        assert_eq!(res.body(), b"ab");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");

        res.html("<p/>");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[test]
    fn jsonp_wraps_the_payload() {
        let mut res = Response::new();
        res.jsonp(&serde_json::json!({"name": "pong"}), "cb").unwrap();
        assert_eq!(res.body(), br#"cb({"name":"pong"})"#);
        assert_eq!(
            res.headers()[header::CONTENT_TYPE],
            "application/javascript; charset=utf-8"
        );
    }

    #[test]
    fn xml_uses_the_type_name_as_root() {
        #[derive(Serialize)]
        struct User {
            name: &'static str,
            age: u8,
        }

        let mut res = Response::new();
        res.xml(&User { name: "hal", age: 3 }).unwrap();
        assert_eq!(res.body(), b"<User><name>hal</name><age>3</age></User>");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/xml; charset=utf-8");
    }

    #[test]
    fn redirect_keeps_an_explicit_3xx() {
        let mut res = Response::new();
        res.redirect("/a");
        assert_eq!(res.status(), StatusCode::FOUND);

        res.set_status(StatusCode::MOVED_PERMANENTLY);
        res.redirect("/b");
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers()[header::LOCATION], "/b");
    }

    #[test]
    fn cookies_render_as_set_cookie() {
        let mut res = Response::new();
        res.cookie(&Cookie::new("SESSIONID", "abc").http_only());
        res.cookie(&Cookie::expired("old"));
        let values: Vec<_> = res.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(values, ["SESSIONID=abc; HttpOnly", "old=; Max-Age=0"]);
    }

    #[test]
    fn converts_into_http_response() {
        let mut res = Response::new();
        res.set_status(StatusCode::CREATED);
        res.text("done");
        let http = res.into_http();
        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(http.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }
}
