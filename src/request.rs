//! Inbound HTTP request type.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::de::DeserializeOwned;

use crate::bind::{BindForm, FormData};
use crate::error::Error;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const JSON: &str = "application/json";
const XML: &str = "application/xml";

/// An inbound request, with its body already read.
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Builds a request from a method and a request target such as
    /// `/users?page=2`. Used by the server, and directly in tests.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_owned(),
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query_string(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// First value of header `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Value of cookie `name` from the `Cookie` header(s).
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| key.trim() == name)
            .map(|(_, value)| value.trim())
    }

    /// First decoded value of query parameter `name`, or `""`.
    ///
    /// `/user?name=hal` gives `query("name") == "hal"`.
    pub fn query(&self, name: &str) -> String {
        self.query_data().first(name).unwrap_or_default().to_owned()
    }

    /// First value of form field `name` from a url-encoded body, or `""`.
    /// The query string is not consulted.
    pub fn form(&self, name: &str) -> String {
        if !self.content_type_is(FORM_URLENCODED) {
            return String::new();
        }
        FormData::parse(&self.body).first(name).unwrap_or_default().to_owned()
    }

    /// Deserialises the body as JSON.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Binds query parameters onto `target`.
    pub fn bind_query<T: BindForm>(&self, target: &mut T) -> Result<(), Error> {
        target.bind_form(&self.query_data())
    }

    /// Binds a url-encoded body onto `target`, followed by the query
    /// parameters: a scalar field takes the body value when both carry it.
    /// Any other content type is rejected.
    pub fn bind_form<T: BindForm>(&self, target: &mut T) -> Result<(), Error> {
        if !self.content_type_is(FORM_URLENCODED) {
            return Err(self.unsupported());
        }
        target.bind_form(&self.form_data())
    }

    /// Deserialises the body as XML. The root element name is not checked.
    pub fn bind_xml<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(quick_xml::de::from_reader(self.body.as_ref())?)
    }

    /// Picks JSON, XML or form binding from `Content-Type`.
    pub fn auto_bind<T>(&self, target: &mut T) -> Result<(), Error>
    where
        T: BindForm + DeserializeOwned,
    {
        if self.content_type_is(JSON) {
            *target = self.bind_json()?;
            Ok(())
        } else if self.content_type_is(XML) {
            *target = self.bind_xml()?;
            Ok(())
        } else if self.content_type_is(FORM_URLENCODED) {
            target.bind_form(&self.form_data())
        } else {
            Err(self.unsupported())
        }
    }

    fn form_data(&self) -> FormData {
        let mut data = FormData::parse(&self.body);
        data.extend(self.query_data());
        data
    }

    fn query_data(&self) -> FormData {
        self.query
            .as_deref()
            .map(|query| FormData::parse(query.as_bytes()))
            .unwrap_or_default()
    }

    fn content_type_is(&self, mime: &str) -> bool {
        self.header(header::CONTENT_TYPE.as_str())
            .is_some_and(|value| value.starts_with(mime))
    }

    fn unsupported(&self) -> Error {
        let content_type = self.header(header::CONTENT_TYPE.as_str()).unwrap_or_default();
        Error::UnsupportedContentType(content_type.to_owned())
    }
}
