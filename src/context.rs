//! Per-request context.
//!
//! One [`Context`] is created for every inbound request and handed by
//! `&mut` to each middleware and handler in turn. It is owned by the task
//! serving that request and is never shared, so nothing in it is
//! synchronised.

use std::any::Any;
use std::collections::HashMap;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::session::Session;

/// State carried through the middleware chain for one request.
pub struct Context {
    /// The inbound request.
    pub request: Request,
    /// The response being built. Flushed once the whole chain has run.
    pub response: Response,
    params: HashMap<String, String>,
    data: HashMap<String, Box<dyn Any + Send>>,
    pub(crate) session: Option<Session>,
    pub(crate) error: Option<Error>,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: Response::new(),
            params: HashMap::new(),
            data: HashMap::new(),
            session: None,
            error: None,
        }
    }

    /// Returns the path parameter bound to `name`, or `""` if the matched
    /// route never bound it.
    ///
    /// For a route `/user/:id`, `ctx.param("id")` on `/user/123` is `"123"`.
    /// Values are the raw path segments, not percent-decoded.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map_or("", String::as_str)
    }

    /// Every parameter bound so far.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub(crate) fn bind_param(&mut self, name: &str, value: &str) {
        self.params.insert(name.to_owned(), value.to_owned());
    }

    /// Stores a value for later middleware or the handler. Overwrites any
    /// previous value under `key`.
    pub fn set<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.data.insert(key.into(), Box::new(value));
    }

    /// Reads a value stored with [`set`](Self::set). `None` if the key is
    /// missing or holds a different type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.data.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.data.get_mut(key)?.downcast_mut()
    }

    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        let value = self.data.remove(key)?;
        match value.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(value) => {
                self.data.insert(key.to_owned(), value);
                None
            }
        }
    }

    /// The session loaded by the session middleware, if sessions are enabled.
    pub fn session(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Records a failure. Once dispatch returns, the application's error
    /// handler replaces the response. A later failure overwrites an earlier
    /// one.
    pub fn fail(&mut self, error: impl Into<Error>) {
        self.error = Some(error.into());
    }

    /// Serialises `value` as the JSON body, or records the failure.
    pub fn json<T: serde::Serialize + ?Sized>(&mut self, value: &T) {
        if let Err(e) = self.response.json(value) {
            self.fail(e);
        }
    }

    /// Serialises `value` as the XML body, or records the failure.
    pub fn xml<T: serde::Serialize + ?Sized>(&mut self, value: &T) {
        if let Err(e) = self.response.xml(value) {
            self.fail(e);
        }
    }

    /// Like [`json`](Self::json), wrapped in a call to `callback`.
    pub fn jsonp<T: serde::Serialize + ?Sized>(&mut self, value: &T, callback: &str) {
        if let Err(e) = self.response.jsonp(value, callback) {
            self.fail(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn context() -> Context {
        Context::new(Request::new(Method::GET, "/"))
    }

    #[test]
    fn unbound_param_is_empty() {
        let mut ctx = context();
        assert_eq!(ctx.param("id"), "");
        ctx.bind_param("id", "7");
        ctx.bind_param("id", "8");
        assert_eq!(ctx.param("id"), "8");
    }

    #[test]
    fn typed_store_round_trip() {
        let mut ctx = context();
        ctx.set("user", vec!["alice".to_owned()]);
        assert_eq!(ctx.get::<Vec<String>>("user").map(Vec::len), Some(1));
        assert!(ctx.get::<String>("user").is_none());

        ctx.get_mut::<Vec<String>>("user").unwrap().push("bob".to_owned());
        assert!(ctx.remove::<String>("user").is_none());
        assert_eq!(ctx.remove::<Vec<String>>("user").unwrap().len(), 2);
        assert!(ctx.get::<Vec<String>>("user").is_none());
    }

    #[test]
    fn xml_writes_the_body() {
        #[derive(serde::Serialize)]
        struct Pong {
            name: &'static str,
        }

        let mut ctx = context();
        ctx.xml(&Pong { name: "pong" });
        assert!(ctx.error.is_none());
        assert_eq!(ctx.response.body(), b"<Pong><name>pong</name></Pong>");
    }

    #[test]
    fn failed_json_is_recorded() {
        let mut ctx = context();
        let mut bad = std::collections::HashMap::new();
        bad.insert(vec![1u8], 1);
        ctx.json(&bad);
        assert!(matches!(ctx.error, Some(Error::Json(_))));
    }
}
