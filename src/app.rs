//! The application: route tree plus the hooks that surround dispatch.

use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::warn;

use crate::config::Config;
use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedHandler, ErrorHandler, Handler};
use crate::path;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::session::{self, SessionStore};

/// Body of the default not-found response.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

/// An application: the root of the route tree, the not-found fallback, the
/// error handler and the tail middleware.
///
/// Register everything before serving. The tree is read-only while requests
/// are dispatched and has no internal locking.
pub struct App {
    root: Router,
    not_found: BoxedHandler,
    on_error: ErrorHandler,
    tail: Vec<BoxedHandler>,
    session_cookie: String,
}

impl App {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            root: Router::new(),
            not_found: default_not_found.into_boxed_handler(),
            on_error: Arc::new(default_on_error),
            tail: Vec::new(),
            session_cookie: config.session_cookie.clone(),
        }
    }

    /// The root node, matching `/`.
    pub fn root(&mut self) -> &mut Router {
        &mut self.root
    }

    /// Replaces the handler run when no route matches. The default answers
    /// `404` with [`NOT_FOUND_BODY`].
    pub fn not_found(&mut self, handler: impl Handler) -> &mut Self {
        self.not_found = handler.into_boxed_handler();
        self
    }

    /// Replaces the handler run after dispatch when the chain recorded a
    /// failure with [`Context::fail`]. The default discards the body and
    /// answers `500` with the error text.
    pub fn on_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Error, &mut Context) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(handler);
        self
    }

    /// Appends a middleware that runs after the handler chain and before
    /// the response is sent. Tail middleware runs for every request,
    /// including unmatched ones, in registration order.
    pub fn tail_middleware(&mut self, handler: impl Handler) -> &mut Self {
        self.tail.push(handler.into_boxed_handler());
        self
    }

    /// Turns on cookie sessions backed by `store`.
    ///
    /// The loader is appended to the root middleware list, so middleware
    /// registered on the root before this call does not see the session.
    pub fn enable_session(&mut self, store: impl SessionStore) -> &mut Self {
        let store: Arc<dyn SessionStore> = Arc::new(store);
        let load_cookie = self.session_cookie.clone();
        let save_cookie = self.session_cookie.clone();
        self.root
            .middleware(move |ctx: &mut Context| session::load(&store, &load_cookie, ctx));
        self.tail_middleware(move |ctx: &mut Context| session::save(&save_cookie, ctx))
    }

    /// Routes one request through the tree.
    ///
    /// Runs the middleware and exactly one handler (the match or the
    /// not-found fallback), then the error handler if something failed,
    /// then the tail middleware.
    pub fn handle(&self, method: &Method, path: &str, ctx: &mut Context) {
        let steps = path::segments(path);
        self.root.dispatch(method, &steps, ctx, &*self.not_found);

        if let Some(error) = ctx.error.take() {
            warn!(%method, path, "request failed: {error}");
            (self.on_error)(error, ctx);
        }
        for tail in &self.tail {
            tail.call(ctx);
        }
    }

    /// Wraps `request` in a fresh [`Context`], handles it and returns the
    /// finished response.
    pub fn respond(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.path().to_owned();
        let mut ctx = Context::new(request);
        self.handle(&method, &path, &mut ctx);
        ctx.response
    }
}

impl Default for App {
    fn default() -> Self { Self::new() }
}

fn default_not_found(ctx: &mut Context) {
    ctx.response.set_status(StatusCode::NOT_FOUND);
    ctx.response.text(NOT_FOUND_BODY);
}

fn default_on_error(error: Error, ctx: &mut Context) {
    ctx.response.clear_body();
    ctx.response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
    ctx.response.text(error.to_string());
}
