//! Route tree and registration.
//!
//! Every [`Router`] is one node of the tree. A node owns:
//!
//! - literal children keyed by segment text,
//! - at most one parameterized child (the parameter slot),
//! - leaf handlers keyed by (segment, method), with the parameter slot kept
//!   apart from every literal key,
//! - index handlers keyed by method, for an exhausted path,
//! - an append-only middleware list,
//! - the parameter name bound at this depth, if any.
//!
//! Sub-routers are plain nodes: [`Router::router`] walks (and extends) the
//! tree along a prefix and hands back the node it ends on.
//!
//! Conflicting registrations never fail. The later registration wins and a
//! `tracing` warning records what was replaced.

use std::collections::HashMap;

use http::Method;
use tracing::warn;

use crate::handler::{BoxedHandler, Handler};
use crate::path;

/// Handlers keyed by HTTP method.
pub(crate) type MethodMap = HashMap<Method, BoxedHandler>;

/// The methods [`Router::any`] registers under.
pub const ANY_METHODS: [Method; 8] = [
    Method::DELETE,
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::POST,
    Method::PUT,
    Method::TRACE,
];

/// A node in the routing tree.
///
/// The root node lives in [`App`](crate::App); every other node is reached
/// through [`Router::router`].
#[derive(Default)]
pub struct Router {
    root: bool,
    pub(crate) param_name: Option<String>,
    pub(crate) middleware: Vec<BoxedHandler>,
    pub(crate) children: HashMap<String, Router>,
    pub(crate) param_child: Option<Box<Router>>,
    pub(crate) leaves: HashMap<String, MethodMap>,
    pub(crate) param_leaves: MethodMap,
    pub(crate) index: MethodMap,
}

impl Router {
    /// A root node. Nodes below it come from [`Router::router`].
    pub(crate) fn new() -> Self {
        Self { root: true, ..Self::default() }
    }

    /// Appends a middleware to this node.
    ///
    /// Middleware runs in registration order for every request that reaches
    /// this node or any node below it, after the middleware of every
    /// ancestor.
    pub fn middleware(&mut self, handler: impl Handler) -> &mut Self {
        self.middleware.push(handler.into_boxed_handler());
        self
    }

    /// Returns the sub-router at `prefix`, creating the nodes on the way.
    ///
    /// ```rust
    /// # use rally::{App, Context};
    /// let mut app = App::new();
    /// let users = app.root().router("/users");
    /// users.get("/:id", |ctx: &mut Context| {
    ///     let id = ctx.param("id").to_owned();
    ///     ctx.response.text(id);
    /// });
    /// ```
    pub fn router(&mut self, prefix: &str) -> &mut Router {
        self.descend(&path::segments(prefix))
    }

    pub fn get(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.on(Method::DELETE, path, handler)
    }

    pub fn head(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.on(Method::HEAD, path, handler)
    }

    pub fn options(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.on(Method::OPTIONS, path, handler)
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.on(Method::PATCH, path, handler)
    }

    pub fn trace(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.on(Method::TRACE, path, handler)
    }

    /// Registers one handler under every method in [`ANY_METHODS`].
    pub fn any(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        let handler = handler.into_boxed_handler();
        for method in ANY_METHODS {
            self.register(path, method, handler.clone());
        }
        self
    }

    /// Registers a handler for an arbitrary method, including extension
    /// methods the shortcuts above do not cover.
    pub fn on(&mut self, method: Method, path: &str, handler: impl Handler) -> &mut Self {
        self.register(path, method, handler.into_boxed_handler());
        self
    }

    fn register(&mut self, template: &str, method: Method, handler: BoxedHandler) {
        let steps = path::segments(template);
        let Some((last, prefix)) = steps.split_last() else {
            self.register_index(method, handler);
            return;
        };
        self.descend(prefix).register_leaf(last, method, handler);
    }

    /// Dispatch only consults the index of the root: below it a request
    /// with no segments left never arrives.
    fn register_index(&mut self, method: Method, handler: BoxedHandler) {
        if !self.root {
            warn!(%method, "index route on a sub-router is unreachable");
        }
        if self.index.insert(method.clone(), handler).is_some() {
            warn!(%method, "index route registered twice, keeping the later handler");
        }
    }

    /// Applies the leaf rule for the final template segment.
    fn register_leaf(&mut self, step: &str, method: Method, handler: BoxedHandler) {
        match path::param_name(step) {
            Some(name) => {
                self.bind_param(name);
                if self.param_leaves.insert(method.clone(), handler).is_some() {
                    warn!(segment = step, %method, "parameter route registered twice, keeping the later handler");
                }
            }
            None => {
                let previous = self
                    .leaves
                    .entry(step.to_owned())
                    .or_default()
                    .insert(method.clone(), handler);
                if previous.is_some() {
                    warn!(segment = step, %method, "route registered twice, keeping the later handler");
                }
            }
        }
    }

    /// Walks `steps` from this node, creating any missing child, and returns
    /// the node the walk ends on.
    fn descend(&mut self, steps: &[&str]) -> &mut Router {
        let mut node = self;
        for step in steps {
            node = match path::param_name(step) {
                Some(name) => {
                    node.bind_param(name);
                    &mut **node.param_child.get_or_insert_with(Box::default)
                }
                None => node.children.entry((*step).to_owned()).or_default(),
            };
        }
        node
    }

    /// Binds the parameter name for this depth. A bare `:` refers to the
    /// existing slot without naming it.
    fn bind_param(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        if let Some(previous) = self.param_name.as_deref() {
            if previous == name {
                return;
            }
            warn!(previous, param = name, "parameter name rebound at the same depth");
        }
        self.param_name = Some(name.to_owned());
    }
}
