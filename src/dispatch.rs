//! Request dispatch: one recursive descent through the route tree.
//!
//! At every node the dispatcher runs that node's middleware, then makes one
//! decision based on how many segments remain:
//!
//! | Remaining | Lookup |
//! |---|---|
//! | none | index handler for the method |
//! | one | leaf `(segment, method)`, else the parameter leaf |
//! | more | literal child, else the parameter child |
//!
//! A literal always beats the parameter slot, and once a branch is taken the
//! other one is never retried. Whatever fails to match ends in exactly one
//! call to the not-found handler, at the depth where the search stopped.

use http::Method;
use tracing::debug;

use crate::context::Context;
use crate::handler::ErasedHandler;
use crate::router::Router;

impl Router {
    pub(crate) fn dispatch(
        &self,
        method: &Method,
        steps: &[&str],
        ctx: &mut Context,
        not_found: &dyn ErasedHandler,
    ) {
        for middleware in &self.middleware {
            middleware.call(ctx);
        }

        let Some((step, rest)) = steps.split_first() else {
            match self.index.get(method) {
                Some(handler) => handler.call(ctx),
                None => miss(method, steps, ctx, not_found),
            }
            return;
        };

        // Bound before the literal lookup, so a literal match can still see
        // this depth's parameter.
        if let Some(name) = &self.param_name {
            ctx.bind_param(name, step);
        }
        let has_param = self.param_name.is_some();

        if rest.is_empty() {
            let handler = self
                .leaves
                .get(*step)
                .and_then(|methods| methods.get(method))
                .or_else(|| has_param.then(|| self.param_leaves.get(method)).flatten());
            match handler {
                Some(handler) => handler.call(ctx),
                None => miss(method, steps, ctx, not_found),
            }
        } else {
            let child = self
                .children
                .get(*step)
                .or_else(|| has_param.then(|| self.param_child.as_deref()).flatten());
            match child {
                Some(child) => child.dispatch(method, rest, ctx, not_found),
                None => miss(method, steps, ctx, not_found),
            }
        }
    }
}

fn miss(method: &Method, steps: &[&str], ctx: &mut Context, not_found: &dyn ErasedHandler) {
    debug!(%method, remaining = ?steps, "no route matched");
    not_found.call(ctx);
}
