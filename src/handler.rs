//! Handler trait and type erasure.
//!
//! Route handlers, middleware, tail middleware and the not-found fallback
//! are all the same thing: a synchronous function over the request
//! [`Context`]. The router stores them side by side in one tree, so they are
//! erased behind a single trait object.
//!
//! ```text
//! fn show(ctx: &mut Context) { … }           ← user writes this
//!        ↓ router.get("/:id", show)
//! show.into_boxed_handler()                  ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                  ← stored as BoxedHandler
//!        ↓
//! handler.call(&mut ctx)  at request time    ← one virtual call
//! ```
//!
//! `Arc` rather than `Box` because [`Router::any`](crate::Router::any)
//! files the same handler under every method.

use std::sync::Arc;

use crate::context::Context;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of the public
/// [`Handler::into_boxed_handler`].
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: &mut Context);
}

/// A type-erased handler shared between tree slots and across threads.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid handler or middleware.
///
/// Satisfied automatically by any function or closure with the signature
/// `Fn(&mut Context)`. Sealed: only the blanket impl can implement it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F> private::Sealed for F where F: Fn(&mut Context) + Send + Sync + 'static {}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F> ErasedHandler for FnHandler<F>
where
    F: Fn(&mut Context) + Send + Sync,
{
    fn call(&self, ctx: &mut Context) {
        (self.0)(ctx);
    }
}

/// Called after dispatch when a handler recorded a failure with
/// [`Context::fail`].
pub(crate) type ErrorHandler = Arc<dyn Fn(crate::Error, &mut Context) + Send + Sync + 'static>;
