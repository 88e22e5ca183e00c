//! # rally
//!
//! An embeddable HTTP router built around a segment tree.
//!
//! ## The contract
//!
//! A request path is split on `/` and walked one segment per tree level.
//! Each level can hold literal segments, one `:param` slot, handlers keyed
//! by method, and its own middleware list. That is the whole routing model:
//!
//! - **Literal beats parameter.** `/users/me` wins over `/users/:id` for
//!   `me`, and the walk never backtracks into the other branch.
//! - **Middleware is scoped by depth.** Root middleware runs first, then
//!   each node's list on the way down, then the handler.
//! - **Last registration wins.** Registering the same route twice replaces
//!   the first one and logs a warning; it never fails startup.
//! - **Every request ends in exactly one handler**: the match or the
//!   not-found fallback.
//!
//! Routing is synchronous and does no I/O. The bundled [`Server`] (hyper,
//! HTTP/1.1 and HTTP/2, graceful shutdown) is one way to feed it requests;
//! [`App::handle`] is the whole entry point for any other transport.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rally::{App, Context, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rally::Error> {
//!     let mut app = App::new();
//!     app.root()
//!         .get("/ping", |ctx: &mut Context| ctx.response.text("pong"))
//!         .post("/users", create_user);
//!
//!     let users = app.root().router("/users");
//!     users.middleware(|ctx: &mut Context| ctx.set("scope", "users"));
//!     users.get("/:id", |ctx: &mut Context| {
//!         let body = format!(r#"{{"id":"{}"}}"#, ctx.param("id"));
//!         ctx.response.bytes(rally::ContentType::Json, body);
//!     });
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! fn create_user(ctx: &mut Context) {
//!     if ctx.request.body().is_empty() {
//!         ctx.response.set_status(rally::StatusCode::BAD_REQUEST);
//!         return;
//!     }
//!     ctx.response.set_status(rally::StatusCode::CREATED);
//! }
//! ```

mod app;
mod bind;
mod config;
mod context;
mod dispatch;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod session;

pub mod path;

pub use app::{App, NOT_FOUND_BODY};
pub use bind::{BindForm, FormData, FormField};
pub use config::Config;
pub use context::Context;
pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{ContentType, Cookie, Response};
pub use router::{ANY_METHODS, Router};
pub use server::Server;
pub use session::{MemoryStore, Session, SessionStore, SessionValues};

pub use http::{HeaderValue, Method, StatusCode, header};
